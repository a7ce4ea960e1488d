use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::errors::AuthzError;
use super::principal::Actor;

/// Kind of resource a generic request id can denote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Picture,
    Space,
    Membership,
}

/// The resolved target of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ResourceReference {
    /// No resource named: unscoped endpoint such as the public gallery listing
    None,
    Picture(i64),
    Space(i64),
    Membership(i64),
}

impl ResourceReference {
    pub fn of(kind: ResourceKind, id: i64) -> Self {
        match kind {
            ResourceKind::Picture => ResourceReference::Picture(id),
            ResourceKind::Space => ResourceReference::Space(id),
            ResourceKind::Membership => ResourceReference::Membership(id),
        }
    }
}

impl fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceReference::None => write!(f, "none"),
            ResourceReference::Picture(id) => write!(f, "picture/{id}"),
            ResourceReference::Space(id) => write!(f, "space/{id}"),
            ResourceReference::Membership(id) => write!(f, "membership/{id}"),
        }
    }
}

/// Raw permission-check request as handed over by the request-parsing layer.
///
/// `id` is the generic identifier whose meaning depends on the route it arrived on;
/// the remaining ids are explicit and unambiguous.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ResolutionRequest {
    #[serde(default)]
    pub actor_user_id: Option<i64>,
    #[serde(default)]
    pub actor_is_admin: bool,
    #[serde(default)]
    pub id: Option<i64>,
    /// Request path the generic id arrived on, e.g. `/api/picture/edit`
    #[serde(default)]
    #[schema(example = "/api/picture/edit")]
    pub route: Option<String>,
    /// Pre-classified route, takes precedence over `route`
    #[serde(default)]
    pub route_kind: Option<ResourceKind>,
    #[serde(default)]
    pub picture_id: Option<i64>,
    #[serde(default)]
    pub space_id: Option<i64>,
    #[serde(default)]
    pub space_user_id: Option<i64>,
}

impl ResolutionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actor_user_id = Some(actor.user_id);
        self.actor_is_admin = actor.is_admin;
        self
    }

    pub fn with_id(mut self, id: i64, route: impl Into<String>) -> Self {
        self.id = Some(id);
        self.route = Some(route.into());
        self
    }

    pub fn with_picture(mut self, picture_id: i64) -> Self {
        self.picture_id = Some(picture_id);
        self
    }

    pub fn with_space(mut self, space_id: i64) -> Self {
        self.space_id = Some(space_id);
        self
    }

    pub fn with_space_user(mut self, space_user_id: i64) -> Self {
        self.space_user_id = Some(space_user_id);
        self
    }

    /// The authenticated caller, if any
    pub fn actor(&self) -> Option<Actor> {
        self.actor_user_id
            .map(|user_id| Actor::new(user_id).with_admin(self.actor_is_admin))
    }
}

/// Route module -> resource kind, fixed when routes are registered.
#[derive(Debug, Clone)]
pub struct RouteTable {
    base_path: String,
    modules: HashMap<String, ResourceKind>,
}

impl RouteTable {
    pub fn new(base_path: impl Into<String>) -> Self {
        let base_path = base_path.into().trim_end_matches('/').to_string();
        Self {
            base_path,
            modules: HashMap::new(),
        }
    }

    pub fn register(mut self, module: impl Into<String>, kind: ResourceKind) -> Self {
        self.modules.insert(module.into(), kind);
        self
    }

    /// Classify a request path by its first segment below the base path.
    pub fn classify(&self, path: &str) -> Option<ResourceKind> {
        let rest = path.strip_prefix(self.base_path.as_str())?;
        if !self.base_path.is_empty() && !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }
        let module = rest.trim_start_matches('/').split(['/', '?']).next()?;
        self.modules.get(module).copied()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        RouteTable::new("/api")
            .register("picture", ResourceKind::Picture)
            .register("space", ResourceKind::Space)
            .register("spaceUser", ResourceKind::Membership)
    }
}

/// Turns a `ResolutionRequest` into a typed `ResourceReference`.
#[derive(Debug, Clone, Default)]
pub struct ContextResolver {
    routes: RouteTable,
}

impl ContextResolver {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    pub fn resolve(&self, request: &ResolutionRequest) -> Result<ResourceReference, AuthzError> {
        if let Some(id) = request.id {
            let kind = match request.route_kind {
                Some(kind) => kind,
                None => {
                    let route = request.route.as_deref().ok_or_else(|| {
                        AuthzError::UnrecognizedRoute(format!("id {id} arrived without a route"))
                    })?;
                    self.routes
                        .classify(route)
                        .ok_or_else(|| AuthzError::UnrecognizedRoute(route.to_string()))?
                }
            };
            return Ok(ResourceReference::of(kind, id));
        }

        let reference = if let Some(id) = request.space_user_id {
            ResourceReference::Membership(id)
        } else if let Some(id) = request.space_id {
            ResourceReference::Space(id)
        } else if let Some(id) = request.picture_id {
            ResourceReference::Picture(id)
        } else {
            ResourceReference::None
        };

        Ok(reference)
    }
}
