use std::sync::Arc;

use serde::Serialize;

use super::context::ResourceReference;
use super::errors::AuthzError;
use super::permissions;
use super::principal::Actor;
use super::profile::RoleProfileTable;
use crate::models::space::{Space, SpaceType};
use crate::store::AuthzStore;

/// Ordered, duplicate-free list of permission keys.
///
/// An empty set means "authenticated but not authorized", never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionSet(Vec<String>);

impl PermissionSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_keys<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let mut set = Vec::new();
        for key in keys {
            let key = key.into();
            if !set.contains(&key) {
                set.push(key);
            }
        }
        Self(set)
    }

    pub fn contains(&self, permission: &str) -> bool {
        self.0.iter().any(|key| key == permission)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Outcome of a resolution before it is rendered for the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Grant {
    /// No resource was named; the check is a pass-through
    Unrestricted,
    Scoped(PermissionSet),
}

impl Grant {
    pub fn allows(&self, permission: &str) -> bool {
        match self {
            Grant::Unrestricted => true,
            Grant::Scoped(set) => set.contains(permission),
        }
    }

    /// `Unrestricted` renders as the full permission universe.
    pub fn into_permissions(self, profiles: &RoleProfileTable) -> PermissionSet {
        match self {
            Grant::Unrestricted => PermissionSet::from_keys(profiles.universe().iter().cloned()),
            Grant::Scoped(set) => set,
        }
    }
}

/// Decides which permissions an actor holds on a resource.
///
/// Resolution order:
/// 1. no resource -> unrestricted
/// 2. no actor -> `NotAuthenticated`
/// 3. membership record -> its role, only for the member themself
/// 4. space -> private: owner/admin get everything; team: membership role
/// 5. picture -> public gallery: owner/admin get everything, others view only;
///    otherwise the owning space decides
pub struct PermissionResolver<S> {
    profiles: Arc<RoleProfileTable>,
    store: S,
}

impl<S: AuthzStore> PermissionResolver<S> {
    pub fn new(profiles: Arc<RoleProfileTable>, store: S) -> Self {
        Self { profiles, store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn resolve(
        &self,
        actor: Option<&Actor>,
        reference: ResourceReference,
    ) -> Result<PermissionSet, AuthzError> {
        let grant = self.resolve_grant(actor, reference).await?;
        Ok(grant.into_permissions(&self.profiles))
    }

    pub async fn resolve_grant(
        &self,
        actor: Option<&Actor>,
        reference: ResourceReference,
    ) -> Result<Grant, AuthzError> {
        let actor = match (reference, actor) {
            (ResourceReference::None, _) => {
                tracing::debug!("no resource named, unrestricted");
                return Ok(Grant::Unrestricted);
            }
            (_, None) => {
                tracing::debug!(reference = %reference, "unauthenticated check rejected");
                return Err(AuthzError::not_authenticated(format!(
                    "login required to access {reference}"
                )));
            }
            (_, Some(actor)) => actor,
        };

        let permissions = match reference {
            ResourceReference::Membership(id) => self.membership_permissions(actor, id).await?,
            ResourceReference::Space(id) => self.space_permissions(actor, id).await?,
            ResourceReference::Picture(id) => self.picture_permissions(actor, id).await?,
            ResourceReference::None => return Ok(Grant::Unrestricted),
        };

        tracing::debug!(
            user_id = actor.user_id,
            is_admin = actor.is_admin,
            reference = %reference,
            granted = ?permissions.as_slice(),
            "resolved permissions"
        );

        Ok(Grant::Scoped(permissions))
    }

    /// Permissions to display for a space detail page, or the public gallery when
    /// `space_id` is `None`. Unlike `resolve`, a missing actor yields an empty set
    /// and only admins hold rights on the public gallery.
    pub async fn space_view_permissions(
        &self,
        actor: Option<&Actor>,
        space_id: Option<i64>,
    ) -> Result<PermissionSet, AuthzError> {
        let Some(actor) = actor else {
            return Ok(PermissionSet::empty());
        };

        match space_id {
            None if actor.is_admin => Ok(self.universe()),
            None => Ok(PermissionSet::empty()),
            Some(space_id) => self.space_permissions(actor, space_id).await,
        }
    }

    async fn membership_permissions(
        &self,
        actor: &Actor,
        membership_id: i64,
    ) -> Result<PermissionSet, AuthzError> {
        let membership = self
            .store
            .membership_by_id(membership_id)
            .await?
            .ok_or_else(|| AuthzError::not_found(format!("space member {membership_id}")))?;

        if membership.user_id != actor.user_id {
            return Ok(PermissionSet::empty());
        }

        Ok(self.role_permissions(&membership.space_role))
    }

    async fn space_permissions(&self, actor: &Actor, space_id: i64) -> Result<PermissionSet, AuthzError> {
        let space = self
            .store
            .space_by_id(space_id)
            .await?
            .ok_or_else(|| AuthzError::not_found(format!("space {space_id}")))?;

        self.space_rule(actor, &space).await
    }

    async fn picture_permissions(&self, actor: &Actor, picture_id: i64) -> Result<PermissionSet, AuthzError> {
        let scope = self
            .store
            .picture_scope(picture_id)
            .await?
            .ok_or_else(|| AuthzError::not_found(format!("picture {picture_id}")))?;

        match (scope.picture.space_id, scope.space) {
            (None, _) if actor.owns_or_admin(scope.picture.user_id) => Ok(self.universe()),
            (None, _) => Ok(PermissionSet::from_keys([permissions::PICTURE_VIEW])),
            (Some(_), Some(space)) => self.space_rule(actor, &space).await,
            (Some(space_id), None) => Err(AuthzError::not_found(format!(
                "space {space_id} of picture {picture_id}"
            ))),
        }
    }

    async fn space_rule(&self, actor: &Actor, space: &Space) -> Result<PermissionSet, AuthzError> {
        match space.space_type {
            SpaceType::Private if actor.owns_or_admin(space.user_id) => Ok(self.universe()),
            SpaceType::Private => Ok(PermissionSet::empty()),
            SpaceType::Team => {
                let membership = self
                    .store
                    .membership_by_space_and_user(space.id, actor.user_id)
                    .await?;
                Ok(membership
                    .map(|m| self.role_permissions(&m.space_role))
                    .unwrap_or_default())
            }
        }
    }

    fn role_permissions(&self, role_key: &str) -> PermissionSet {
        let permissions = self.profiles.permissions_for_role(role_key);
        if permissions.is_empty() && self.profiles.role(role_key).is_none() {
            tracing::warn!(role = %role_key, "unknown space role, granting nothing");
        }
        PermissionSet::from_keys(permissions.iter().cloned())
    }

    fn universe(&self) -> PermissionSet {
        PermissionSet::from_keys(self.profiles.universe().iter().cloned())
    }
}
