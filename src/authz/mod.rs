//! Authorization module - space-scoped permission engine
//!
//! This module decides which permission keys an actor holds on a picture,
//! a space or a space membership record:
//! - Role profiles loaded once from a declarative JSON document
//! - Route-table driven resolution of the request context
//! - Private / team / public-gallery dispatch in the resolver
//! - Configurable enforcement modes (off/advisory/strict) for the gate

mod context;
mod errors;
mod evaluator;
mod principal;
mod profile;
mod resolver;

pub use context::{ContextResolver, ResolutionRequest, ResourceKind, ResourceReference, RouteTable};
pub use errors::AuthzError;
pub use evaluator::PermissionGate;
pub use principal::Actor;
pub use profile::{PermissionDef, RoleDef, RoleProfileTable};
pub use resolver::{Grant, PermissionResolver, PermissionSet};

use std::str::FromStr;

/// Authorization enforcement mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthzMode {
    /// No permission checks (development mode)
    Off,
    /// Log denials but allow requests (testing mode)
    Advisory,
    /// Reject denied requests (production mode)
    #[default]
    Strict,
}

impl AuthzMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthzMode::Off => "off",
            AuthzMode::Advisory => "advisory",
            AuthzMode::Strict => "strict",
        }
    }
}

impl FromStr for AuthzMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "off" => Ok(AuthzMode::Off),
            "advisory" => Ok(AuthzMode::Advisory),
            "strict" | "" => Ok(AuthzMode::Strict),
            other => Err(format!("unknown authorization mode `{other}`")),
        }
    }
}

/// Well-known role keys
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const EDITOR: &str = "editor";
    pub const VIEWER: &str = "viewer";
}

/// Well-known permission keys
pub mod permissions {
    // Team members
    pub const SPACE_USER_MANAGE: &str = "spaceUser:manage";

    // Picture
    pub const PICTURE_VIEW: &str = "picture:view";
    pub const PICTURE_UPLOAD: &str = "picture:upload";
    pub const PICTURE_EDIT: &str = "picture:edit";
    pub const PICTURE_DELETE: &str = "picture:delete";
}
