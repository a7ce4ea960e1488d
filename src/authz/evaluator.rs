use std::sync::Arc;

use super::context::ResourceReference;
use super::errors::AuthzError;
use super::principal::Actor;
use super::resolver::PermissionResolver;
use super::AuthzMode;
use crate::store::AuthzStore;

/// Allow/deny gate in front of an operation that needs one permission.
///
/// `NotAuthenticated`, `NotFound` and store failures always propagate; the
/// mode only decides what happens to a plain denial.
pub struct PermissionGate<S> {
    resolver: Arc<PermissionResolver<S>>,
    mode: AuthzMode,
}

impl<S> Clone for PermissionGate<S> {
    fn clone(&self) -> Self {
        Self {
            resolver: Arc::clone(&self.resolver),
            mode: self.mode,
        }
    }
}

impl<S: AuthzStore> PermissionGate<S> {
    pub fn new(resolver: Arc<PermissionResolver<S>>, mode: AuthzMode) -> Self {
        Self { resolver, mode }
    }

    pub fn mode(&self) -> AuthzMode {
        self.mode
    }

    pub fn resolver(&self) -> &PermissionResolver<S> {
        &self.resolver
    }

    /// Ok(()) when the operation may proceed.
    pub async fn check(
        &self,
        actor: Option<&Actor>,
        reference: ResourceReference,
        permission: &str,
    ) -> Result<(), AuthzError> {
        if self.mode == AuthzMode::Off {
            return Ok(());
        }

        let grant = self.resolver.resolve_grant(actor, reference).await?;
        if grant.allows(permission) {
            return Ok(());
        }

        match self.mode {
            AuthzMode::Advisory => {
                tracing::warn!(
                    user_id = ?actor.map(|a| a.user_id),
                    reference = %reference,
                    permission = %permission,
                    "permission denied (advisory, allowing)"
                );
                Ok(())
            }
            _ => {
                tracing::debug!(
                    user_id = ?actor.map(|a| a.user_id),
                    reference = %reference,
                    permission = %permission,
                    "permission denied"
                );
                Err(AuthzError::Forbidden(permission.to_string()))
            }
        }
    }
}
