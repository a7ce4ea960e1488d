//! Point lookups the permission engine consults.
//!
//! The engine never writes; each resolution performs at most two of these
//! lookups. A failing lookup is reported as `AuthzError::Store` so callers
//! fail closed.

mod memory;
mod sqlite;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::authz::AuthzError;
use crate::models::{membership::Membership, picture::PictureScope, space::Space};

#[async_trait]
pub trait AuthzStore: Send + Sync {
    async fn space_by_id(&self, space_id: i64) -> Result<Option<Space>, AuthzError>;

    /// Picture plus its owning space in a single lookup.
    async fn picture_scope(&self, picture_id: i64) -> Result<Option<PictureScope>, AuthzError>;

    async fn membership_by_id(&self, membership_id: i64) -> Result<Option<Membership>, AuthzError>;

    /// At most one row exists per (space, user) pair.
    async fn membership_by_space_and_user(
        &self,
        space_id: i64,
        user_id: i64,
    ) -> Result<Option<Membership>, AuthzError>;
}
