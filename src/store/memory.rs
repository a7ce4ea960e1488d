use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use super::AuthzStore;
use crate::authz::AuthzError;
use crate::models::{membership::Membership, picture::Picture, picture::PictureScope, space::Space};

/// Snapshot-backed store for tests and embedders that load data up front.
///
/// Counts every lookup and can simulate an outage.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    spaces: HashMap<i64, Space>,
    pictures: HashMap<i64, Picture>,
    memberships: HashMap<i64, Membership>,
    lookups: AtomicUsize,
    unavailable: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_space(mut self, space: Space) -> Self {
        self.spaces.insert(space.id, space);
        self
    }

    pub fn with_picture(mut self, picture: Picture) -> Self {
        self.pictures.insert(picture.id, picture);
        self
    }

    /// Replaces any existing membership for the same (space, user) pair.
    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.memberships
            .retain(|_, m| !(m.space_id == membership.space_id && m.user_id == membership.user_id));
        self.memberships.insert(membership.id, membership);
        self
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn begin_lookup(&self) -> Result<(), AuthzError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AuthzError::Store(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthzStore for InMemoryStore {
    async fn space_by_id(&self, space_id: i64) -> Result<Option<Space>, AuthzError> {
        self.begin_lookup()?;
        Ok(self.spaces.get(&space_id).cloned())
    }

    async fn picture_scope(&self, picture_id: i64) -> Result<Option<PictureScope>, AuthzError> {
        self.begin_lookup()?;
        Ok(self.pictures.get(&picture_id).map(|picture| PictureScope {
            picture: picture.clone(),
            space: picture.space_id.and_then(|id| self.spaces.get(&id).cloned()),
        }))
    }

    async fn membership_by_id(&self, membership_id: i64) -> Result<Option<Membership>, AuthzError> {
        self.begin_lookup()?;
        Ok(self.memberships.get(&membership_id).cloned())
    }

    async fn membership_by_space_and_user(
        &self,
        space_id: i64,
        user_id: i64,
    ) -> Result<Option<Membership>, AuthzError> {
        self.begin_lookup()?;
        Ok(self
            .memberships
            .values()
            .find(|m| m.space_id == space_id && m.user_id == user_id)
            .cloned())
    }
}
