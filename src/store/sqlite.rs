use async_trait::async_trait;
use sqlx::SqlitePool;

use super::AuthzStore;
use crate::authz::AuthzError;
use crate::models::membership::Membership;
use crate::models::picture::{DbPictureScope, PictureScope};
use crate::models::space::{DbSpace, Space};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthzStore for SqliteStore {
    async fn space_by_id(&self, space_id: i64) -> Result<Option<Space>, AuthzError> {
        let row = sqlx::query_as::<_, DbSpace>(
            "SELECT id, user_id, space_type FROM space WHERE id = ? AND is_delete = 0",
        )
        .bind(space_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Space::try_from).transpose()
    }

    async fn picture_scope(&self, picture_id: i64) -> Result<Option<PictureScope>, AuthzError> {
        let row = sqlx::query_as::<_, DbPictureScope>(
            r#"
            SELECT p.id, p.user_id, p.space_id, s.user_id AS space_owner_id, s.space_type
            FROM picture p
            LEFT JOIN space s ON s.id = p.space_id AND s.is_delete = 0
            WHERE p.id = ? AND p.is_delete = 0
            "#,
        )
        .bind(picture_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(PictureScope::try_from).transpose()
    }

    async fn membership_by_id(&self, membership_id: i64) -> Result<Option<Membership>, AuthzError> {
        let row = sqlx::query_as::<_, Membership>(
            "SELECT id, space_id, user_id, space_role FROM space_user WHERE id = ?",
        )
        .bind(membership_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn membership_by_space_and_user(
        &self,
        space_id: i64,
        user_id: i64,
    ) -> Result<Option<Membership>, AuthzError> {
        let row = sqlx::query_as::<_, Membership>(
            "SELECT id, space_id, user_id, space_role FROM space_user WHERE space_id = ? AND user_id = ?",
        )
        .bind(space_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }
}
