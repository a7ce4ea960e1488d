use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::authz::AuthzError;

/// Ownership model of a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpaceType {
    /// Single owner, never delegated
    Private,
    /// Owner plus members holding roles
    Team,
}

impl SpaceType {
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            0 => Some(SpaceType::Private),
            1 => Some(SpaceType::Team),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub id: i64,
    /// Owner of the space
    pub user_id: i64,
    pub space_type: SpaceType,
}

impl Space {
    pub fn private(id: i64, user_id: i64) -> Self {
        Self { id, user_id, space_type: SpaceType::Private }
    }

    pub fn team(id: i64, user_id: i64) -> Self {
        Self { id, user_id, space_type: SpaceType::Team }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DbSpace {
    pub id: i64,
    pub user_id: i64,
    pub space_type: i64,
}

impl TryFrom<DbSpace> for Space {
    type Error = AuthzError;

    fn try_from(value: DbSpace) -> Result<Self, Self::Error> {
        let space_type = SpaceType::from_value(value.space_type).ok_or_else(|| {
            AuthzError::CorruptRecord(format!(
                "space {} has unknown space_type {}",
                value.id, value.space_type
            ))
        })?;

        Ok(Space {
            id: value.id,
            user_id: value.user_id,
            space_type,
        })
    }
}
