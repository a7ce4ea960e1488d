use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One user's role within a team space (`space_user` row)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Membership {
    pub id: i64,
    pub space_id: i64,
    pub user_id: i64,
    /// Role key, e.g. `viewer`, `editor`, `admin`
    pub space_role: String,
}

impl Membership {
    pub fn new(id: i64, space_id: i64, user_id: i64, space_role: impl Into<String>) -> Self {
        Self {
            id,
            space_id,
            user_id,
            space_role: space_role.into(),
        }
    }
}
