use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::authz::AuthzError;
use crate::models::space::{DbSpace, Space};

/// The slice of a picture row the permission engine needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Picture {
    pub id: i64,
    /// Uploader of the picture
    pub user_id: i64,
    /// Owning space; `None` means the public gallery
    pub space_id: Option<i64>,
}

impl Picture {
    pub fn public(id: i64, user_id: i64) -> Self {
        Self { id, user_id, space_id: None }
    }

    pub fn in_space(id: i64, user_id: i64, space_id: i64) -> Self {
        Self { id, user_id, space_id: Some(space_id) }
    }
}

/// A picture together with its owning space, fetched in one lookup.
///
/// `space` is `None` both for public-gallery pictures and for pictures whose
/// `space_id` points at a missing space; `Picture::space_id` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureScope {
    pub picture: Picture,
    pub space: Option<Space>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPictureScope {
    pub id: i64,
    pub user_id: i64,
    pub space_id: Option<i64>,
    pub space_owner_id: Option<i64>,
    pub space_type: Option<i64>,
}

impl TryFrom<DbPictureScope> for PictureScope {
    type Error = AuthzError;

    fn try_from(value: DbPictureScope) -> Result<Self, Self::Error> {
        let space = match (value.space_id, value.space_owner_id, value.space_type) {
            (Some(id), Some(user_id), Some(space_type)) => Some(Space::try_from(DbSpace {
                id,
                user_id,
                space_type,
            })?),
            _ => None,
        };

        Ok(PictureScope {
            picture: Picture {
                id: value.id,
                user_id: value.user_id,
                space_id: value.space_id,
            },
            space,
        })
    }
}
