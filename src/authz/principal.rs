use serde::{Deserialize, Serialize};

/// Actor represents the authenticated caller of a permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    /// Platform administrator, independent of any space role
    pub is_admin: bool,
}

impl Actor {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    pub fn admin(user_id: i64) -> Self {
        Self::new(user_id).with_admin(true)
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Owner of the resource, or a platform admin
    pub fn owns_or_admin(&self, owner_user_id: i64) -> bool {
        self.is_admin || self.user_id == owner_user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_and_admin_checks() {
        assert!(Actor::new(7).owns_or_admin(7));
        assert!(!Actor::new(7).owns_or_admin(8));
        assert!(Actor::admin(1).owns_or_admin(8));
    }
}
