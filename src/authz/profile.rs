use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::AuthzError;
use super::roles;

const BUILTIN_PROFILES: &str = include_str!("../../config/role_profiles.json");

/// Catalog entry describing one permission key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDef {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Named bundle of permission keys, in document order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDef {
    pub key: String,
    pub name: String,
    pub permissions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ProfileDocument {
    permissions: Vec<PermissionDef>,
    roles: Vec<RoleDef>,
}

/// Immutable role -> permission mapping, built once at startup and shared by `Arc`.
#[derive(Debug, Clone)]
pub struct RoleProfileTable {
    permissions: Vec<PermissionDef>,
    roles: Vec<RoleDef>,
    role_index: HashMap<String, usize>,
    catalog: HashSet<String>,
    admin: usize,
}

impl RoleProfileTable {
    /// The document shipped in `config/role_profiles.json`.
    pub fn builtin() -> Result<Self, AuthzError> {
        Self::from_json(BUILTIN_PROFILES)
    }

    pub fn from_path(path: &Path) -> Result<Self, AuthzError> {
        let contents = std::fs::read_to_string(path).map_err(|source| AuthzError::ProfileIo {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self, AuthzError> {
        let de = &mut serde_json::Deserializer::from_str(json);
        let document: ProfileDocument = serde_path_to_error::deserialize(de).map_err(|err| {
            AuthzError::invalid_profile(format!("{} (at `{}`)", err.inner(), err.path()))
        })?;

        let table = Self::compile(document)?;
        tracing::info!(
            permissions = table.permissions.len(),
            roles = table.roles.len(),
            "loaded role profiles"
        );
        Ok(table)
    }

    fn compile(document: ProfileDocument) -> Result<Self, AuthzError> {
        let mut catalog = HashSet::new();
        for permission in &document.permissions {
            if permission.key.trim().is_empty() {
                return Err(AuthzError::invalid_profile("permission with blank key"));
            }
            if !catalog.insert(permission.key.clone()) {
                return Err(AuthzError::invalid_profile(format!(
                    "duplicate permission `{}`",
                    permission.key
                )));
            }
        }

        let mut role_index = HashMap::new();
        for (idx, role) in document.roles.iter().enumerate() {
            if role.key.trim().is_empty() {
                return Err(AuthzError::invalid_profile("role with blank key"));
            }
            if role_index.insert(role.key.clone(), idx).is_some() {
                return Err(AuthzError::invalid_profile(format!("duplicate role `{}`", role.key)));
            }

            let mut seen = HashSet::new();
            for key in &role.permissions {
                if !catalog.contains(key) {
                    return Err(AuthzError::invalid_profile(format!(
                        "role `{}` references unknown permission `{}`",
                        role.key, key
                    )));
                }
                if !seen.insert(key.as_str()) {
                    return Err(AuthzError::invalid_profile(format!(
                        "role `{}` lists permission `{}` twice",
                        role.key, key
                    )));
                }
            }
        }

        let admin = *role_index
            .get(roles::ADMIN)
            .ok_or_else(|| AuthzError::invalid_profile(format!("missing `{}` role", roles::ADMIN)))?;

        // The admin role doubles as the permission universe.
        let admin_role = &document.roles[admin];
        if admin_role.permissions.len() != catalog.len() {
            let granted: HashSet<&str> = admin_role.permissions.iter().map(String::as_str).collect();
            let mut missing: Vec<&str> = catalog
                .iter()
                .map(String::as_str)
                .filter(|key| !granted.contains(key))
                .collect();
            missing.sort_unstable();
            return Err(AuthzError::invalid_profile(format!(
                "`{}` role must grant every permission, missing: {}",
                roles::ADMIN,
                missing.join(", ")
            )));
        }

        Ok(Self {
            permissions: document.permissions,
            roles: document.roles,
            role_index,
            catalog,
            admin,
        })
    }

    /// Permission keys of `role_key`, or an empty slice for unknown or blank keys.
    pub fn permissions_for_role(&self, role_key: &str) -> &[String] {
        self.role(role_key)
            .map(|role| role.permissions.as_slice())
            .unwrap_or(&[])
    }

    /// Every permission key, in the order the admin role lists them.
    pub fn universe(&self) -> &[String] {
        &self.roles[self.admin].permissions
    }

    pub fn role(&self, role_key: &str) -> Option<&RoleDef> {
        self.role_index.get(role_key).map(|&idx| &self.roles[idx])
    }

    pub fn roles(&self) -> &[RoleDef] {
        &self.roles
    }

    pub fn catalog(&self) -> &[PermissionDef] {
        &self.permissions
    }

    pub fn contains_permission(&self, key: &str) -> bool {
        self.catalog.contains(key)
    }
}
