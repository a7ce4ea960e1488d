use std::path::PathBuf;
use std::sync::Arc;

use crate::authz::{AuthzMode, RoleProfileTable};
use crate::errors::AppError;

const DEFAULT_PORT: u16 = 8000;

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    /// Role document; the built-in one is used when unset
    pub role_profile_path: Option<PathBuf>,
    pub authz_mode: AuthzMode,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; `from_env` passes the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or_else(|| AppError::configuration("DATABASE_URL not set"))?;

        let port = match lookup("APP_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| AppError::configuration("APP_PORT must be a valid port number"))?,
            None => DEFAULT_PORT,
        };

        let role_profile_path = lookup("ROLE_PROFILE_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let authz_mode = lookup("AUTHZ_MODE")
            .unwrap_or_default()
            .parse::<AuthzMode>()
            .map_err(AppError::configuration)?;

        Ok(Self {
            database_url,
            port,
            role_profile_path,
            authz_mode,
        })
    }

    /// Loads the role document; failure here must stop the process.
    pub fn load_profiles(&self) -> Result<Arc<RoleProfileTable>, AppError> {
        let table = match &self.role_profile_path {
            Some(path) => RoleProfileTable::from_path(path)?,
            None => RoleProfileTable::builtin()?,
        };
        Ok(Arc::new(table))
    }
}
