use thiserror::Error;

/// Failures produced while loading role profiles or resolving permissions.
///
/// Only `NotAuthenticated` and `NotFound` are decisions of the resolver itself.
/// `Store` and `CorruptRecord` come from the lookups and are never turned into
/// an empty permission set.
#[derive(Debug, Error)]
pub enum AuthzError {
    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: missing permission `{0}`")]
    Forbidden(String),

    #[error("unrecognized route: {0}")]
    UnrecognizedRoute(String),

    #[error("invalid role profile: {0}")]
    InvalidProfile(String),

    #[error("failed to read role profile `{path}`")]
    ProfileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    #[error("store unavailable")]
    Store(#[from] sqlx::Error),
}

impl AuthzError {
    pub fn not_authenticated(message: impl Into<String>) -> Self {
        Self::NotAuthenticated(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_profile(message: impl Into<String>) -> Self {
        Self::InvalidProfile(message.into())
    }

    /// Stable machine-readable kind used in error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthzError::NotAuthenticated(_) => "not_authenticated",
            AuthzError::NotFound(_) => "not_found",
            AuthzError::Forbidden(_) => "forbidden",
            AuthzError::UnrecognizedRoute(_) => "unrecognized_route",
            AuthzError::InvalidProfile(_) | AuthzError::ProfileIo { .. } => "invalid_profile",
            AuthzError::CorruptRecord(_) => "corrupt_record",
            AuthzError::Store(_) => "store",
        }
    }
}
