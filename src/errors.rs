use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::authz::AuthzError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Authz(#[from] AuthzError),
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AppError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Tag shared with the CLI's failure output.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Authz(err) => err.kind(),
            AppError::Configuration(_) => "configuration",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Authz(err) => match err {
                AuthzError::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
                AuthzError::Forbidden(_) => StatusCode::FORBIDDEN,
                AuthzError::NotFound(_) => StatusCode::NOT_FOUND,
                AuthzError::UnrecognizedRoute(_) => StatusCode::BAD_REQUEST,
                AuthzError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
                AuthzError::InvalidProfile(_) | AuthzError::ProfileIo { .. } | AuthzError::CorruptRecord(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    kind: String,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match &self {
            AppError::Authz(AuthzError::Store(err)) => {
                tracing::error!(error = %err, "store lookup failed");
            }
            AppError::Authz(AuthzError::CorruptRecord(detail)) => {
                tracing::error!(detail = %detail, "corrupt authorization record");
            }
            _ => {}
        }

        let payload = ErrorResponse {
            kind: self.kind().to_string(),
            detail: self.to_string(),
        };

        (status, Json(payload)).into_response()
    }
}
