use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::auth::validation::ValidationError;

pub const INVALID_CREDENTIALS: &str = "Invalid username or password";
pub const INVALID_TOKEN: &str = "Invalid or missing token";
pub const INVALID_TOKEN_DETAILS: &str = "Token is missing, malformed or expired";
pub const SANITIZED_DETAILS: &str = "An unexpected error occurred";

/// Everything a handler can answer with besides success.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Unknown username and wrong password share this variant.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid or missing token")]
    InvalidToken,
    #[error("{0}")]
    NotFound(&'static str),
    /// A lost insert race; rendered exactly like the pre-check rejection.
    #[error("username already exists")]
    Conflict,
    #[error("{message}: {details}")]
    Internal {
        message: &'static str,
        details: String,
    },
}

impl AppError {
    /// Log the full error and build a 500 whose details are kept only when
    /// `expose_details` is set.
    pub fn internal(
        message: &'static str,
        err: impl std::fmt::Display,
        expose_details: bool,
    ) -> Self {
        error!(error = %err, "{message}");
        let details = if expose_details {
            err.to_string()
        } else {
            SANITIZED_DETAILS.to_string()
        };
        AppError::Internal { message, details }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Conflict => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Validation(e) => json!({ "error": e.to_string() }),
            AppError::Conflict => json!({ "error": ValidationError::UsernameTaken.to_string() }),
            AppError::InvalidCredentials => json!({ "error": INVALID_CREDENTIALS }),
            AppError::InvalidToken => {
                json!({ "error": INVALID_TOKEN, "details": INVALID_TOKEN_DETAILS })
            }
            AppError::NotFound(msg) => json!({ "error": msg }),
            AppError::Internal { message, details } => {
                json!({ "error": message, "details": details })
            }
        };
        (status, Json(body)).into_response()
    }
}
