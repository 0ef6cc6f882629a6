// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use carelink_common::Role;
use thiserror::Error;

/// Application error types with error codes and context.
///
/// No variant ever carries a password or a password hash.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidSecret,

    #[error("Role mismatch: requested {requested}, account is {stored}")]
    RoleMismatch { requested: Role, stored: Role },

    #[error("Account deactivated")]
    AccountDeactivated,

    /// Missing, unknown, expired or under-privileged session
    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Credential backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Token store is malformed: {0}")]
    MalformedStore(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account already registered")]
    AlreadyRegistered,

    #[error("Authentication rate limit exceeded")]
    AuthRateLimited,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UserNotFound | AppError::InvalidSecret | AppError::Unauthenticated => {
                StatusCode::UNAUTHORIZED
            },
            AppError::RoleMismatch { .. } | AppError::AccountDeactivated => StatusCode::FORBIDDEN,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::AlreadyRegistered => StatusCode::CONFLICT,
            AppError::AuthRateLimited => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the stable machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::InvalidSecret => "INVALID_PASSWORD",
            AppError::RoleMismatch { .. } => "ROLE_MISMATCH",
            AppError::AccountDeactivated => "ACCOUNT_DEACTIVATED",
            AppError::Unauthenticated => "UNAUTHENTICATED",
            AppError::BackendUnavailable(_) => "BACKEND_UNAVAILABLE",
            AppError::MalformedStore(_) => "MALFORMED_STORE",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::AlreadyRegistered => "ALREADY_REGISTERED",
            AppError::AuthRateLimited => "AUTH_RATE_LIMITED",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "JSON_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get a sanitized message suitable for production use
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::UserNotFound | AppError::InvalidSecret => "Invalid credentials".to_string(),
            AppError::RoleMismatch { .. } => "Account role does not match the requested role".to_string(),
            AppError::AccountDeactivated => "Account is deactivated".to_string(),
            AppError::Unauthenticated => "Not authenticated".to_string(),
            AppError::InvalidInput(msg) => format!("Invalid input: {msg}"),
            AppError::AlreadyRegistered => "Account already registered".to_string(),
            AppError::AuthRateLimited => {
                "Too many authentication attempts, please try again later".to_string()
            },
            AppError::BackendUnavailable(_)
            | AppError::MalformedStore(_)
            | AppError::Io(_)
            | AppError::Json(_)
            | AppError::Internal(_) => "An internal server error occurred".to_string(),
        }
    }

    /// Structured detail attached to the response body, if any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            AppError::RoleMismatch { requested, stored } => Some(serde_json::json!({
                "requestedRole": requested,
                "storedRole": stored,
            })),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }

        let mut error = serde_json::json!({
            "code": self.error_code(),
            "message": self.sanitized_message(),
        });
        if let Some(details) = self.details() {
            error["details"] = details;
        }

        (status, axum::Json(serde_json::json!({ "error": error }))).into_response()
    }
}
