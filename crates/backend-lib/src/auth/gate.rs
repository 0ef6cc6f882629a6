// ============================
// carelink-backend-lib/src/auth/gate.rs
// ============================
//! Role-based authorization of already validated sessions.
use axum::http::{header::AUTHORIZATION, HeaderMap};
use carelink_common::{Role, SessionRecord};

use crate::error::AppError;

const BEARER_PREFIX: &str = "Bearer ";

/// Allow the session if it exists and holds `required`.
///
/// A wrong role is reported exactly like a missing session, so callers
/// cannot probe which roles a token holds.
pub fn authorize(session: Option<SessionRecord>, required: Role) -> Result<SessionRecord, AppError> {
    match session {
        Some(session) if session.role == required => Ok(session),
        _ => Err(AppError::Unauthenticated),
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
