// ============================
// crates/backend-lib/src/handlers/session.rs
// ============================
//! Sign-in, session, registration and health handlers.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use carelink_common::{
    HealthResponse, RegisterRequest, RegisterResponse, Role, SessionRecord, SessionStatus, SignInRequest,
    SignInResponse,
};
use serde::Deserialize;

use crate::auth::gate::bearer_token;
use crate::error::AppError;
use crate::AppState;

/// `?token=` query parameter
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

impl TokenQuery {
    fn require(self) -> Result<String, AppError> {
        self.token
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| AppError::InvalidInput("token is required".to_string()))
    }
}

// Body rejections go through the common error shape instead of axum's plain text.
fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::InvalidInput(rejection.body_text()))
}

/// `POST /session`
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SignInRequest>, JsonRejection>,
) -> Result<Json<SignInResponse>, AppError> {
    let request = json_body(body)?;
    Ok(Json(state.auth.sign_in(request).await?))
}

/// `GET /session?token=`
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<SessionStatus>, AppError> {
    let token = query.require()?;
    let session = state
        .auth
        .resolve_session(&token)
        .await
        .ok_or(AppError::Unauthenticated)?;
    Ok(Json(SessionStatus { valid: true, session: Some(session) }))
}

/// `DELETE /session?token=`
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TokenQuery>,
) -> Result<StatusCode, AppError> {
    let token = query.require()?;
    state.auth.sign_out(&token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /register`
pub async fn register(
    State(state): State<Arc<AppState>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let request = json_body(body)?;
    let response = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// `GET /whoami/{role}` with a bearer token
pub async fn whoami(
    State(state): State<Arc<AppState>>,
    Path(role): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SessionRecord>, AppError> {
    let role: Role = role
        .parse()
        .map_err(|e: carelink_common::UnknownRole| AppError::InvalidInput(e.to_string()))?;
    let session = state.auth.authorize(bearer_token(&headers), role).await?;
    Ok(Json(session))
}

/// `GET /health`
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        backend: state.backend.as_str().to_string(),
        reason: state.backend_reason.to_string(),
    })
}
