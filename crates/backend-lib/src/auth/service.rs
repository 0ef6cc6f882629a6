// ============================
// carelink-backend-lib/src/auth/service.rs
// ============================
use async_trait::async_trait;
use carelink_common::{RegisterRequest, RegisterResponse, Role, SessionRecord, SignInRequest, SignInResponse};

use super::backend::BackendKind;
use crate::error::AppError;

/// Authentication operations exposed to the HTTP layer
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Run the full sign-in decision and issue a session on success
    async fn sign_in(&self, request: SignInRequest) -> Result<SignInResponse, AppError>;
    /// The live session for `token`, if any
    async fn resolve_session(&self, token: &str) -> Option<SessionRecord>;
    /// Resolve `token` and require `role`. Any failure is `Unauthenticated`.
    async fn authorize(&self, token: Option<&str>, role: Role) -> Result<SessionRecord, AppError>;
    async fn sign_out(&self, token: &str) -> Result<(), AppError>;
    async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AppError>;
    fn backend_kind(&self) -> BackendKind;
}
