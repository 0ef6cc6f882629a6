// ============================
// carelink-backend-lib/src/auth/service_impl.rs
// ============================
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use carelink_common::{RegisterRequest, RegisterResponse, Role, SessionRecord, SignInRequest, SignInResponse};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::backend::{normalize_identifier, BackendKind, CredentialBackend, CredentialRecord};
use super::decision::{self, AuthStage, DecisionPolicy};
use super::gate;
use super::password::{hash_password_secure, PasswordRequirements};
use super::rate_limit::AuthRateLimiter;
use super::{AuthService, SessionManager};
use crate::config::Settings;
use crate::error::AppError;
use crate::metrics as keys;
use crate::validation::{validate_registration, validate_sign_in};

/// Session lifetimes and credential policy
#[derive(Debug, Clone)]
pub struct AuthPolicy {
    pub single_role_ttl: Duration,
    pub multi_role_ttl: Duration,
    pub allow_passwordless: bool,
    pub password_hash_log_n: u8,
    pub password_requirements: PasswordRequirements,
}

impl AuthPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            single_role_ttl: settings.single_role_ttl(),
            multi_role_ttl: settings.multi_role_ttl(),
            allow_passwordless: settings.allow_passwordless,
            password_hash_log_n: settings.password_hash_log_n,
            password_requirements: settings.password_requirements.clone(),
        }
    }

    fn ttl(&self, multi_session: bool) -> Duration {
        if multi_session {
            self.multi_role_ttl
        } else {
            self.single_role_ttl
        }
    }
}

pub struct DefaultAuth {
    backend: Arc<CredentialBackend>,
    sessions: SessionManager,
    rate_limiter: AuthRateLimiter,
    policy: AuthPolicy,
}

impl DefaultAuth {
    pub fn new(
        backend: Arc<CredentialBackend>,
        sessions: SessionManager,
        rate_limiter: AuthRateLimiter,
        policy: AuthPolicy,
    ) -> Self {
        Self { backend, sessions, rate_limiter, policy }
    }

    pub fn from_settings(backend: Arc<CredentialBackend>, sessions: SessionManager, settings: &Settings) -> Self {
        let rate_limiter = AuthRateLimiter::new(settings.auth_rate_limit.max_attempts, settings.lockout_duration());
        Self::new(backend, sessions, rate_limiter, AuthPolicy::from_settings(settings))
    }

    fn record_failure(&self, identifier: &str, err: &AppError) {
        metrics::counter!(keys::AUTH_FAILURE).increment(1);
        let stage = AuthStage::of(err).map(|stage| stage.to_string()).unwrap_or_default();
        match err {
            AppError::UserNotFound => {
                self.rate_limiter.record_failed_attempt(identifier);
                debug!(%stage, code = err.error_code(), "sign-in failed");
            },
            AppError::InvalidSecret => {
                self.rate_limiter.record_failed_attempt(identifier);
                warn!(%stage, code = err.error_code(), "sign-in failed");
            },
            _ => warn!(%stage, code = err.error_code(), "sign-in refused"),
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn sign_in(&self, request: SignInRequest) -> Result<SignInResponse, AppError> {
        validate_sign_in(&request)?;
        let identifier = normalize_identifier(&request.identifier);

        if !self.rate_limiter.check_rate_limit(&identifier) {
            metrics::counter!(keys::AUTH_FAILURE).increment(1);
            warn!("sign-in rejected while identifier is locked out");
            return Err(AppError::AuthRateLimited);
        }

        let record = self.backend.find_by_identifier(&identifier).await?;

        // scrypt verification is CPU-bound
        let secret = Zeroizing::new(request.secret);
        let requested_role = request.role;
        let policy = DecisionPolicy { allow_passwordless: self.policy.allow_passwordless };
        let outcome = tokio::task::spawn_blocking(move || {
            decision::evaluate(record, &secret, requested_role, policy)
        })
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

        let record = match outcome {
            Ok(record) => record,
            Err(err) => {
                self.record_failure(&identifier, &err);
                return Err(err);
            },
        };

        self.rate_limiter.record_success(&identifier);
        self.backend.log_profile_diagnostics(&record).await;

        let ttl = self.policy.ttl(request.multi_session);
        let session = self
            .sessions
            .issue(&record.id, &record.identifier, record.role, ttl)
            .await?;

        info!(
            stage = %AuthStage::SessionIssued,
            user_id = %record.id,
            role = %record.role,
            multi_session = request.multi_session,
            backend = %self.backend.kind(),
            "sign-in succeeded"
        );

        Ok(SignInResponse {
            token: session.token,
            role: session.role,
            user_id: session.user_id,
            name: record.display_name,
            expires_at: session.expires_at,
        })
    }

    async fn resolve_session(&self, token: &str) -> Option<SessionRecord> {
        self.sessions.validate(token).await
    }

    async fn authorize(&self, token: Option<&str>, role: Role) -> Result<SessionRecord, AppError> {
        let session = match token {
            Some(token) => self.sessions.validate(token).await,
            None => None,
        };
        gate::authorize(session, role)
    }

    async fn sign_out(&self, token: &str) -> Result<(), AppError> {
        self.sessions.revoke(token).await
    }

    async fn register(&self, request: RegisterRequest) -> Result<RegisterResponse, AppError> {
        validate_registration(&request, &self.policy.password_requirements)?;
        if request.password.is_none() && !self.policy.allow_passwordless {
            return Err(AppError::InvalidInput("Password is required".to_string()));
        }

        let secret_hash = match request.password {
            Some(mut password) => {
                let log_n = self.policy.password_hash_log_n;
                let hash = tokio::task::spawn_blocking(move || hash_password_secure(&mut password, log_n))
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                Some(hash)
            },
            None => None,
        };

        let record = CredentialRecord {
            id: uuid::Uuid::new_v4().to_string(),
            identifier: normalize_identifier(&request.email),
            display_name: request.name.trim().to_string(),
            secret_hash,
            role: request.role,
            active: true,
        };
        let record = self.backend.register(record).await?;
        info!(user_id = %record.id, role = %record.role, backend = %self.backend.kind(), "account registered");

        Ok(RegisterResponse { user_id: record.id })
    }

    fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }
}
