// ============================
// carelink-backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
use std::sync::Arc;
use std::time::Duration;

use carelink_common::{Role, SessionRecord};
use chrono::{DateTime, Utc};
use tracing::debug;

use super::token_generator::generate_secure_token;
use crate::error::AppError;
use crate::metrics as keys;
use crate::storage::TokenStore;

/// Default TTL for a short-lived single-role session (1 day)
pub const SINGLE_ROLE_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Default TTL for a multi-role session (7 days)
pub const MULTI_ROLE_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Attempts at drawing a token that is not already in the store
const MAX_TOKEN_ATTEMPTS: usize = 3;

/// Issues, validates and revokes session tokens backed by a [`TokenStore`]
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn TokenStore>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    /// Issue and persist a session valid for `ttl`. The caller picks the TTL.
    pub async fn issue(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        ttl: Duration,
    ) -> Result<SessionRecord, AppError> {
        self.issue_at(user_id, email, role, ttl, Utc::now()).await
    }

    /// [`issue`](Self::issue) with an explicit clock
    pub async fn issue_at(
        &self,
        user_id: &str,
        email: &str,
        role: Role,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<SessionRecord, AppError> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|_| AppError::InvalidInput("session ttl out of range".to_string()))?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::InvalidInput("session ttl out of range".to_string()))?;

        for _ in 0..MAX_TOKEN_ATTEMPTS {
            let record = SessionRecord {
                token: generate_secure_token(),
                user_id: user_id.to_string(),
                email: email.to_string(),
                role,
                created_at: now,
                expires_at,
            };
            if self.store.insert(record.clone()).await? {
                metrics::counter!(keys::SESSION_ISSUED).increment(1);
                debug!(user_id, %role, %expires_at, "session issued");
                return Ok(record);
            }
        }
        Err(AppError::Internal("could not allocate a unique session token".to_string()))
    }

    /// Return the session for `token` unless it is unknown or expired
    pub async fn validate(&self, token: &str) -> Option<SessionRecord> {
        self.validate_at(token, Utc::now()).await
    }

    /// [`validate`](Self::validate) with an explicit clock. Expired records
    /// are left in the store.
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<SessionRecord> {
        if token.is_empty() {
            return None;
        }
        let Some(record) = self.store.find(token).await else {
            metrics::counter!(keys::SESSION_REJECTED).increment(1);
            return None;
        };
        if record.is_expired_at(now) {
            metrics::counter!(keys::SESSION_REJECTED).increment(1);
            debug!(user_id = %record.user_id, role = %record.role, "session expired");
            return None;
        }
        Some(record)
    }

    /// Remove the session for `token`. Unknown tokens are ignored.
    pub async fn revoke(&self, token: &str) -> Result<(), AppError> {
        if self.store.remove(token).await? {
            metrics::counter!(keys::SESSION_REVOKED).increment(1);
            debug!("session revoked");
        }
        Ok(())
    }
}
