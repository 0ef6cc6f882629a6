// ============================
// carelink-backend-lib/src/auth/decision.rs
// ============================
//! Credential checks run in a fixed order, whichever backend produced the record:
//! lookup, password, role, activation. The first failing check decides the error.
use std::fmt;

use carelink_common::Role;

use super::backend::CredentialRecord;
use super::password::verify_password;
use crate::error::AppError;

/// Stages of a sign-in attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStage {
    IdentifierLookup,
    PasswordCheck,
    RoleCheck,
    ActivationCheck,
    SessionIssued,
}

impl AuthStage {
    /// Stage at which a decision error was raised
    pub fn of(error: &AppError) -> Option<Self> {
        match error {
            AppError::UserNotFound => Some(AuthStage::IdentifierLookup),
            AppError::InvalidSecret => Some(AuthStage::PasswordCheck),
            AppError::RoleMismatch { .. } => Some(AuthStage::RoleCheck),
            AppError::AccountDeactivated => Some(AuthStage::ActivationCheck),
            _ => None,
        }
    }
}

impl fmt::Display for AuthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuthStage::IdentifierLookup => "IDENTIFIER_LOOKUP",
            AuthStage::PasswordCheck => "PASSWORD_CHECK",
            AuthStage::RoleCheck => "ROLE_CHECK",
            AuthStage::ActivationCheck => "ACTIVATION_CHECK",
            AuthStage::SessionIssued => "SESSION_ISSUED",
        })
    }
}

/// Inputs that shape the checks
#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    /// Accounts without a stored hash pass the password check when set
    pub allow_passwordless: bool,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self { allow_passwordless: true }
    }
}

/// Run the checks on a looked-up record.
///
/// Returns the record when every check passes; the caller then issues a session.
pub fn evaluate(
    record: Option<CredentialRecord>,
    secret: &str,
    requested_role: Option<Role>,
    policy: DecisionPolicy,
) -> Result<CredentialRecord, AppError> {
    let record = record.ok_or(AppError::UserNotFound)?;

    match record.secret_hash.as_deref() {
        Some(hash) => {
            if !verify_password(hash, secret) {
                return Err(AppError::InvalidSecret);
            }
        },
        None if !policy.allow_passwordless => return Err(AppError::InvalidSecret),
        None => {},
    }

    if let Some(requested) = requested_role {
        if requested != record.role {
            return Err(AppError::RoleMismatch { requested, stored: record.role });
        }
    }

    if !record.active {
        return Err(AppError::AccountDeactivated);
    }

    Ok(record)
}
