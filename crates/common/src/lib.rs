// ================
// common/src/lib.rs
// ================
//! Common types shared between the `CareLink` auth backend and its clients.
//! This module defines the HTTP request/response bodies and the session
//! record persisted in the token store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role.
///
/// `Patient` is the primary account holder, `Doctor` the secondary one.
/// A single client may hold one session per role at the same time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Patient,
    Doctor,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Patient => "PATIENT",
            Role::Doctor => "DOCTOR",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a [`Role`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PATIENT" => Ok(Role::Patient),
            "DOCTOR" => Ok(Role::Doctor),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// One authenticated, role-scoped session as stored in the token store file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Opaque session token
    pub token: String,
    /// Subject identifier
    pub user_id: String,
    /// Subject email
    pub email: String,
    /// Role this session was issued for
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// A session is expired once `now` reaches `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Body of `POST /session`
///
/// Missing fields deserialize to empty strings so the server can answer with
/// a 400 instead of a body-rejection status.
#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub secret: String,
    /// Role the caller wants to act as; `None` accepts whatever the account has
    #[serde(default)]
    pub role: Option<Role>,
    /// Ask for the long-lived multi-role session TTL
    #[serde(default)]
    pub multi_session: bool,
}

impl fmt::Debug for SignInRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInRequest")
            .field("identifier", &self.identifier)
            .field("secret", &"<redacted>")
            .field("role", &self.role)
            .field("multi_session", &self.multi_session)
            .finish()
    }
}

/// Successful response to `POST /session`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub token: String,
    pub role: Role,
    pub user_id: String,
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

/// Response to `GET /session`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SessionStatus {
    pub valid: bool,
    pub session: Option<SessionRecord>,
}

/// Body of `POST /register`
#[derive(Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    /// Accounts created without a password can only be used when the
    /// server allows passwordless sign-in
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .finish()
    }
}

/// Successful response to `POST /register`
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: String,
}

/// Response to `GET /health`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    /// `persistent` or `in-memory`
    pub backend: String,
    /// Why the backend was chosen at startup
    pub reason: String,
}
