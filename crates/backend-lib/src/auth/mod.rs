// ============================
// carelink-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod backend;
pub mod decision;
pub mod gate;
pub mod password;
pub mod rate_limit;
pub mod selector;
pub mod session;
pub mod token_generator;
mod service;
mod service_impl;

pub use backend::{normalize_identifier, BackendKind, CredentialBackend, CredentialRecord, InMemoryBackend, PersistentBackend};
pub use password::{hash_password, verify_password, validate_password_strength, PasswordRequirements, MIN_PASSWORD_LENGTH};
pub use rate_limit::AuthRateLimiter;
pub use selector::{BackendSelection, BackendSelector, SelectionReason};
pub use session::{SessionManager, MULTI_ROLE_SESSION_TTL, SINGLE_ROLE_SESSION_TTL};
pub use service::AuthService;
pub use service_impl::{AuthPolicy, DefaultAuth};
