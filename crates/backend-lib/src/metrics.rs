// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const SESSION_ISSUED: &str = "session.issued";
pub const SESSION_REVOKED: &str = "session.revoked";
pub const SESSION_REJECTED: &str = "session.rejected";
pub const AUTH_FAILURE: &str = "auth.failure";
pub const TOKEN_STORE_MALFORMED: &str = "token_store.malformed";
pub const BACKEND_FALLBACK: &str = "backend.fallback";
