// ================================
// tests/unit/token_store_tests.rs
// ================================
//! Token store recovery and file format
use carelink_backend_lib::auth::{SessionManager, SINGLE_ROLE_SESSION_TTL};
use carelink_backend_lib::storage::{FlatFileTokenStore, TokenStore, TokenStoreFile, SESSIONS_FILE};
use carelink_common::Role;
use std::sync::Arc;
use tempfile::tempdir;

#[tokio::test]
async fn test_malformed_file_is_treated_as_empty_and_rewritten() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join(SESSIONS_FILE), "{\"sessions\": [tru").unwrap();

    let store = Arc::new(FlatFileTokenStore::new(dir.path()).unwrap());
    assert!(store.load().await.is_empty());

    let manager = SessionManager::new(store.clone());
    let session = manager
        .issue("user-1", "test@gmail.com", Role::Patient, SINGLE_ROLE_SESSION_TTL)
        .await
        .unwrap();

    let raw = std::fs::read_to_string(dir.path().join(SESSIONS_FILE)).unwrap();
    let file: TokenStoreFile = serde_json::from_str(&raw).unwrap();
    assert_eq!(file.sessions.len(), 1);
    assert_eq!(file.sessions[0].token, session.token);
}

#[tokio::test]
async fn test_file_format_is_camel_case_and_newest_first() {
    let dir = tempdir().unwrap();
    let manager = SessionManager::new(Arc::new(FlatFileTokenStore::new(dir.path()).unwrap()));

    let first = manager
        .issue("user-1", "a@b.io", Role::Patient, SINGLE_ROLE_SESSION_TTL)
        .await
        .unwrap();
    let second = manager
        .issue("user-1", "a@b.io", Role::Doctor, SINGLE_ROLE_SESSION_TTL)
        .await
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join(SESSIONS_FILE)).unwrap()).unwrap();
    let sessions = raw["sessions"].as_array().unwrap();
    assert_eq!(sessions[0]["token"], second.token.as_str());
    assert_eq!(sessions[1]["token"], first.token.as_str());
    for key in ["token", "userId", "email", "role", "createdAt", "expiresAt"] {
        assert!(sessions[0].get(key).is_some(), "missing {key}");
    }
    assert_eq!(sessions[0]["role"], "DOCTOR");
}
