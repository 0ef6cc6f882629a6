// ============================
// tests/unit/selector_tests.rs
// ============================
//! Backend selector inputs derived from settings
use carelink_backend_lib::auth::selector::SelectionSignals;
use carelink_backend_lib::auth::{BackendKind, BackendSelector, SelectionReason};
use carelink_backend_lib::config::Settings;
use tempfile::tempdir;

fn signals_for(database_url: Option<String>, force_fallback: bool) -> SelectionSignals {
    let settings = Settings { database_url, force_fallback, ..Settings::default() };
    BackendSelector::from_settings(&settings).signals()
}

#[test]
fn test_signals_from_settings() {
    let dir = tempdir().unwrap();
    let bare = dir.path().display().to_string();

    let signals = signals_for(None, false);
    assert!(!signals.connection_configured);
    assert!(signals.client_initialized);

    // blank strings count as unset
    assert!(!signals_for(Some("   ".to_string()), false).connection_configured);

    let signals = signals_for(Some(bare.clone()), true);
    assert!(signals.connection_configured && signals.client_initialized && signals.force_fallback);

    let signals = signals_for(Some(format!("file://{bare}")), false);
    assert!(signals.client_initialized);

    let signals = signals_for(Some(format!("file://{bare}/missing")), false);
    assert!(signals.connection_configured);
    assert!(!signals.client_initialized);

    assert!(!signals_for(Some("redis://localhost".to_string()), false).client_initialized);
}

#[tokio::test]
async fn test_select_from_settings() {
    let dir = tempdir().unwrap();
    let settings = Settings {
        database_url: Some(dir.path().display().to_string()),
        ..Settings::default()
    };

    let selection = BackendSelector::from_settings(&settings).select().await;
    assert_eq!(selection.kind(), BackendKind::Persistent);
    assert_eq!(selection.reason, SelectionReason::PersistentLoaded);
}
