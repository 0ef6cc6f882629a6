// ============================
// carelink-backend-lib/src/lib.rs
// ============================
//! Core library for the CareLink authentication service: backend selection,
//! the sign-in decision, file-backed sessions and role authorization.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, BackendKind, BackendSelection, BackendSelector, DefaultAuth, SelectionReason, SessionManager};
use crate::config::Settings;
use crate::storage::FlatFileTokenStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Settings
    pub settings: Arc<Settings>,
    /// Backend chosen at startup
    pub backend: BackendKind,
    pub backend_reason: SelectionReason,
}

impl AppState {
    /// Validate settings, select the credential backend and open the token store
    pub async fn new(settings: Settings) -> anyhow::Result<Self> {
        settings.validate()?;
        let selection = BackendSelector::from_settings(&settings).select().await;
        Self::with_selection(settings, selection)
    }

    /// Build the state around an already made backend selection
    pub fn with_selection(settings: Settings, selection: BackendSelection) -> anyhow::Result<Self> {
        let store = Arc::new(FlatFileTokenStore::new(&settings.data_dir)?);
        let backend = selection.kind();
        let backend_reason = selection.reason;
        let auth = Arc::new(DefaultAuth::from_settings(
            Arc::new(selection.backend),
            SessionManager::new(store),
            &settings,
        ));

        Ok(Self {
            auth,
            settings: Arc::new(settings),
            backend,
            backend_reason,
        })
    }
}
