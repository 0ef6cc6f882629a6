// ============================
// carelink-backend-lib/src/auth/selector.rs
// ============================
//! One-shot startup choice between the persistent and the in-memory backend.
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use tracing::{info, warn};

use super::backend::{BackendKind, CredentialBackend, PersistentBackend};
use crate::config::Settings;
use crate::metrics as keys;
use crate::storage::{FlatFileUserStore, UserStore};

/// Inputs to the backend decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionSignals {
    pub client_initialized: bool,
    pub connection_configured: bool,
    pub force_fallback: bool,
}

/// Why a backend was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    PersistentLoaded,
    ClientInitFailed,
    NoConnectionString,
    ForcedByConfig,
    LoadFailed,
}

impl fmt::Display for SelectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SelectionReason::PersistentLoaded => "persistent store loaded",
            SelectionReason::ClientInitFailed => "persistent client failed to initialize",
            SelectionReason::NoConnectionString => "no connection string configured",
            SelectionReason::ForcedByConfig => "fallback forced by configuration",
            SelectionReason::LoadFailed => "persistent store failed to load",
        })
    }
}

/// Outcome of [`decide`], before the persistent store is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Persistent,
    Fallback(SelectionReason),
}

/// First matching rule wins: client failure, missing connection string,
/// override, then persistent.
pub fn decide(signals: SelectionSignals) -> Decision {
    if !signals.client_initialized {
        Decision::Fallback(SelectionReason::ClientInitFailed)
    } else if !signals.connection_configured {
        Decision::Fallback(SelectionReason::NoConnectionString)
    } else if signals.force_fallback {
        Decision::Fallback(SelectionReason::ForcedByConfig)
    } else {
        Decision::Persistent
    }
}

/// The chosen backend and the reason it was chosen
pub struct BackendSelection {
    pub backend: CredentialBackend,
    pub reason: SelectionReason,
}

impl BackendSelection {
    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    fn fallback(reason: SelectionReason) -> Self {
        metrics::counter!(keys::BACKEND_FALLBACK).increment(1);
        Self { backend: CredentialBackend::in_memory(), reason }
    }
}

/// Startup inputs for the backend decision
pub struct BackendSelector {
    /// `None` when no connection string is configured
    client: Option<anyhow::Result<Arc<dyn UserStore>>>,
    force_fallback: bool,
}

impl BackendSelector {
    pub fn new(client: Option<anyhow::Result<Arc<dyn UserStore>>>, force_fallback: bool) -> Self {
        Self { client, force_fallback }
    }

    /// Build the persistent client from `database_url`, if one is configured
    pub fn from_settings(settings: &Settings) -> Self {
        let client = settings
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .map(|url| FlatFileUserStore::connect(url).map(|store| Arc::new(store) as Arc<dyn UserStore>));
        Self::new(client, settings.force_fallback)
    }

    pub fn signals(&self) -> SelectionSignals {
        SelectionSignals {
            client_initialized: !matches!(self.client, Some(Err(_))),
            connection_configured: self.client.is_some(),
            force_fallback: self.force_fallback,
        }
    }

    /// Make the decision. Never fails: every problem ends in fallback mode.
    pub async fn select(self) -> BackendSelection {
        let signals = self.signals();
        let selection = match (decide(signals), self.client) {
            (Decision::Persistent, Some(Ok(store))) => {
                let load = AssertUnwindSafe(PersistentBackend::load(store)).catch_unwind().await;
                match load {
                    Ok(Ok(backend)) => BackendSelection {
                        backend: CredentialBackend::Persistent(backend),
                        reason: SelectionReason::PersistentLoaded,
                    },
                    Ok(Err(err)) => {
                        warn!(error = %err, "persistent store failed to load");
                        BackendSelection::fallback(SelectionReason::LoadFailed)
                    },
                    Err(_) => {
                        warn!("persistent store panicked while loading");
                        BackendSelection::fallback(SelectionReason::LoadFailed)
                    },
                }
            },
            (Decision::Fallback(reason), Some(Err(err))) => {
                warn!(error = %err, "persistent client failed to initialize");
                BackendSelection::fallback(reason)
            },
            (Decision::Fallback(reason), _) => BackendSelection::fallback(reason),
            (Decision::Persistent, _) => BackendSelection::fallback(SelectionReason::ClientInitFailed),
        };

        info!(
            backend = %selection.kind(),
            reason = %selection.reason,
            "credential backend selected"
        );
        selection
    }
}
