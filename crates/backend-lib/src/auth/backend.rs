// ============================
// carelink-backend-lib/src/auth/backend.rs
// ============================
//! Credential backends.
//!
//! The active backend is chosen once at startup (see [`super::selector`]) and
//! passed explicitly to the authentication service. Backends only resolve
//! identifiers; password checks live in [`super::decision`].
use std::fmt;
use std::sync::Arc;

use carelink_common::Role;
use dashmap::{mapref::entry::Entry, DashMap};
use tracing::debug;

use crate::error::AppError;
use crate::storage::{StoredUser, UserStore};

/// Normalize an identifier for lookup: trim and lowercase.
pub fn normalize_identifier(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

/// Snapshot of one account used for a single authentication attempt
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub id: String,
    /// Normalized email
    pub identifier: String,
    pub display_name: String,
    /// `None` for accounts provisioned without a local password
    pub secret_hash: Option<String>,
    pub role: Role,
    pub active: bool,
}

// Hand-written so the hash can never reach a log line.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .field("display_name", &self.display_name)
            .field("secret_hash", &self.secret_hash.as_ref().map(|_| "<redacted>"))
            .field("role", &self.role)
            .field("active", &self.active)
            .finish()
    }
}

impl From<StoredUser> for CredentialRecord {
    fn from(user: StoredUser) -> Self {
        Self {
            id: user.id,
            identifier: normalize_identifier(&user.email),
            display_name: user.name,
            secret_hash: user.password_hash,
            role: user.role,
            active: user.is_active,
        }
    }
}

impl From<CredentialRecord> for StoredUser {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            email: record.identifier,
            name: record.display_name,
            password_hash: record.secret_hash,
            role: record.role,
            is_active: record.active,
            has_patient_profile: record.role == Role::Patient,
            has_doctor_profile: record.role == Role::Doctor,
        }
    }
}

/// Which backend variant is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Persistent,
    InMemory,
}

impl BackendKind {
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Persistent => "persistent",
            BackendKind::InMemory => "in-memory",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Process-lifetime credential map used in fallback mode. Lost on restart.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    users: DashMap<String, CredentialRecord>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_identifier(&self, identifier: &str) -> Option<CredentialRecord> {
        self.users
            .get(&normalize_identifier(identifier))
            .map(|entry| entry.value().clone())
    }

    /// Add an account. The identifier is normalized before it is stored.
    pub fn register(&self, mut record: CredentialRecord) -> Result<CredentialRecord, AppError> {
        record.identifier = normalize_identifier(&record.identifier);
        match self.users.entry(record.identifier.clone()) {
            Entry::Occupied(_) => Err(AppError::AlreadyRegistered),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(record)
            },
        }
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

/// Credential lookups against the external user store
#[derive(Clone)]
pub struct PersistentBackend {
    store: Arc<dyn UserStore>,
}

impl PersistentBackend {
    /// Probe the store once and wrap it. Any probe failure is returned so the
    /// selector can fall back.
    pub async fn load(store: Arc<dyn UserStore>) -> Result<Self, AppError> {
        store.ping().await?;
        Ok(Self { store })
    }

    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>, AppError> {
        let normalized = normalize_identifier(identifier);
        let user = self.store.find_user_by_identifier(&normalized).await?;
        Ok(user.map(CredentialRecord::from))
    }

    pub async fn register(&self, mut record: CredentialRecord) -> Result<CredentialRecord, AppError> {
        record.identifier = normalize_identifier(&record.identifier);
        self.store.insert_user(StoredUser::from(record.clone())).await?;
        Ok(record)
    }

    /// Log which profiles exist for the account. Diagnostic only; never part
    /// of the authentication decision.
    async fn log_profiles(&self, record: &CredentialRecord) {
        let patient = self.store.has_patient_profile(&record.id).await;
        let doctor = self.store.has_doctor_profile(&record.id).await;
        match (patient, doctor) {
            (Ok(patient), Ok(doctor)) => debug!(
                user_id = %record.id,
                role = %record.role,
                has_patient_profile = patient,
                has_doctor_profile = doctor,
                "profile diagnostics"
            ),
            (Err(err), _) | (_, Err(err)) => {
                debug!(user_id = %record.id, error = %err, "profile diagnostics unavailable")
            },
        }
    }
}

/// The credential backend selected at startup
pub enum CredentialBackend {
    Persistent(PersistentBackend),
    InMemory(InMemoryBackend),
}

impl CredentialBackend {
    /// A fresh, empty fallback backend
    pub fn in_memory() -> Self {
        CredentialBackend::InMemory(InMemoryBackend::new())
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            CredentialBackend::Persistent(_) => BackendKind::Persistent,
            CredentialBackend::InMemory(_) => BackendKind::InMemory,
        }
    }

    /// Resolve an identifier. A miss is `Ok(None)`; only store failures are errors.
    pub async fn find_by_identifier(&self, identifier: &str) -> Result<Option<CredentialRecord>, AppError> {
        match self {
            CredentialBackend::Persistent(backend) => backend.find_by_identifier(identifier).await,
            CredentialBackend::InMemory(backend) => Ok(backend.find_by_identifier(identifier)),
        }
    }

    pub async fn register(&self, record: CredentialRecord) -> Result<CredentialRecord, AppError> {
        match self {
            CredentialBackend::Persistent(backend) => backend.register(record).await,
            CredentialBackend::InMemory(backend) => backend.register(record),
        }
    }

    pub async fn log_profile_diagnostics(&self, record: &CredentialRecord) {
        if let CredentialBackend::Persistent(backend) = self {
            backend.log_profiles(record).await;
        }
    }
}
