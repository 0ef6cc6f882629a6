//! Persistent credential store contract and its flat-file implementation.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use carelink_common::Role;
use serde::{Deserialize, Serialize};
use tokio::{fs as tokio_fs, sync::Mutex};

use super::write_atomic;
use crate::auth::backend::normalize_identifier;
use crate::error::AppError;

/// File name of the user table inside the store directory
pub const USERS_FILE: &str = "users.json";

const FILE_SCHEME: &str = "file://";

/// A user row as the persistent store returns it.
///
/// Deliberately not `Debug`: it carries the password hash.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredUser {
    pub id: String,
    /// Stored lowercased
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub password_hash: Option<String>,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub has_patient_profile: bool,
    #[serde(default)]
    pub has_doctor_profile: bool,
}

fn default_active() -> bool {
    true
}

/// On-disk shape of the user table
#[derive(Default, Clone, Serialize, Deserialize)]
pub struct UsersFile {
    #[serde(default)]
    pub users: Vec<StoredUser>,
}

/// Read/write contract the auth core needs from a persistent credential store
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Cheap reachability probe run once when the backend is selected
    async fn ping(&self) -> Result<(), AppError>;

    /// Look up a user by an already-normalized identifier.
    /// No matching row is `Ok(None)`, not an error.
    async fn find_user_by_identifier(&self, normalized: &str) -> Result<Option<StoredUser>, AppError>;

    async fn has_patient_profile(&self, user_id: &str) -> Result<bool, AppError>;

    async fn has_doctor_profile(&self, user_id: &str) -> Result<bool, AppError>;

    /// Insert a new user. Fails with `AlreadyRegistered` on a duplicate email.
    async fn insert_user(&self, user: StoredUser) -> Result<(), AppError>;
}

/// User table kept as a JSON file in a directory
#[derive(Debug)]
pub struct FlatFileUserStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FlatFileUserStore {
    /// Open the store named by a connection string: `file://<dir>` or a bare
    /// directory path. The directory must already exist.
    ///
    /// Error messages never echo the connection string.
    pub fn connect(url: &str) -> anyhow::Result<Self> {
        let url = url.trim();
        let dir = match url.strip_prefix(FILE_SCHEME) {
            Some(rest) => rest,
            None if url.contains("://") => anyhow::bail!("unsupported connection scheme"),
            None => url,
        };
        if dir.is_empty() {
            anyhow::bail!("connection string names no directory");
        }
        let dir = Path::new(dir);
        if !dir.is_dir() {
            anyhow::bail!("user store directory does not exist");
        }
        Ok(Self {
            path: dir.join(USERS_FILE),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_users(&self) -> Result<UsersFile, AppError> {
        let bytes = match tokio_fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(UsersFile::default()),
            Err(e) => return Err(AppError::BackendUnavailable(format!("user store unreadable: {e}"))),
        };
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::BackendUnavailable(format!("user store is corrupt: {e}")))
    }

    async fn find_by_id(&self, user_id: &str) -> Result<Option<StoredUser>, AppError> {
        Ok(self.read_users().await?.users.into_iter().find(|u| u.id == user_id))
    }
}

#[async_trait]
impl UserStore for FlatFileUserStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.read_users().await.map(|_| ())
    }

    async fn find_user_by_identifier(&self, normalized: &str) -> Result<Option<StoredUser>, AppError> {
        let users = self.read_users().await?;
        Ok(users
            .users
            .into_iter()
            .find(|u| normalize_identifier(&u.email) == normalized))
    }

    async fn has_patient_profile(&self, user_id: &str) -> Result<bool, AppError> {
        Ok(self.find_by_id(user_id).await?.is_some_and(|u| u.has_patient_profile))
    }

    async fn has_doctor_profile(&self, user_id: &str) -> Result<bool, AppError> {
        Ok(self.find_by_id(user_id).await?.is_some_and(|u| u.has_doctor_profile))
    }

    async fn insert_user(&self, user: StoredUser) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_users().await?;
        let email = normalize_identifier(&user.email);
        if file.users.iter().any(|u| normalize_identifier(&u.email) == email) {
            return Err(AppError::AlreadyRegistered);
        }
        file.users.push(user);
        let json = serde_json::to_vec_pretty(&file)?;
        write_atomic(&self.path, json).await
    }
}
