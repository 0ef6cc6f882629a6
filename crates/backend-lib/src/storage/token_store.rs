//! File-backed session token store.
//!
//! The store is a single JSON document `{ "sessions": [...] }`, newest first.
//! It is a deliberately small session table: every lookup is a linear scan and
//! every mutation rewrites the whole file. Mutations are serialized by one
//! async mutex per store; cross-process writers are not coordinated.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use carelink_common::SessionRecord;
use serde::{Deserialize, Serialize};
use tokio::{fs as tokio_fs, sync::Mutex};
use tracing::{debug, error, warn};

use super::write_atomic;
use crate::error::AppError;
use crate::metrics as keys;

/// File name of the token store inside the data directory
pub const SESSIONS_FILE: &str = "sessions.json";

/// On-disk shape of the token store
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TokenStoreFile {
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
}

/// Durable token -> session mapping
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// All records, newest first. Unreadable or corrupt storage yields an
    /// empty list; this never fabricates a record.
    async fn load(&self) -> Vec<SessionRecord>;

    /// Prepend `record`. Returns `false` without writing when its token is
    /// already present.
    async fn insert(&self, record: SessionRecord) -> Result<bool, AppError>;

    /// Remove the record holding `token`. Returns whether one was removed.
    async fn remove(&self, token: &str) -> Result<bool, AppError>;

    /// Find a record by token
    async fn find(&self, token: &str) -> Option<SessionRecord> {
        self.load().await.into_iter().find(|s| s.token == token)
    }
}

/// JSON file implementation of [`TokenStore`]
#[derive(Debug)]
pub struct FlatFileTokenStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FlatFileTokenStore {
    /// Store rooted at `root`; the file itself is created on first access.
    pub fn new<P: AsRef<Path>>(root: P) -> anyhow::Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            path: root.join(SESSIONS_FILE),
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the store file.
    ///
    /// `Ok(None)` means the file does not exist yet.
    async fn read_file(&self) -> Result<Option<TokenStoreFile>, AppError> {
        let bytes = match tokio_fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::Io(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| AppError::MalformedStore(e.to_string()))
    }

    /// Read for a read-modify-write. A malformed file is recovered as empty so
    /// the next write replaces it; any other read failure is returned and the
    /// file is left alone.
    async fn read_for_write(&self) -> Result<TokenStoreFile, AppError> {
        match self.read_file().await {
            Ok(file) => Ok(file.unwrap_or_default()),
            Err(err @ AppError::MalformedStore(_)) => {
                self.report_read_failure(&err);
                Ok(TokenStoreFile::default())
            },
            Err(err) => {
                self.report_read_failure(&err);
                Err(err)
            },
        }
    }

    /// A corrupt file is a data-loss event and is logged as such.
    fn report_read_failure(&self, err: &AppError) {
        if let AppError::MalformedStore(reason) = err {
            metrics::counter!(keys::TOKEN_STORE_MALFORMED).increment(1);
            error!(
                path = %self.path.display(),
                %reason,
                "token store is malformed; treating it as empty, existing sessions are lost"
            );
        } else {
            warn!(path = %self.path.display(), error = %err, "token store unreadable; treating it as empty");
        }
    }

    async fn write_file(&self, file: &TokenStoreFile) -> Result<(), AppError> {
        let json = serde_json::to_vec_pretty(file)?;
        write_atomic(&self.path, json).await
    }

    /// Create the empty store file if it is still missing.
    async fn initialize(&self) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        if tokio_fs::try_exists(&self.path).await? {
            return Ok(());
        }
        debug!(path = %self.path.display(), "creating empty token store");
        self.write_file(&TokenStoreFile::default()).await
    }
}

#[async_trait]
impl TokenStore for FlatFileTokenStore {
    async fn load(&self) -> Vec<SessionRecord> {
        match self.read_file().await {
            Ok(Some(file)) => file.sessions,
            Ok(None) => {
                if let Err(err) = self.initialize().await {
                    warn!(error = %err, "could not create token store");
                }
                Vec::new()
            },
            Err(err) => {
                self.report_read_failure(&err);
                Vec::new()
            },
        }
    }

    async fn insert(&self, record: SessionRecord) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_for_write().await?;
        if file.sessions.iter().any(|s| s.token == record.token) {
            return Ok(false);
        }
        file.sessions.insert(0, record);
        self.write_file(&file).await?;
        Ok(true)
    }

    async fn remove(&self, token: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut file = self.read_for_write().await?;
        let before = file.sessions.len();
        file.sessions.retain(|s| s.token != token);
        if file.sessions.len() == before {
            return Ok(false);
        }
        self.write_file(&file).await?;
        Ok(true)
    }
}
