// ============================
// carelink-backend-lib/src/storage.rs
// ============================
//! Flat-file storage: the session token store and the persistent user store.
//!
//! Both files are rewritten whole. Writers go through [`write_atomic`], so a
//! reader sees either the previous document or the next one, never a torn one.
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::AppError;

pub mod token_store;
pub mod user_store;

pub use token_store::{FlatFileTokenStore, TokenStore, TokenStoreFile, SESSIONS_FILE};
pub use user_store::{FlatFileUserStore, StoredUser, UserStore, UsersFile, USERS_FILE};

/// Write `contents` to a sibling temp file, fsync it, then rename it over `path`.
pub(crate) async fn write_atomic(path: &Path, contents: Vec<u8>) -> Result<(), AppError> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&path, &contents))
        .await
        .map_err(|e| AppError::Internal(format!("atomic write task failed: {e}")))?
}

fn write_atomic_blocking(path: &Path, contents: &[u8]) -> Result<(), AppError> {
    let dir = parent_dir(path);
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
