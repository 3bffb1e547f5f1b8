//! File-backed session token storage.
//!
//! The single persisted piece of client state: one opaque token in a TOML
//! file under the user's config directory. Writes go through a tmp file,
//! fsync, and atomic rename, guarded by an advisory lock, so a crash never
//! leaves a half-written token behind.

use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use tablechat_core::error::{ChatClientError, Result};
use tablechat_core::session::TokenStorage;

/// File name of the token record under the config directory.
const SESSION_FILE: &str = "session.toml";

/// On-disk shape of the token record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionRecord {
    token: String,
}

/// [`TokenStorage`] implementation backed by a TOML file.
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    /// Storage at an explicit path (tests, embedders with their own layout).
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Storage at the default location: `~/.config/tablechat/session.toml`.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let record: SessionRecord = toml::from_str(&content)
            .map_err(|e| ChatClientError::storage(format!("TOML parse error: {e}")))?;

        if record.token.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(record.token))
        }
    }

    fn save(&self, token: &str) -> Result<()> {
        let record = SessionRecord {
            token: token.to_string(),
        };
        let content = toml::to_string_pretty(&record)
            .map_err(|e| ChatClientError::storage(format!("TOML serialization error: {e}")))?;

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let _lock = FileLock::acquire(&self.path)?;

        // tmp file + fsync + atomic rename
        let tmp_path = temp_path(&self.path)?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(content.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), "session token persisted");
        Ok(())
    }
}

fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ChatClientError::storage("could not determine home directory"))?;
    Ok(home.join(".config").join("tablechat").join(SESSION_FILE))
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let parent = path
        .parent()
        .ok_or_else(|| ChatClientError::storage("session path has no parent directory"))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| ChatClientError::storage("session path has no file name"))?;

    Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
}

/// Advisory lock guard; released on drop.
struct FileLock {
    #[allow(dead_code)]
    file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive()
                .map_err(|e| ChatClientError::storage(format!("failed to acquire lock: {e}")))?;
        }

        Ok(FileLock { file, lock_path })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Unlock is automatic when the handle drops; lock file removal is
        // best effort.
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> FileTokenStorage {
        FileTokenStorage::new(dir.path().join("tablechat").join(SESSION_FILE))
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);

        storage.save("sess_abc123").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("sess_abc123"));
    }

    #[test]
    fn save_overwrites_previous_token() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);

        storage.save("sess_old").unwrap();
        storage.save("sess_new").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("sess_new"));
    }

    #[test]
    fn no_temp_file_left_behind() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.save("sess_abc").unwrap();

        let tmp = storage.path().parent().unwrap().join(".session.toml.tmp");
        assert!(!tmp.exists());
        assert!(storage.path().exists());
    }

    #[test]
    fn empty_file_counts_as_no_token() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::create_dir_all(storage.path().parent().unwrap()).unwrap();
        fs::write(storage.path(), "").unwrap();

        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn works_through_the_session_store() {
        use std::sync::Arc;
        use tablechat_core::session::SessionStore;

        let dir = TempDir::new().unwrap();
        let storage = Arc::new(storage_in(&dir));

        let store = SessionStore::open(storage.clone()).unwrap();
        let first = store.token().to_string();
        assert!(first.starts_with("sess_"));

        // A second open sees the persisted token.
        let store = SessionStore::open(storage).unwrap();
        assert_eq!(store.token(), first);
    }
}
