//! Auth-state directory.
//!
//! One directory holds everything needed to resume a paired session:
//! the client library's own key store (`session.db`) and `creds.json`,
//! the record of which account those keys belong to.

use crate::{error::GatewayError, event::Credentials};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const SESSION_DB: &str = "session.db";
const CREDS_FILE: &str = "creds.json";

/// Handle on the auth-state directory for one connection attempt.
#[derive(Debug, Clone)]
pub struct AuthState {
    dir: PathBuf,
}

impl AuthState {
    /// Open the auth directory, creating it empty if it does not exist.
    pub fn load_or_create(dir: impl AsRef<Path>) -> Result<Self, GatewayError> {
        let dir = dir.as_ref().to_path_buf();
        if !dir.exists() {
            info!("creating auth state at {}", dir.display());
        }
        std::fs::create_dir_all(&dir).map_err(|e| {
            GatewayError::Filesystem(format!("failed to create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the client library's key store.
    pub fn session_db_path(&self) -> PathBuf {
        self.dir.join(SESSION_DB)
    }

    fn creds_path(&self) -> PathBuf {
        self.dir.join(CREDS_FILE)
    }

    /// Persist credentials. Written to a temp file and renamed so a crash
    /// never leaves a half-written record behind.
    pub fn save_creds(&self, creds: &Credentials) -> Result<(), GatewayError> {
        let data = serde_json::to_string_pretty(creds)?;
        let tmp = self.dir.join(format!("{CREDS_FILE}.tmp"));
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, self.creds_path())?;
        debug!("saved credentials for {}", creds.identity.id);
        Ok(())
    }

    /// Load the credential record, if one was saved.
    pub fn load_creds(&self) -> Result<Option<Credentials>, GatewayError> {
        let path = self.creds_path();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Whether this directory holds a paired account.
    pub fn is_registered(&self) -> bool {
        self.creds_path().exists()
    }

    /// Delete an auth directory wholesale. Returns `false` if it was absent.
    pub fn remove(dir: impl AsRef<Path>) -> Result<bool, GatewayError> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(false);
        }
        std::fs::remove_dir_all(dir).map_err(|e| {
            GatewayError::Filesystem(format!("failed to delete {}: {e}", dir.display()))
        })?;
        info!("deleted auth state at {}", dir.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AccountIdentity;

    #[test]
    fn test_load_or_create_makes_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("auth");
        assert!(!dir.exists());

        let auth = AuthState::load_or_create(&dir).unwrap();
        assert!(dir.is_dir());
        assert!(!auth.is_registered());
        assert_eq!(auth.session_db_path(), dir.join("session.db"));
    }

    #[test]
    fn test_creds_round_trip() {
        let tmp = tempfile::tempdir().unwrap();
        let auth = AuthState::load_or_create(tmp.path().join("auth")).unwrap();
        assert!(auth.load_creds().unwrap().is_none());

        let creds = Credentials::new(AccountIdentity {
            id: "628111222333:4@s.whatsapp.net".to_string(),
            name: Some("Budi".to_string()),
        });
        auth.save_creds(&creds).unwrap();

        assert!(auth.is_registered());
        assert_eq!(auth.load_creds().unwrap(), Some(creds));
        assert!(!auth.dir().join("creds.json.tmp").exists());
    }

    #[test]
    fn test_existing_state_is_reused() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("auth");
        let first = AuthState::load_or_create(&dir).unwrap();
        first
            .save_creds(&Credentials::new(AccountIdentity {
                id: "1@s.whatsapp.net".to_string(),
                name: None,
            }))
            .unwrap();

        let second = AuthState::load_or_create(&dir).unwrap();
        assert!(second.is_registered());
    }

    #[test]
    fn test_remove_deletes_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("auth");
        let auth = AuthState::load_or_create(&dir).unwrap();
        std::fs::write(auth.session_db_path(), b"keys").unwrap();

        assert!(AuthState::remove(&dir).unwrap());
        assert!(!dir.exists());
    }

    #[test]
    fn test_remove_missing_directory_is_noop() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(!AuthState::remove(tmp.path().join("never-created")).unwrap());
    }
}
