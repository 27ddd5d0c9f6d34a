//! Credential storage for the storefront session
//!
//! Holds at most one credential: the access token plus an optional refresh
//! token. In-memory by default; when constructed with a backing file every
//! change is persisted with an atomic temp-file + rename so a crash
//! mid-write never corrupts the stored value. A tokio Mutex serializes
//! concurrent writes from request-time refresh and explicit login/logout.
//!
//! The store is the single source of truth for the session credential. The
//! pipeline reads it at attach time; the coordinator replaces it after a
//! refresh; logout clears it.

use std::path::{Path, PathBuf};

use common::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// The session credential.
///
/// `access` authorizes requests as `Authorization: Bearer <access>`.
/// `refresh` is the secondary token presented to the refresh endpoint;
/// absent for deployments where the refresh credential travels as a cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    /// Bearer token attached to outbound requests
    pub access: SecretString,
    /// Token presented to the refresh endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<SecretString>,
}

impl Credential {
    /// Credential with an access token only.
    pub fn new(access: impl Into<SecretString>) -> Self {
        Self {
            access: access.into(),
            refresh: None,
        }
    }

    /// Credential with both tokens.
    pub fn with_refresh(
        access: impl Into<SecretString>,
        refresh: impl Into<SecretString>,
    ) -> Self {
        Self {
            access: access.into(),
            refresh: Some(refresh.into()),
        }
    }
}

/// Thread-safe single-credential store.
///
/// The Mutex serializes all access. Reads acquire the lock briefly to clone
/// the credential, so attach-time reads don't block on a concurrent persist.
#[derive(Debug)]
pub struct CredentialStore {
    path: Option<PathBuf>,
    state: Mutex<Option<Credential>>,
}

impl CredentialStore {
    /// Store backed by a credential file.
    ///
    /// A missing file is a cold start with no credential; the file is
    /// created on the first `set`. An unreadable or unparseable file is an
    /// error rather than a silent logout.
    pub async fn load(path: PathBuf) -> Result<Self> {
        let state = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
            let credential: Credential = serde_json::from_str(&contents)
                .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), "loaded stored credential");
            Some(credential)
        } else {
            info!(path = %path.display(), "credential file not found, starting unauthenticated");
            None
        };

        Ok(Self {
            path: Some(path),
            state: Mutex::new(state),
        })
    }

    /// Store with no backing file. Suitable for tests and short-lived
    /// processes; `set`/`clear` never touch the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(None),
        }
    }

    /// Clone of the current credential, or `None` when unauthenticated.
    pub async fn get(&self) -> Option<Credential> {
        let state = self.state.lock().await;
        state.clone()
    }

    /// Replace the stored credential and persist it when a backing file is
    /// configured. Setting the same value twice is a no-op beyond the write.
    ///
    /// The file is written before memory is updated: a failed persist leaves
    /// the previous credential in effect.
    pub async fn set(&self, credential: Credential) -> Result<()> {
        let mut state = self.state.lock().await;
        if let Some(path) = &self.path {
            write_atomic(path, &credential).await?;
        }
        *state = Some(credential);
        debug!("stored credential");
        Ok(())
    }

    /// Remove the credential (and any refresh token). Subsequent `get`
    /// returns `None`. Removes the backing file when one is configured.
    pub async fn clear(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        *state = None;
        debug!("cleared credential");
        if let Some(path) = &self.path {
            match tokio::fs::remove_file(path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(Error::Io(format!("removing credential file: {e}"))),
            }
        }
        Ok(())
    }
}

/// Write the credential to a file atomically.
///
/// Writes a temporary file in the same directory, then renames it over the
/// target. Permissions are set to 0600 before the rename since the file
/// contains session tokens.
async fn write_atomic(path: &Path, credential: &Credential) -> Result<()> {
    let json = serde_json::to_string_pretty(credential)
        .map_err(|e| Error::CredentialParse(format!("serializing credential: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("credential path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".credential.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credential");
    Ok(())
}
