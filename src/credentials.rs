// Credential store: the per-user access token obtained by the OAuth
// handshake is kept as a small JSON file in the user's home directory
// so later runs can skip authorization.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File name of the persisted access token.
pub const CREDENTIALS_FILE: &str = "at.json";

/// Long-lived access credentials. Field names match the on-disk layout
/// (`Token`, `Secret`, `AccessToken`).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    #[serde(rename = "Token")]
    pub token: String,
    #[serde(rename = "Secret")]
    pub secret: String,
    #[serde(rename = "AccessToken", default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

/// Request-token pair handed out by the first handshake step. Only lives
/// until it is exchanged for `Credentials`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryCredential {
    pub token: String,
    pub secret: String,
}

/// Reads and writes `Credentials` at a fixed path.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        CredentialStore { path: path.into() }
    }

    /// `~/at.json`, or `./at.json` when no home directory is known.
    pub fn default_location() -> Self {
        let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load stored credentials. A missing or unreadable file yields `None`
    /// so the caller simply re-authorizes.
    pub fn load(&self) -> Option<Credentials> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no stored credentials");
                return None;
            }
        };
        match serde_json::from_str(&data) {
            Ok(creds) => Some(creds),
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "ignoring malformed credentials file");
                None
            }
        }
    }

    /// Persist credentials as JSON, replacing any previous file.
    pub fn save(&self, creds: &Credentials) -> Result<()> {
        let json = serde_json::to_string_pretty(creds).context("Failed to serialize credentials")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        debug!(path = %self.path.display(), "credentials saved");
        Ok(())
    }
}
