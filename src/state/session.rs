use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// The connected account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSession {
    /// Exactly as the wallet reported it
    pub address: String,
}

impl WalletSession {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// `0x1234...abcd`
    pub fn short_address(&self) -> String {
        let addr = &self.address;
        let chars: Vec<char> = addr.chars().collect();
        if chars.len() <= 10 {
            return addr.clone();
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

// On-disk shape, one key like the browser's local storage entry.
#[derive(Serialize, Deserialize)]
struct StoredSession {
    account: String,
}

/// Persists the session between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `None` if nothing was saved.
    pub fn load(&self) -> Result<Option<WalletSession>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let stored: StoredSession = serde_json::from_str(&contents)?;
        if stored.account.is_empty() {
            return Ok(None);
        }
        Ok(Some(WalletSession::new(stored.account)))
    }

    pub fn save(&self, session: &WalletSession) -> Result<()> {
        let stored = StoredSession {
            account: session.address.clone(),
        };
        fs::write(&self.path, serde_json::to_string(&stored)?)?;
        Ok(())
    }

    /// Missing file is fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub(crate) fn scratch_path(name: &str) -> PathBuf {
    let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
    std::env::temp_dir().join(format!(
        "predict-rs-{}-{}-{}.json",
        name,
        std::process::id(),
        nanos
    ))
}
