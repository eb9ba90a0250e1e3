// pwvault - Runtime settings
//
// Everything the process reads from its environment, gathered once in
// `main` and passed explicitly to command handlers.

use std::path::PathBuf;

use crate::error::VaultError;
use crate::keys::{EnvKeySource, KeyPolicy, KeyProvider, DEFAULT_KEY_ENV};

/// Default directory for pwvault data files.
pub fn data_dir() -> PathBuf {
    let base = dirs_next::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("pwvault")
}

/// Default path of the credential database.
pub fn default_db_path() -> PathBuf {
    data_dir().join("pwvault.db")
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: PathBuf,
    /// Name of the environment variable holding the encryption key.
    pub key_env: String,
    pub key_policy: KeyPolicy,
    /// Authenticated user id the commands act for.
    pub user: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            key_env: DEFAULT_KEY_ENV.to_string(),
            key_policy: KeyPolicy::AllowEphemeral,
            user: None,
        }
    }
}

impl Settings {
    /// The key provider these settings describe.
    pub fn key_provider(&self) -> KeyProvider {
        KeyProvider::new(Box::new(EnvKeySource::new(&self.key_env)), self.key_policy)
    }

    pub fn require_user(&self) -> Result<&str, VaultError> {
        match self.user.as_deref().map(str::trim) {
            Some(user) if !user.is_empty() => Ok(user),
            _ => Err(VaultError::Other(
                "No user given; pass --user or set PWVAULT_USER".to_string(),
            )),
        }
    }
}
