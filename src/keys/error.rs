// pwvault - Key and cipher error types

use thiserror::Error;

/// Startup failures while resolving the active key. Both are fatal.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("Invalid encryption key format: {0}")]
    InvalidKeyFormat(String),

    #[error("No encryption key configured in ${0} and ephemeral keys are disabled")]
    MissingKey(String),
}

#[derive(Debug, Error)]
pub enum CipherError {
    /// Wrong key, tampering, or truncation. Deliberately carries no detail.
    #[error("Secret cannot be decrypted with the active encryption key")]
    Decryption,

    #[error("Encryption failed: {0}")]
    Encryption(String),
}
