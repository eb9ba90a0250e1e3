// pwvault - Top-level error types
//
// Aggregates errors from the keys and store modules into a single
// error enum for the application boundary.

use thiserror::Error;

use crate::keys::{CipherError, KeyError};
use crate::store::StoreError;

/// Top-level error type for all pwvault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl VaultError {
    /// Message safe to show an end user. Foreign records look missing and an
    /// unreadable secret is reported as recoverable.
    pub fn user_message(&self) -> String {
        match self {
            VaultError::Store(StoreError::NotFound(_) | StoreError::NotAuthorized(_)) => {
                "Credential not found".to_string()
            }
            VaultError::Store(StoreError::Cipher(CipherError::Decryption)) => {
                "This secret cannot currently be read. It was saved under a different \
                 encryption key; save it again to make it readable."
                    .to_string()
            }
            VaultError::Store(StoreError::Database(_)) => "Storage error".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_user_message_hides_ownership() {
        let id = Uuid::new_v4();
        let missing = VaultError::from(StoreError::NotFound(id));
        let foreign = VaultError::from(StoreError::NotAuthorized(id));
        assert_eq!(missing.user_message(), foreign.user_message());
        assert!(!foreign.user_message().contains(&id.to_string()));
    }

    #[test]
    fn test_user_message_for_decryption_is_distinct_from_not_found() {
        let undecryptable = VaultError::from(StoreError::from(CipherError::Decryption));
        let missing = VaultError::from(StoreError::NotFound(Uuid::new_v4()));
        assert_ne!(undecryptable.user_message(), missing.user_message());
        assert!(undecryptable.user_message().contains("cannot currently be read"));
    }

    #[test]
    fn test_key_errors_pass_through() {
        let err = VaultError::from(KeyError::InvalidKeyFormat("too short".to_string()));
        assert!(err.user_message().contains("too short"));
    }
}
