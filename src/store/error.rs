// pwvault - Store error types

use thiserror::Error;
use uuid::Uuid;

use crate::keys::CipherError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Credential not found: {0}")]
    NotFound(Uuid),

    /// Renders exactly like `NotFound` so callers cannot probe for other
    /// users' record ids. Only the variant and the logs tell them apart.
    #[error("Credential not found: {0}")]
    NotAuthorized(Uuid),

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    /// True for both missing and foreign records.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::NotAuthorized(_))
    }

    /// True when the stored secret can't be read with the active key.
    pub fn is_undecryptable(&self) -> bool {
        matches!(self, StoreError::Cipher(CipherError::Decryption))
    }
}
