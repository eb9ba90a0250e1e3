// pwvault - Keys Module
//
// Resolves the single encryption key used for the lifetime of the process
// and wraps it in an authenticated cipher for credential secrets.

mod cipher;
mod error;
mod provider;

pub use cipher::CredentialCipher;
pub use error::{CipherError, KeyError};
pub use provider::{
    EncryptionKey, EnvKeySource, KeyMode, KeyPolicy, KeyProvider, KeySource, ResolvedKey,
    DEFAULT_KEY_ENV, KEY_LEN,
};
