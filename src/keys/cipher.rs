// pwvault - Credential Cipher
//
// AES-256-GCM encryption of individual credential secrets under the
// process key. Each output is self-contained:
//
//   [version: 1 byte][nonce: 12 bytes][ciphertext + tag: 16 bytes]
//
// The GCM tag is what turns a wrong key into a detectable failure.

use aes_gcm::{aead::Aead, Aes256Gcm, Key, KeyInit, Nonce};
use rand::RngCore;
use zeroize::Zeroizing;

use super::{CipherError, EncryptionKey};

/// Current ciphertext format version.
const FORMAT_VERSION: u8 = 1;

/// AES-GCM nonce length (96-bit).
const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
const TAG_LEN: usize = 16;

/// Authenticated cipher bound to one encryption key.
#[derive(Clone)]
pub struct CredentialCipher {
    cipher: Aes256Gcm,
    fingerprint: String,
}

impl CredentialCipher {
    pub fn new(key: &EncryptionKey) -> Self {
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        Self {
            cipher,
            fingerprint: key.fingerprint(),
        }
    }

    /// Fingerprint of the key this cipher was built from.
    pub fn key_fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Encrypt a secret. A fresh random nonce is drawn on every call, so
    /// encrypting the same plaintext twice yields different bytes.
    pub fn encrypt(&self, plaintext: &str) -> Result<Vec<u8>, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut output = Vec::with_capacity(1 + NONCE_LEN + ciphertext.len());
        output.push(FORMAT_VERSION);
        output.extend_from_slice(&nonce_bytes);
        output.extend_from_slice(&ciphertext);
        Ok(output)
    }

    /// Decrypt a blob produced by `encrypt`.
    ///
    /// Every failure, whether a key mismatch, tampering, truncation, or an
    /// unknown format, is reported as `CipherError::Decryption`.
    pub fn decrypt(&self, blob: &[u8]) -> Result<Zeroizing<String>, CipherError> {
        if blob.len() < 1 + NONCE_LEN + TAG_LEN || blob[0] != FORMAT_VERSION {
            return Err(CipherError::Decryption);
        }

        let nonce = Nonce::from_slice(&blob[1..1 + NONCE_LEN]);
        let plaintext = Zeroizing::new(
            self.cipher
                .decrypt(nonce, &blob[1 + NONCE_LEN..])
                .map_err(|_| CipherError::Decryption)?,
        );

        let text = std::str::from_utf8(&plaintext).map_err(|_| CipherError::Decryption)?;
        Ok(Zeroizing::new(text.to_string()))
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher")
            .field("key_fingerprint", &self.fingerprint)
            .finish()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
