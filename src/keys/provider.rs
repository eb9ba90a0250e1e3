// pwvault - Key Provider
//
// Resolves the one encryption key the process uses for every credential
// secret, and records whether it came from configuration or was generated.
//
// Flow:
//   1. `KeySource::load()` returns the raw configured key material, if any
//   2. `KeyProvider::resolve()` decodes it (Configured) or, when absent and
//      policy allows, generates a random in-memory key (Ephemeral)
//   3. The returned `ResolvedKey` is immutable and is injected into the cipher
//
// Malformed key material is always an error. Only absence falls back.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use super::KeyError;

// ─── Constants ───────────────────────────────────────────────────────────────

/// Environment variable read by default for the encryption key.
pub const DEFAULT_KEY_ENV: &str = "ENCRYPTION_KEY";

/// Raw key length in bytes (256-bit, AES-256).
pub const KEY_LEN: usize = 32;

/// Length of the url-safe base64 encoding of `KEY_LEN` bytes, with padding.
const ENCODED_KEY_LEN: usize = 44;

/// Bytes of the SHA-256 digest shown as the key fingerprint.
const FINGERPRINT_LEN: usize = 8;

// ─── Key ─────────────────────────────────────────────────────────────────────

/// A 256-bit symmetric key. Zeroized on drop and never printed.
#[derive(Clone)]
pub struct EncryptionKey {
    bytes: Zeroizing<[u8; KEY_LEN]>,
}

impl EncryptionKey {
    /// Generate a fresh random key from the OS-seeded thread RNG.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        rand::rng().fill_bytes(&mut bytes[..]);
        Self { bytes }
    }

    /// Decode a key from its url-safe base64 form (44 chars with padding).
    pub fn from_encoded(encoded: &str) -> Result<Self, KeyError> {
        let trimmed = encoded.trim();
        if trimmed.is_empty() {
            return Err(KeyError::InvalidKeyFormat("key is empty".to_string()));
        }

        let decoded = Zeroizing::new(URL_SAFE.decode(trimmed).map_err(|e| {
            KeyError::InvalidKeyFormat(format!("not url-safe base64: {}", e))
        })?);

        if decoded.len() != KEY_LEN {
            return Err(KeyError::InvalidKeyFormat(format!(
                "decoded key is {} bytes, expected {} ({} base64 characters)",
                decoded.len(),
                KEY_LEN,
                ENCODED_KEY_LEN
            )));
        }

        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        bytes.copy_from_slice(&decoded);
        Ok(Self { bytes })
    }

    /// Encode the key for storage in configuration.
    /// The result is secret material; callers must not log it.
    pub fn encode(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(&self.bytes[..]))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }

    /// Short non-secret identifier of this key, safe for logs.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.bytes[..]);
        digest[..FINGERPRINT_LEN]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect()
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("bytes", &"[REDACTED]")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

impl PartialEq for EncryptionKey {
    fn eq(&self, other: &Self) -> bool {
        self.bytes[..] == other.bytes[..]
    }
}

impl Eq for EncryptionKey {}

// ─── Mode ────────────────────────────────────────────────────────────────────

/// Where the active key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// Loaded from configuration; data survives restarts.
    Configured,
    /// Generated in memory; data written now is unreadable after restart.
    Ephemeral,
}

impl KeyMode {
    pub fn is_persistent(self) -> bool {
        matches!(self, KeyMode::Configured)
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMode::Configured => write!(f, "configured"),
            KeyMode::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

/// Whether an absent key may be replaced by a generated one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyPolicy {
    #[default]
    AllowEphemeral,
    RequireConfigured,
}

/// The key chosen at startup together with its mode. Fixed for the process.
#[derive(Debug, Clone)]
pub struct ResolvedKey {
    key: EncryptionKey,
    mode: KeyMode,
}

impl ResolvedKey {
    pub fn key(&self) -> &EncryptionKey {
        &self.key
    }

    pub fn mode(&self) -> KeyMode {
        self.mode
    }
}

// ─── Sources ─────────────────────────────────────────────────────────────────

/// Abstraction over where configured key material lives, so tests can
/// supply keys without touching the process environment.
pub trait KeySource {
    /// Raw configured key material, or `None` when nothing is configured.
    fn load(&self) -> Result<Option<String>, KeyError>;

    /// Human-readable name of the source, used in errors and logs.
    fn describe(&self) -> String;
}

/// Reads the key from an environment variable.
pub struct EnvKeySource {
    var: String,
}

impl EnvKeySource {
    pub fn new(var: &str) -> Self {
        Self {
            var: var.to_string(),
        }
    }
}

impl KeySource for EnvKeySource {
    fn load(&self) -> Result<Option<String>, KeyError> {
        match std::env::var(&self.var) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(std::env::VarError::NotUnicode(_)) => Err(KeyError::InvalidKeyFormat(format!(
                "${} is not valid unicode",
                self.var
            ))),
        }
    }

    fn describe(&self) -> String {
        self.var.clone()
    }
}

// ─── Provider ────────────────────────────────────────────────────────────────

pub struct KeyProvider {
    source: Box<dyn KeySource>,
    policy: KeyPolicy,
}

impl KeyProvider {
    pub fn new(source: Box<dyn KeySource>, policy: KeyPolicy) -> Self {
        Self { source, policy }
    }

    /// Resolve the active key. Call once at startup and share the result.
    pub fn resolve(&self) -> Result<ResolvedKey, KeyError> {
        match self.source.load()? {
            Some(material) => {
                let material = Zeroizing::new(material);
                let key = EncryptionKey::from_encoded(&material).map_err(|e| {
                    tracing::error!(
                        source = %self.source.describe(),
                        "Configured encryption key is malformed; refusing to start"
                    );
                    e
                })?;
                tracing::info!(
                    source = %self.source.describe(),
                    key_fingerprint = %key.fingerprint(),
                    mode = %KeyMode::Configured,
                    "Encryption key loaded from configuration"
                );
                Ok(ResolvedKey {
                    key,
                    mode: KeyMode::Configured,
                })
            }
            None if self.policy == KeyPolicy::RequireConfigured => {
                Err(KeyError::MissingKey(self.source.describe()))
            }
            None => {
                let key = EncryptionKey::generate();
                tracing::warn!(
                    source = %self.source.describe(),
                    key_fingerprint = %key.fingerprint(),
                    mode = %KeyMode::Ephemeral,
                    "NO ENCRYPTION KEY CONFIGURED: using an ephemeral key. \
                     Every secret saved in this process will be unreadable after restart. \
                     Set the key variable to a persistent value before storing real data."
                );
                Ok(ResolvedKey {
                    key,
                    mode: KeyMode::Ephemeral,
                })
            }
        }
    }
}

// ─── Mock Source for Testing ─────────────────────────────────────────────────


// ─── Tests ───────────────────────────────────────────────────────────────────
