// pwvault - Credential data models
//
// A record holds plaintext metadata and an opaque ciphertext. Plaintext
// secrets never live in these types; they are only produced by
// `CredentialStore::reveal()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One saved site/account credential as persisted.
#[derive(Clone)]
pub struct CredentialRecord {
    pub id: Uuid,
    pub user_id: String,
    pub label: String,
    pub username: String,
    /// Output of `CredentialCipher::encrypt`; opaque to everything else.
    pub secret_cipher: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CredentialRecord {
    /// The listing view of this record.
    pub fn summary(&self) -> CredentialSummary {
        CredentialSummary {
            id: self.id,
            label: self.label.clone(),
            username: self.username.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Debug shows the ciphertext length only.
impl fmt::Debug for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialRecord")
            .field("id", &self.id)
            .field("user_id", &self.user_id)
            .field("label", &self.label)
            .field("username", &self.username)
            .field(
                "secret_cipher",
                &format_args!("<{} bytes>", self.secret_cipher.len()),
            )
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

impl fmt::Display for CredentialRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.id, self.label, self.username)
    }
}

/// Metadata returned by `list`. Has no secret field at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSummary {
    pub id: Uuid,
    pub label: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for CredentialSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.id, self.label, self.username)
    }
}

/// Input for `create`.
pub struct NewCredential {
    pub label: String,
    pub username: String,
    pub secret: String,
}

impl fmt::Debug for NewCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewCredential")
            .field("label", &self.label)
            .field("username", &self.username)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Input for `update`. `None` leaves the field unchanged.
#[derive(Default)]
pub struct CredentialUpdate {
    pub label: Option<String>,
    pub username: Option<String>,
    pub secret: Option<String>,
}

impl CredentialUpdate {
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.username.is_none() && self.secret.is_none()
    }
}

impl fmt::Debug for CredentialUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialUpdate")
            .field("label", &self.label)
            .field("username", &self.username)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// One row of a record's audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
    pub details: Option<String>,
}

impl fmt::Display for AuditEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} by '{}'",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.action,
            self.actor
        )?;
        if let Some(ref d) = self.details {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
