// pwvault - Credential Store Repository
//
// CRUD over the credential table, scoped to one owning user per call.
// `list()` never touches ciphertext; the plaintext secret is produced only
// by `reveal()` and `inspect()`, which decrypt with the process cipher and
// write an audit entry. Ownership failures are split into NotFound / NotAuthorized for logs
// and audit, but both render the same message.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, OptionalExtension, Transaction, TransactionBehavior};
use uuid::Uuid;
use zeroize::Zeroizing;

use super::db::Database;
use super::models::{AuditEntry, CredentialRecord, CredentialSummary, CredentialUpdate, NewCredential};
use super::StoreError;
use crate::keys::CredentialCipher;

const RECORD_COLUMNS: &str =
    "id, user_id, label, username, secret_cipher, created_at, updated_at";

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over credential storage operations. `user_id` is supplied
/// by the authentication layer and trusted as-is.
pub trait CredentialStore {
    /// Encrypt and store a new credential. The returned record carries only
    /// ciphertext.
    fn create(&self, user_id: &str, credential: NewCredential)
        -> Result<CredentialRecord, StoreError>;

    /// Fetch one record (ciphertext only) owned by `user_id`.
    fn get(&self, user_id: &str, id: &Uuid) -> Result<CredentialRecord, StoreError>;

    /// List the user's credentials in creation order (metadata only, no secrets).
    fn list(&self, user_id: &str) -> Result<Vec<CredentialSummary>, StoreError>;

    /// Decrypt and return the secret. Writes an audit log entry.
    fn reveal(&self, user_id: &str, id: &Uuid) -> Result<Zeroizing<String>, StoreError>;

    /// Decrypt the secret for automated analysis. Audited as
    /// `health_checked`, never as `secret_revealed`, since nobody saw it.
    fn inspect(&self, user_id: &str, id: &Uuid) -> Result<Zeroizing<String>, StoreError>;

    /// Change any of label, username, secret. A new secret is encrypted with
    /// the current key, which is also how an unreadable record is repaired.
    fn update(
        &self,
        user_id: &str,
        id: &Uuid,
        changes: CredentialUpdate,
    ) -> Result<CredentialRecord, StoreError>;

    /// Delete a credential. Fails with `NotFound` if it does not exist.
    fn delete(&self, user_id: &str, id: &Uuid) -> Result<(), StoreError>;

    /// Retrieve the audit trail for a credential the user owns.
    fn audit_log(&self, user_id: &str, id: &Uuid) -> Result<Vec<AuditEntry>, StoreError>;
}

// ─── SQLite Implementation ──────────────────────────────────────────────────

pub struct SqliteCredentialStore<'a> {
    db: &'a Database,
    cipher: &'a CredentialCipher,
}

impl<'a> SqliteCredentialStore<'a> {
    pub fn new(db: &'a Database, cipher: &'a CredentialCipher) -> Self {
        Self { db, cipher }
    }

    /// Parse a credential row selected with `RECORD_COLUMNS`.
    fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<CredentialRecord> {
        let id_str: String = row.get(0)?;
        let created_at_str: String = row.get(5)?;
        let updated_at_str: String = row.get(6)?;

        let id = Uuid::parse_str(&id_str).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(CredentialRecord {
            id,
            user_id: row.get(1)?,
            label: row.get(2)?,
            username: row.get(3)?,
            secret_cipher: row.get(4)?,
            created_at: parse_time(5, &created_at_str)?,
            updated_at: parse_time(6, &updated_at_str)?,
        })
    }

    /// Fetch a record only if `user_id` owns it; otherwise classify the miss.
    fn fetch_owned(
        &self,
        user_id: &str,
        id: &Uuid,
        action: &str,
    ) -> Result<CredentialRecord, StoreError> {
        let record = self
            .db
            .conn()
            .query_row(
                &format!(
                    "SELECT {} FROM credentials WHERE id = ?1 AND user_id = ?2",
                    RECORD_COLUMNS
                ),
                params![id.to_string(), user_id],
                Self::row_to_record,
            )
            .optional()?;

        match record {
            Some(record) => Ok(record),
            None => Err(self.deny(user_id, id, action)),
        }
    }

    /// Decide whether a miss is NotFound or NotAuthorized. The distinction
    /// is recorded in logs and the audit trail, never in the message.
    fn deny(&self, user_id: &str, id: &Uuid, action: &str) -> StoreError {
        let owner: Option<String> = match self
            .db
            .conn()
            .query_row(
                "SELECT user_id FROM credentials WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()
        {
            Ok(owner) => owner,
            Err(e) => return StoreError::Database(e),
        };

        match owner {
            None => {
                tracing::debug!(credential_id = %id, actor = %user_id, action, "Credential not found");
                StoreError::NotFound(*id)
            }
            Some(_) => {
                tracing::warn!(
                    credential_id = %id,
                    actor = %user_id,
                    action,
                    "Access denied: credential belongs to another user"
                );
                if let Err(e) = self.log_access(id, "access_denied", user_id, Some(action)) {
                    return e;
                }
                StoreError::NotAuthorized(*id)
            }
        }
    }

    /// Decrypt an owned record's secret, auditing success as `audit_action`.
    /// Never retries and never tries another key.
    fn open_secret(
        &self,
        user_id: &str,
        id: &Uuid,
        action: &str,
        audit_action: &str,
    ) -> Result<Zeroizing<String>, StoreError> {
        let record = self.fetch_owned(user_id, id, action)?;

        match self.cipher.decrypt(&record.secret_cipher) {
            Ok(secret) => {
                self.log_access(id, audit_action, user_id, None)?;
                Ok(secret)
            }
            Err(e) => {
                tracing::warn!(
                    credential_id = %id,
                    actor = %user_id,
                    action,
                    key_fingerprint = %self.cipher.key_fingerprint(),
                    "Stored secret cannot be decrypted with the active key; re-save it to repair"
                );
                self.log_access(
                    id,
                    "decrypt_failed",
                    user_id,
                    Some(&format!("active key {}", self.cipher.key_fingerprint())),
                )?;
                Err(e.into())
            }
        }
    }

    /// Write an entry to the audit log.
    fn log_access(
        &self,
        credential_id: &Uuid,
        action: &str,
        actor: &str,
        details: Option<&str>,
    ) -> Result<(), StoreError> {
        self.db.conn().execute(
            "INSERT INTO audit_log (credential_id, action, actor, timestamp, details)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                credential_id.to_string(),
                action,
                actor,
                db_time(&Utc::now()),
                details,
            ],
        )?;

        tracing::debug!(
            credential_id = %credential_id,
            action = %action,
            actor = %actor,
            "Audit log entry recorded"
        );

        Ok(())
    }
}

impl<'a> CredentialStore for SqliteCredentialStore<'a> {
    fn create(
        &self,
        user_id: &str,
        credential: NewCredential,
    ) -> Result<CredentialRecord, StoreError> {
        let label = validate_label(&credential.label)?;
        validate_secret(&credential.secret)?;

        let secret = Zeroizing::new(credential.secret);
        let secret_cipher = self.cipher.encrypt(&secret)?;
        let now = Utc::now().trunc_subsecs(6);

        let record = CredentialRecord {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            label,
            username: credential.username,
            secret_cipher,
            created_at: now,
            updated_at: now,
        };

        self.db.conn().execute(
            "INSERT INTO credentials
                (id, user_id, label, username, secret_cipher, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                record.user_id,
                record.label,
                record.username,
                record.secret_cipher,
                db_time(&record.created_at),
                db_time(&record.updated_at),
            ],
        )?;

        self.log_access(&record.id, "created", user_id, None)?;

        tracing::info!(
            credential_id = %record.id,
            actor = %user_id,
            key_fingerprint = %self.cipher.key_fingerprint(),
            "Credential stored"
        );

        Ok(record)
    }

    fn get(&self, user_id: &str, id: &Uuid) -> Result<CredentialRecord, StoreError> {
        self.fetch_owned(user_id, id, "get")
    }

    fn list(&self, user_id: &str) -> Result<Vec<CredentialSummary>, StoreError> {
        let mut stmt = self.db.conn().prepare(
            "SELECT id, label, username, created_at, updated_at
             FROM credentials WHERE user_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map(params![user_id], |row| {
            let id_str: String = row.get(0)?;
            let created_at_str: String = row.get(3)?;
            let updated_at_str: String = row.get(4)?;

            let id = Uuid::parse_str(&id_str).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;

            Ok(CredentialSummary {
                id,
                label: row.get(1)?,
                username: row.get(2)?,
                created_at: parse_time(3, &created_at_str)?,
                updated_at: parse_time(4, &updated_at_str)?,
            })
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(row?);
        }

        Ok(summaries)
    }

    fn reveal(&self, user_id: &str, id: &Uuid) -> Result<Zeroizing<String>, StoreError> {
        self.open_secret(user_id, id, "reveal", "secret_revealed")
    }

    fn inspect(&self, user_id: &str, id: &Uuid) -> Result<Zeroizing<String>, StoreError> {
        self.open_secret(user_id, id, "inspect", "health_checked")
    }

    fn update(
        &self,
        user_id: &str,
        id: &Uuid,
        changes: CredentialUpdate,
    ) -> Result<CredentialRecord, StoreError> {
        if changes.is_empty() {
            return Err(StoreError::InvalidInput("no fields to update".to_string()));
        }

        let label = changes.label.as_deref().map(validate_label).transpose()?;
        let secret_cipher = match changes.secret {
            Some(secret) => {
                let secret = Zeroizing::new(secret);
                validate_secret(&secret)?;
                Some(self.cipher.encrypt(&secret)?)
            }
            None => None,
        };
        let reencrypted = secret_cipher.is_some();
        let now = Utc::now().trunc_subsecs(6);

        // IMMEDIATE takes the write lock up front so concurrent writers queue
        // on the busy timeout instead of failing on a lock upgrade.
        let tx = Transaction::new_unchecked(self.db.conn(), TransactionBehavior::Immediate)?;

        let affected = tx.execute(
            "UPDATE credentials SET
                label = COALESCE(?1, label),
                username = COALESCE(?2, username),
                secret_cipher = COALESCE(?3, secret_cipher),
                updated_at = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![
                label,
                changes.username,
                secret_cipher,
                db_time(&now),
                id.to_string(),
                user_id,
            ],
        )?;

        if affected == 0 {
            tx.rollback()?;
            return Err(self.deny(user_id, id, "update"));
        }

        let record = tx.query_row(
            &format!("SELECT {} FROM credentials WHERE id = ?1", RECORD_COLUMNS),
            params![id.to_string()],
            Self::row_to_record,
        )?;
        tx.commit()?;

        let details = reencrypted.then(|| format!("re-encrypted with key {}", self.cipher.key_fingerprint()));
        self.log_access(id, "updated", user_id, details.as_deref())?;

        tracing::info!(credential_id = %id, actor = %user_id, reencrypted, "Credential updated");

        Ok(record)
    }

    fn delete(&self, user_id: &str, id: &Uuid) -> Result<(), StoreError> {
        let affected = self.db.conn().execute(
            "DELETE FROM credentials WHERE id = ?1 AND user_id = ?2",
            params![id.to_string(), user_id],
        )?;

        if affected == 0 {
            return Err(self.deny(user_id, id, "delete"));
        }

        // The audit log has no FK, so history survives the row.
        self.log_access(id, "deleted", user_id, None)?;
        tracing::info!(credential_id = %id, actor = %user_id, "Credential deleted");

        Ok(())
    }

    fn audit_log(&self, user_id: &str, id: &Uuid) -> Result<Vec<AuditEntry>, StoreError> {
        self.fetch_owned(user_id, id, "audit")?;

        let mut stmt = self.db.conn().prepare(
            "SELECT action, actor, timestamp, details FROM audit_log
             WHERE credential_id = ?1 ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![id.to_string()], |row| {
            let timestamp_str: String = row.get(2)?;
            Ok(AuditEntry {
                action: row.get(0)?,
                actor: row.get(1)?,
                timestamp: parse_time(2, &timestamp_str)?,
                details: row.get(3)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn db_time(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_time(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn validate_label(label: &str) -> Result<String, StoreError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(StoreError::InvalidInput("label must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn validate_secret(secret: &str) -> Result<(), StoreError> {
    if secret.is_empty() {
        return Err(StoreError::InvalidInput("secret must not be empty".to_string()));
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
