// pwvault - Vault health report
//
// Rates every credential a user owns and flags reused secrets. A record
// whose secret can't be decrypted with the active key is reported as
// unreadable; it does not abort the rest of the report. Secrets are read
// through `inspect`, so the audit trail never shows a reveal nobody made.

use std::collections::HashMap;

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::analyzer::{analyze, StrengthReport};
use crate::store::{CredentialStore, CredentialSummary, StoreError};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthStatus {
    Rated {
        strength: StrengthReport,
        /// Same secret is saved under at least one other record.
        reused: bool,
    },
    /// Saved under a different key; re-save the secret to repair it.
    Unreadable,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthEntry {
    pub credential: CredentialSummary,
    #[serde(flatten)]
    pub status: HealthStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct VaultHealth {
    pub entries: Vec<HealthEntry>,
}

impl VaultHealth {
    pub fn weak_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                matches!(&e.status, HealthStatus::Rated { strength, .. } if strength.level.needs_attention())
            })
            .count()
    }

    pub fn reused_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, HealthStatus::Rated { reused: true, .. }))
            .count()
    }

    pub fn unreadable_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, HealthStatus::Unreadable))
            .count()
    }
}

/// Build the health report for one user's vault.
pub fn assess_vault(store: &dyn CredentialStore, user_id: &str) -> Result<VaultHealth, StoreError> {
    let summaries = store.list(user_id)?;

    // Only digests of secrets are kept past each iteration
    let mut rated: Vec<(CredentialSummary, Option<(StrengthReport, [u8; 32])>)> =
        Vec::with_capacity(summaries.len());

    for summary in summaries {
        match store.inspect(user_id, &summary.id) {
            Ok(secret) => {
                let digest: [u8; 32] = Sha256::digest(secret.as_bytes()).into();
                rated.push((summary, Some((analyze(&secret), digest))));
            }
            Err(e) if e.is_undecryptable() => rated.push((summary, None)),
            // Deleted since `list`
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e),
        }
    }

    let mut uses: HashMap<[u8; 32], usize> = HashMap::new();
    for (_, outcome) in &rated {
        if let Some((_, digest)) = outcome {
            *uses.entry(*digest).or_default() += 1;
        }
    }

    let entries = rated
        .into_iter()
        .map(|(credential, outcome)| {
            let status = match outcome {
                Some((strength, digest)) => HealthStatus::Rated {
                    strength,
                    reused: uses.get(&digest).copied().unwrap_or(0) > 1,
                },
                None => HealthStatus::Unreadable,
            };
            HealthEntry { credential, status }
        })
        .collect::<Vec<_>>();

    let health = VaultHealth { entries };
    tracing::info!(
        actor = %user_id,
        total = health.entries.len(),
        weak = health.weak_count(),
        reused = health.reused_count(),
        unreadable = health.unreadable_count(),
        "Vault health assessed"
    );

    Ok(health)
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use zeroize::Zeroizing;

    use crate::keys::{CredentialCipher, EncryptionKey};
    use crate::store::{
        AuditEntry, CredentialRecord, CredentialUpdate, Database, NewCredential,
        SqliteCredentialStore,
    };

    fn add(store: &SqliteCredentialStore<'_>, label: &str, secret: &str) {
        store
            .create(
                "alice",
                NewCredential {
                    label: label.to_string(),
                    username: "alice".to_string(),
                    secret: secret.to_string(),
                },
            )
            .unwrap();
    }

    fn status_of<'h>(health: &'h VaultHealth, label: &str) -> &'h HealthStatus {
        &health
            .entries
            .iter()
            .find(|e| e.credential.label == label)
            .unwrap()
            .status
    }

    #[test]
    fn test_report_rates_and_flags_reuse() {
        let db = Database::open_in_memory().unwrap();
        let cipher = CredentialCipher::new(&EncryptionKey::generate());
        let store = SqliteCredentialStore::new(&db, &cipher);

        add(&store, "mail", "password");
        add(&store, "bank", "T7#vQ9!mZp2&Lw4$Rx8k");
        add(&store, "forum", "password");

        let health = assess_vault(&store, "alice").unwrap();

        assert_eq!(health.entries.len(), 3);
        assert_eq!(health.reused_count(), 2);
        assert_eq!(health.weak_count(), 2);
        assert_eq!(health.unreadable_count(), 0);
        assert!(matches!(
            status_of(&health, "bank"),
            HealthStatus::Rated { reused: false, .. }
        ));
    }

    #[test]
    fn test_unreadable_records_do_not_abort_report() {
        let db = Database::open_in_memory().unwrap();
        let old_cipher = CredentialCipher::new(&EncryptionKey::generate());
        add(&SqliteCredentialStore::new(&db, &old_cipher), "legacy", "old-secret");

        let cipher = CredentialCipher::new(&EncryptionKey::generate());
        let store = SqliteCredentialStore::new(&db, &cipher);
        add(&store, "fresh", "Correct-Horse-42-Battery");

        let health = assess_vault(&store, "alice").unwrap();

        assert_eq!(health.unreadable_count(), 1);
        assert!(matches!(status_of(&health, "legacy"), HealthStatus::Unreadable));
        assert!(matches!(status_of(&health, "fresh"), HealthStatus::Rated { .. }));
    }

    #[test]
    fn test_health_run_does_not_count_as_reveal() {
        let db = Database::open_in_memory().unwrap();
        let cipher = CredentialCipher::new(&EncryptionKey::generate());
        let store = SqliteCredentialStore::new(&db, &cipher);
        add(&store, "mail", "Correct-Horse-42-Battery");
        let id = store.list("alice").unwrap()[0].id;

        assess_vault(&store, "alice").unwrap();
        assess_vault(&store, "alice").unwrap();

        let actions: Vec<String> = store
            .audit_log("alice", &id)
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["created", "health_checked", "health_checked"]);
    }

    /// Lists one extra record that no longer exists, as if it were deleted
    /// between `list` and `inspect`.
    struct VanishingStore<'a> {
        inner: SqliteCredentialStore<'a>,
        vanished: CredentialSummary,
    }

    impl CredentialStore for VanishingStore<'_> {
        fn create(&self, user_id: &str, credential: NewCredential) -> Result<CredentialRecord, StoreError> {
            self.inner.create(user_id, credential)
        }
        fn get(&self, user_id: &str, id: &Uuid) -> Result<CredentialRecord, StoreError> {
            self.inner.get(user_id, id)
        }
        fn list(&self, user_id: &str) -> Result<Vec<CredentialSummary>, StoreError> {
            let mut summaries = self.inner.list(user_id)?;
            summaries.insert(0, self.vanished.clone());
            Ok(summaries)
        }
        fn reveal(&self, user_id: &str, id: &Uuid) -> Result<Zeroizing<String>, StoreError> {
            self.inner.reveal(user_id, id)
        }
        fn inspect(&self, user_id: &str, id: &Uuid) -> Result<Zeroizing<String>, StoreError> {
            self.inner.inspect(user_id, id)
        }
        fn update(
            &self,
            user_id: &str,
            id: &Uuid,
            changes: CredentialUpdate,
        ) -> Result<CredentialRecord, StoreError> {
            self.inner.update(user_id, id, changes)
        }
        fn delete(&self, user_id: &str, id: &Uuid) -> Result<(), StoreError> {
            self.inner.delete(user_id, id)
        }
        fn audit_log(&self, user_id: &str, id: &Uuid) -> Result<Vec<AuditEntry>, StoreError> {
            self.inner.audit_log(user_id, id)
        }
    }

    #[test]
    fn test_record_deleted_mid_report_is_skipped() {
        let db = Database::open_in_memory().unwrap();
        let cipher = CredentialCipher::new(&EncryptionKey::generate());
        let inner = SqliteCredentialStore::new(&db, &cipher);
        add(&inner, "gone", "password");
        add(&inner, "kept", "Correct-Horse-42-Battery");

        let vanished = inner.list("alice").unwrap()[0].clone();
        inner.delete("alice", &vanished.id).unwrap();
        let store = VanishingStore { inner, vanished };

        let health = assess_vault(&store, "alice").unwrap();

        assert_eq!(health.entries.len(), 1);
        assert_eq!(health.entries[0].credential.label, "kept");
    }

    #[test]
    fn test_report_json_has_no_secrets() {
        let db = Database::open_in_memory().unwrap();
        let cipher = CredentialCipher::new(&EncryptionKey::generate());
        let store = SqliteCredentialStore::new(&db, &cipher);
        add(&store, "mail", "Sup3r$ecretValue!");

        let json = serde_json::to_string(&assess_vault(&store, "alice").unwrap()).unwrap();
        assert!(!json.contains("Sup3r$ecretValue!"));
        assert!(json.contains("\"status\":\"rated\""));
    }
}
