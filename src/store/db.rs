// pwvault - SQLite Database Management
//
// Opens the credential database and applies the schema. Secrets are
// encrypted per field by the cipher before they reach this layer, so the
// file itself is a plain SQLite database.

use std::time::Duration;

use rusqlite::Connection;

use super::StoreError;

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Wrapper around one SQLite connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &std::path::Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        let db = Self { conn };
        db.run_migrations()?;

        tracing::debug!(path = %path.display(), "Database opened");
        Ok(db)
    }

    /// Open an in-memory database (for testing only).
    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.run_migrations()?;
        Ok(db)
    }

    /// Get a reference to the underlying connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run schema migrations to create or update tables.
    fn run_migrations(&self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS credentials (
                id              TEXT PRIMARY KEY,
                user_id         TEXT NOT NULL,
                label           TEXT NOT NULL,
                username        TEXT NOT NULL DEFAULT '',
                secret_cipher   BLOB NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS audit_log (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                credential_id   TEXT NOT NULL,
                action          TEXT NOT NULL,
                actor           TEXT NOT NULL,
                timestamp       TEXT NOT NULL,
                details         TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_credentials_user
                ON credentials(user_id, created_at);

            CREATE INDEX IF NOT EXISTS idx_audit_credential
                ON audit_log(credential_id);
            ",
        )?;

        tracing::debug!("Database migrations completed successfully");
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(db: &Database, name: &str) -> bool {
        let count: i64 = db
            .conn()
            .query_row(
                "SELECT count(*) FROM sqlite_master WHERE type='table' AND name=?1",
                [name],
                |row| row.get(0),
            )
            .unwrap();
        count == 1
    }

    #[test]
    fn test_open_in_memory_succeeds() {
        assert!(Database::open_in_memory().is_ok());
    }

    #[test]
    fn test_schema_migration_creates_tables() {
        let db = Database::open_in_memory().unwrap();
        assert!(table_exists(&db, "credentials"), "credentials table should exist");
        assert!(table_exists(&db, "audit_log"), "audit_log table should exist");
    }

    #[test]
    fn test_schema_migration_is_idempotent() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.run_migrations().is_ok(), "Migrations should be idempotent");
    }

    #[test]
    fn test_file_database_persists_rows_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vault.db");

        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO credentials (id, user_id, label, username, secret_cipher,
                     created_at, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    rusqlite::params![
                        "test-id",
                        "user-1",
                        "GitHub",
                        "octocat",
                        vec![1u8, 2, 3],
                        "2024-01-01T00:00:00.000000Z",
                        "2024-01-01T00:00:00.000000Z"
                    ],
                )
                .unwrap();
        }

        let reopened = Database::open(&path).unwrap();
        let blob: Vec<u8> = reopened
            .conn()
            .query_row(
                "SELECT secret_cipher FROM credentials WHERE id = 'test-id'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(blob, vec![1, 2, 3]);
    }
}
