// pwvault - Store Module
//
// Per-user credential storage in SQLite. Secrets are encrypted with the
// process cipher before they are written and every access is audit-logged.

mod db;
mod error;
mod models;
mod repository;

pub use db::Database;
pub use error::StoreError;
pub use models::{AuditEntry, CredentialRecord, CredentialSummary, CredentialUpdate, NewCredential};
pub use repository::{CredentialStore, SqliteCredentialStore};
