// pwvault - Library root
//
// Re-exports the keys, store, health, config, and CLI modules.

pub mod cli;
pub mod config;
pub mod error;
pub mod health;
pub mod keys;
pub mod store;

pub use error::VaultError;
