// pwvault - CLI Module
//
// Command-line interface using clap derive macros.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{default_db_path, Settings};
use crate::keys::{KeyPolicy, DEFAULT_KEY_ENV};

pub use commands::execute;

/// pwvault: encrypted credential vault with password health checks.
#[derive(Parser, Debug)]
#[command(name = "pwvault")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the credential database.
    #[arg(long, global = true, env = "PWVAULT_DB")]
    pub db: Option<PathBuf>,

    /// Environment variable that holds the url-safe base64 encryption key.
    #[arg(long, global = true, env = "PWVAULT_KEY_ENV", default_value = DEFAULT_KEY_ENV)]
    pub key_env: String,

    /// Refuse to start without a configured key instead of generating an ephemeral one.
    #[arg(long, global = true, env = "PWVAULT_REQUIRE_PERSISTENT_KEY")]
    pub require_persistent_key: bool,

    /// Authenticated user id to act as.
    #[arg(long, global = true, env = "PWVAULT_USER")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn settings(&self) -> Settings {
        Settings {
            db_path: self.db.clone().unwrap_or_else(default_db_path),
            key_env: self.key_env.clone(),
            key_policy: if self.require_persistent_key {
                KeyPolicy::RequireConfigured
            } else {
                KeyPolicy::AllowEphemeral
            },
            user: self.user.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a new random encryption key for the key variable.
    Keygen,

    /// Show whether the active key is configured or ephemeral.
    KeyStatus,

    /// Save a new credential.
    Add {
        /// Display label (e.g., "GitHub").
        #[arg(long)]
        label: String,

        /// Account username for the site.
        #[arg(long, default_value = "")]
        username: String,

        /// The password to store.
        /// For production use, prefer --generate to avoid shell history exposure.
        #[arg(long, conflicts_with = "generate", required_unless_present = "generate")]
        secret: Option<String>,

        /// Generate a strong password instead of supplying one.
        #[arg(long)]
        generate: bool,
    },

    /// List saved credentials (metadata only, no secrets).
    List {
        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show a credential's metadata without decrypting it.
    Show {
        /// The UUID of the credential.
        id: String,
    },

    /// Print the decrypted secret of a credential.
    Reveal {
        /// The UUID of the credential.
        id: String,
    },

    /// Change a credential's label, username, or secret.
    Update {
        /// The UUID of the credential.
        id: String,

        #[arg(long)]
        label: Option<String>,

        #[arg(long)]
        username: Option<String>,

        /// New secret; also repairs a secret saved under an old key.
        #[arg(long)]
        secret: Option<String>,
    },

    /// Delete a credential.
    Delete {
        /// The UUID of the credential.
        id: String,
    },

    /// View the audit log for a credential.
    Audit {
        /// The UUID of the credential.
        id: String,
    },

    /// Rate a password and check it against the password rules.
    Check {
        password: String,
    },

    /// Generate a strong random password.
    Generate {
        /// Length between 12 and 32.
        #[arg(long, default_value = "16")]
        length: usize,

        /// Number of passwords to print (1 to 10).
        #[arg(long, default_value = "1", value_parser = clap::value_parser!(u8).range(1..=10))]
        count: u8,

        #[arg(long)]
        no_special: bool,

        #[arg(long)]
        no_numbers: bool,
    },

    /// Rate every saved credential and flag reuse.
    Health {
        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_add_with_global_args() {
        let cli = Cli::try_parse_from([
            "pwvault", "--user", "alice", "--db", "/tmp/v.db", "add", "--label", "GitHub",
            "--secret", "pw",
        ])
        .unwrap();

        let settings = cli.settings();
        assert_eq!(settings.user.as_deref(), Some("alice"));
        assert_eq!(settings.db_path, PathBuf::from("/tmp/v.db"));
        assert!(matches!(
            cli.command,
            Commands::Add { ref label, ref secret, generate: false, .. }
                if label == "GitHub" && secret.as_deref() == Some("pw")
        ));
    }

    #[test]
    fn test_add_requires_secret_or_generate() {
        assert!(Cli::try_parse_from(["pwvault", "add", "--label", "x"]).is_err());
        assert!(Cli::try_parse_from(["pwvault", "add", "--label", "x", "--generate"]).is_ok());
        assert!(Cli::try_parse_from([
            "pwvault", "add", "--label", "x", "--generate", "--secret", "pw"
        ])
        .is_err());
    }

    #[test]
    fn test_parse_show() {
        let cli = Cli::try_parse_from(["pwvault", "show", "abc"]).unwrap();
        assert!(matches!(cli.command, Commands::Show { ref id } if id == "abc"));
    }

    #[test]
    fn test_generate_count_is_bounded() {
        let cli = Cli::try_parse_from(["pwvault", "generate", "--count", "5"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { count: 5, length: 16, .. }));
        assert!(Cli::try_parse_from(["pwvault", "generate", "--count", "0"]).is_err());
        assert!(Cli::try_parse_from(["pwvault", "generate", "--count", "11"]).is_err());
    }

    #[test]
    fn test_require_persistent_key_sets_policy() {
        let cli = Cli::try_parse_from(["pwvault", "--require-persistent-key", "key-status"]).unwrap();
        assert_eq!(cli.settings().key_policy, KeyPolicy::RequireConfigured);
    }
}
