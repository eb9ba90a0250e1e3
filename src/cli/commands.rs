// pwvault - CLI Command Handlers
//
// Each function handles one CLI subcommand. The key is resolved at most
// once per invocation and the resulting cipher is injected into the store.

use uuid::Uuid;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::error::VaultError;
use crate::health::{
    analyze, assess_vault, default_recommendations, generate, suggest, validate,
    GeneratorOptions, HealthStatus, PasswordRules,
};
use crate::keys::{CredentialCipher, EncryptionKey, KeyMode, ResolvedKey};
use crate::store::{
    CredentialStore, CredentialUpdate, Database, NewCredential, SqliteCredentialStore,
};

use super::Commands;

/// Execute the parsed CLI command.
pub fn execute(command: Commands, settings: &Settings) -> Result<(), VaultError> {
    match command {
        Commands::Keygen => cmd_keygen(settings),
        Commands::KeyStatus => cmd_key_status(settings),
        Commands::Add {
            label,
            username,
            secret,
            generate,
        } => cmd_add(settings, label, username, secret, generate),
        Commands::List { json } => cmd_list(settings, json),
        Commands::Show { id } => cmd_show(settings, id),
        Commands::Reveal { id } => cmd_reveal(settings, id),
        Commands::Update {
            id,
            label,
            username,
            secret,
        } => cmd_update(settings, id, label, username, secret),
        Commands::Delete { id } => cmd_delete(settings, id),
        Commands::Audit { id } => cmd_audit(settings, id),
        Commands::Check { password } => cmd_check(password),
        Commands::Generate {
            length,
            count,
            no_special,
            no_numbers,
        } => cmd_generate(length, count, !no_special, !no_numbers),
        Commands::Health { json } => cmd_health(settings, json),
    }
}

// ─── Keys ────────────────────────────────────────────────────────────────────

fn cmd_keygen(settings: &Settings) -> Result<(), VaultError> {
    let key = EncryptionKey::generate();
    println!("{}", key.encode().as_str());
    eprintln!();
    eprintln!("Store this value in ${} and keep it backed up.", settings.key_env);
    eprintln!("Secrets saved under a key cannot be read without that exact key.");
    eprintln!("Fingerprint: {}", key.fingerprint());
    Ok(())
}

fn cmd_key_status(settings: &Settings) -> Result<(), VaultError> {
    let resolved = settings.key_provider().resolve()?;

    println!("Key source:  ${}", settings.key_env);
    println!("Mode:        {}", resolved.mode());
    println!("Fingerprint: {}", resolved.key().fingerprint());
    if !resolved.mode().is_persistent() {
        println!();
        println!("WARNING: no key is configured. Anything saved now is lost on the next run.");
        println!("Generate one with `pwvault keygen` and export it as ${}.", settings.key_env);
    }

    Ok(())
}

// ─── Add ─────────────────────────────────────────────────────────────────────

fn cmd_add(
    settings: &Settings,
    label: String,
    username: String,
    secret: Option<String>,
    generate_secret: bool,
) -> Result<(), VaultError> {
    let user = settings.require_user()?;
    let (db, resolved) = open_vault(settings)?;
    let cipher = CredentialCipher::new(resolved.key());
    let store = SqliteCredentialStore::new(&db, &cipher);

    let secret = match secret {
        Some(secret) => secret,
        None if generate_secret => generate(&GeneratorOptions::default()).as_str().to_string(),
        None => return Err(VaultError::Other("Pass --secret or --generate".to_string())),
    };
    let strength = analyze(&secret);
    let shown_now = generated_secret_to_show(resolved.mode(), generate_secret, &secret)
        .map(|s| Zeroizing::new(s.to_string()));

    let record = store.create(
        user,
        NewCredential {
            label,
            username,
            secret,
        },
    )?;

    println!("✓ Credential stored");
    println!("  ID:       {}", record.id);
    println!("  Label:    {}", record.label);
    println!("  Strength: {} ({}/100)", strength.level, strength.score);
    if let Some(generated) = &shown_now {
        // Unreadable once this process exits, so this is the only chance to see it
        println!("  Password: {}", generated.as_str());
    } else if generate_secret {
        println!("  A strong password was generated; view it with `pwvault reveal {}`", record.id);
    }
    if strength.level.needs_attention() {
        for tip in &strength.feedback {
            println!("  - {}", tip);
        }
    }
    warn_if_ephemeral(&resolved);

    Ok(())
}

// ─── List ────────────────────────────────────────────────────────────────────

fn cmd_list(settings: &Settings, json: bool) -> Result<(), VaultError> {
    let user = settings.require_user()?;
    let (db, resolved) = open_vault(settings)?;
    let cipher = CredentialCipher::new(resolved.key());
    let store = SqliteCredentialStore::new(&db, &cipher);

    let summaries = store.list(user)?;

    if json {
        let out = serde_json::to_string_pretty(&summaries)
            .map_err(|e| VaultError::Other(format!("Failed to serialize: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    if summaries.is_empty() {
        println!("No credentials stored yet.");
        println!("Add one with: pwvault add --label <name> --username <user> --secret <value>");
        return Ok(());
    }

    println!("Stored credentials ({}):\n", summaries.len());
    for summary in &summaries {
        println!(
            "  {} │ {:20} │ {:24} │ {}",
            summary.id,
            summary.label,
            summary.username,
            summary.updated_at.format("%Y-%m-%d %H:%M"),
        );
    }

    Ok(())
}

// ─── Show ────────────────────────────────────────────────────────────────────

fn cmd_show(settings: &Settings, id_str: String) -> Result<(), VaultError> {
    let user = settings.require_user()?;
    let id = parse_id(&id_str)?;
    let (db, resolved) = open_vault(settings)?;
    let cipher = CredentialCipher::new(resolved.key());
    let store = SqliteCredentialStore::new(&db, &cipher);

    let record = store.get(user, &id)?;

    println!("{}", record);
    println!("  Created:    {}", record.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Updated:    {}", record.updated_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("  Ciphertext: {} bytes", record.secret_cipher.len());

    Ok(())
}

// ─── Reveal ──────────────────────────────────────────────────────────────────

fn cmd_reveal(settings: &Settings, id_str: String) -> Result<(), VaultError> {
    let user = settings.require_user()?;
    let id = parse_id(&id_str)?;
    let (db, resolved) = open_vault(settings)?;
    let cipher = CredentialCipher::new(resolved.key());
    let store = SqliteCredentialStore::new(&db, &cipher);

    let secret = store.reveal(user, &id)?;
    println!("{}", secret.as_str());

    Ok(())
}

// ─── Update ──────────────────────────────────────────────────────────────────

fn cmd_update(
    settings: &Settings,
    id_str: String,
    label: Option<String>,
    username: Option<String>,
    secret: Option<String>,
) -> Result<(), VaultError> {
    let user = settings.require_user()?;
    let id = parse_id(&id_str)?;
    let (db, resolved) = open_vault(settings)?;
    let cipher = CredentialCipher::new(resolved.key());
    let store = SqliteCredentialStore::new(&db, &cipher);

    let reencrypted = secret.is_some();
    let record = store.update(
        user,
        &id,
        CredentialUpdate {
            label,
            username,
            secret,
        },
    )?;

    println!("✓ Credential {} updated", record.id);
    if reencrypted {
        println!("  Secret re-encrypted with key {}", cipher.key_fingerprint());
        warn_if_ephemeral(&resolved);
    }

    Ok(())
}

// ─── Delete ──────────────────────────────────────────────────────────────────

fn cmd_delete(settings: &Settings, id_str: String) -> Result<(), VaultError> {
    let user = settings.require_user()?;
    let id = parse_id(&id_str)?;
    let (db, resolved) = open_vault(settings)?;
    let cipher = CredentialCipher::new(resolved.key());
    let store = SqliteCredentialStore::new(&db, &cipher);

    store.delete(user, &id)?;
    println!("✓ Credential {} deleted", id);

    Ok(())
}

// ─── Audit ───────────────────────────────────────────────────────────────────

fn cmd_audit(settings: &Settings, id_str: String) -> Result<(), VaultError> {
    let user = settings.require_user()?;
    let id = parse_id(&id_str)?;
    let (db, resolved) = open_vault(settings)?;
    let cipher = CredentialCipher::new(resolved.key());
    let store = SqliteCredentialStore::new(&db, &cipher);

    let entries = store.audit_log(user, &id)?;

    println!("Audit Log for Credential: {}", id);
    println!("{:-<80}", "");
    for entry in entries {
        println!("{}", entry);
    }
    println!("{:-<80}", "");

    Ok(())
}

// ─── Password Health ─────────────────────────────────────────────────────────

fn cmd_check(password: String) -> Result<(), VaultError> {
    let report = analyze(&password);
    let violations = validate(&password, &PasswordRules::default());

    println!("Strength:  {} ({}/100)", report.level, report.score);
    println!("Entropy:   {:.1} bits", report.entropy_bits);

    if violations.is_empty() {
        println!("Rules:     all passed");
    } else {
        println!("Rules:");
        for violation in &violations {
            println!("  ✗ {}", violation);
        }
    }

    if !report.feedback.is_empty() {
        println!("Suggestions:");
        for tip in &report.feedback {
            println!("  - {}", tip);
        }
    } else if report.level.needs_attention() {
        println!("Suggestions:");
        for tip in default_recommendations() {
            println!("  - {}", tip);
        }
    }

    Ok(())
}

fn cmd_generate(length: usize, count: u8, special: bool, numbers: bool) -> Result<(), VaultError> {
    let options = GeneratorOptions {
        length,
        special,
        numbers,
    };
    for password in suggest(&options, usize::from(count)) {
        println!("{}", password.as_str());
    }
    Ok(())
}

fn cmd_health(settings: &Settings, json: bool) -> Result<(), VaultError> {
    let user = settings.require_user()?;
    let (db, resolved) = open_vault(settings)?;
    let cipher = CredentialCipher::new(resolved.key());
    let store = SqliteCredentialStore::new(&db, &cipher);

    let health = assess_vault(&store, user)?;

    if json {
        let out = serde_json::to_string_pretty(&health)
            .map_err(|e| VaultError::Other(format!("Failed to serialize: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    println!("Vault health ({} credentials):\n", health.entries.len());
    for entry in &health.entries {
        let status = match &entry.status {
            HealthStatus::Rated { strength, reused } => format!(
                "{} ({}/100){}",
                strength.level,
                strength.score,
                if *reused { ", REUSED" } else { "" }
            ),
            HealthStatus::Unreadable => "unreadable with the active key; re-save to repair".to_string(),
        };
        println!("  {} │ {:20} │ {}", entry.credential.id, entry.credential.label, status);
    }
    println!();
    println!(
        "Weak: {}   Reused: {}   Unreadable: {}",
        health.weak_count(),
        health.reused_count(),
        health.unreadable_count()
    );

    Ok(())
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Resolve the key and open the database. Invalid or required-but-missing
/// keys stop here, before any data is touched.
fn open_vault(settings: &Settings) -> Result<(Database, ResolvedKey), VaultError> {
    let resolved = settings.key_provider().resolve()?;

    if let Some(parent) = settings.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db = Database::open(&settings.db_path)?;
    Ok((db, resolved))
}

fn parse_id(id_str: &str) -> Result<Uuid, VaultError> {
    Uuid::parse_str(id_str.trim())
        .map_err(|e| VaultError::Other(format!("Invalid credential UUID: {}", e)))
}

/// A generated password saved under an ephemeral key must be shown at once;
/// with a configured key it stays retrievable through `reveal`.
fn generated_secret_to_show(mode: KeyMode, generated: bool, secret: &str) -> Option<&str> {
    (generated && !mode.is_persistent()).then_some(secret)
}

fn warn_if_ephemeral(resolved: &ResolvedKey) {
    if resolved.mode() == KeyMode::Ephemeral {
        eprintln!();
        eprintln!("WARNING: saved with an ephemeral key. This secret will be unreadable");
        eprintln!("after this process exits. Configure a persistent key and re-save it.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::KeyPolicy;

    fn settings_with_key(dir: &tempfile::TempDir, key_env: &str) -> Settings {
        Settings {
            db_path: dir.path().join("nested").join("vault.db"),
            key_env: key_env.to_string(),
            key_policy: KeyPolicy::RequireConfigured,
            user: Some("alice".to_string()),
        }
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert!(parse_id("not-a-uuid").is_err());
        let id = Uuid::new_v4();
        assert_eq!(parse_id(&format!(" {} ", id)).unwrap(), id);
    }

    #[test]
    fn test_open_vault_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let var = "PWVAULT_TEST_CMD_OPEN_KEY";
        std::env::set_var(var, EncryptionKey::generate().encode().as_str());

        let settings = settings_with_key(&dir, var);
        let (_, resolved) = open_vault(&settings).unwrap();
        std::env::remove_var(var);

        assert!(settings.db_path.exists());
        assert_eq!(resolved.mode(), KeyMode::Configured);
    }

    #[test]
    fn test_open_vault_refuses_malformed_key_before_touching_db() {
        let dir = tempfile::tempdir().unwrap();
        let var = "PWVAULT_TEST_CMD_BAD_KEY";
        std::env::set_var(var, "dG9vLXNob3J0");

        let settings = settings_with_key(&dir, var);
        let result = open_vault(&settings);
        std::env::remove_var(var);

        let err = match result {
            Err(e) => e,
            Ok(_) => panic!("expected InvalidKeyFormat"),
        };

        assert!(matches!(err, VaultError::Key(crate::keys::KeyError::InvalidKeyFormat(_))));
        assert!(!settings.db_path.exists());
    }

    #[test]
    fn test_generated_secret_shown_only_for_ephemeral_key() {
        assert_eq!(
            generated_secret_to_show(KeyMode::Ephemeral, true, "Xy7!generated"),
            Some("Xy7!generated")
        );
        assert_eq!(generated_secret_to_show(KeyMode::Configured, true, "Xy7!generated"), None);
        assert_eq!(generated_secret_to_show(KeyMode::Ephemeral, false, "typed-by-user"), None);
    }

    #[test]
    fn test_data_commands_require_user() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings_with_key(&dir, "PWVAULT_TEST_CMD_UNUSED");
        settings.user = None;
        let err = execute(Commands::List { json: true }, &settings).unwrap_err();
        assert!(err.to_string().contains("--user"));
    }
}
