// pwvault - Application Entry Point
//
// Parses CLI arguments, initializes structured logging (with a filter that
// never emits secret values), and dispatches to the command handler.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pwvault::cli::{execute, Cli};

fn main() {
    // Initialize tracing with env filter (RUST_LOG=pwvault=debug for verbose output).
    // Logs go to stderr so revealed secrets on stdout can be piped cleanly.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pwvault=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();

    if let Err(e) = execute(cli.command, &settings) {
        tracing::debug!(error = %e, "Command failed");
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}
