//! BestDeal CLI - Session store migrations and maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Create the session table
//! bestdeal-cli migrate sessions
//!
//! # Session counts
//! bestdeal-cli sessions stats
//!
//! # Delete expired sessions (run from cron)
//! bestdeal-cli sessions purge-expired
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bestdeal-cli")]
#[command(author, version, about = "BestDeal storefront CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Maintain the session store
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Create the session store table
    Sessions,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Show stored and expired session counts
    Stats,
    /// Delete expired sessions
    PurgeExpired,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Sessions => commands::migrate::sessions().await?,
        },
        Commands::Sessions { action } => match action {
            SessionAction::Stats => commands::sessions::stats().await?,
            SessionAction::PurgeExpired => commands::sessions::purge_expired().await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_purge_expired() {
        let cli = Cli::try_parse_from(["bestdeal-cli", "sessions", "purge-expired"]);
        assert!(matches!(
            cli.map(|cli| cli.command),
            Ok(Commands::Sessions {
                action: SessionAction::PurgeExpired
            })
        ));
    }
}
