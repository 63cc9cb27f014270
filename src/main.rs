//! Deskwire - Hybrid AI/human customer support chat client
//!
#![doc = "Main entry point for the Deskwire CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use deskwire::cli::{Cli, Commands, SessionCommand};
use deskwire::commands;
use deskwire::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Mirror a CLI-supplied profile path into the environment so the
    // profile store initializer picks it up without plumbing.
    if let Some(db_path) = &cli.profile_db {
        std::env::set_var("DESKWIRE_PROFILE_DB", db_path);
        tracing::info!("Using profile DB override: {}", db_path);
    }

    // Load and validate configuration
    let config = Config::load(&cli.config)?;
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Widget { email, name } => {
            tracing::info!("Starting customer widget");
            commands::widget::run_widget(config, email, name).await?;
            Ok(())
        }
        Commands::Console { agent, session } => {
            tracing::info!("Starting agent console");
            commands::console::run_console(config, agent, session).await?;
            Ok(())
        }
        Commands::Sessions { command } => match command {
            SessionCommand::List => {
                commands::sessions::run_list(config).await?;
                Ok(())
            }
            SessionCommand::End { id } => {
                commands::sessions::run_end(config, &id).await?;
                Ok(())
            }
            SessionCommand::Delete { id } => {
                commands::sessions::run_delete(config, &id).await?;
                Ok(())
            }
        },
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "deskwire=debug"
    } else {
        "deskwire=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
