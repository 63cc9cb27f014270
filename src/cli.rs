//! Command-line interface definition for Deskwire
//!
//! This module defines the CLI structure using clap's derive API,
//! providing the customer widget, the agent console, and session
//! management commands.

use clap::{Parser, Subcommand};

/// Deskwire - Hybrid AI/human customer support chat client
///
/// Run the customer widget or the agent console against a shared support
/// backend. Both sides poll independently and reconcile what they see.
#[derive(Parser, Debug, Clone)]
#[command(name = "deskwire")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the local profile database path
    #[arg(long, env = "DESKWIRE_PROFILE_DB")]
    pub profile_db: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Deskwire
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the interactive customer widget
    Widget {
        /// Customer email (skips the intake prompt)
        #[arg(short, long)]
        email: Option<String>,

        /// Customer display name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Start the interactive agent console
    Console {
        /// Agent identity to select up front (must be on the roster)
        #[arg(short, long)]
        agent: Option<String>,

        /// Session id to open immediately
        #[arg(short, long)]
        session: Option<String>,
    },

    /// Manage chat sessions
    Sessions {
        /// Session management subcommand
        #[command(subcommand)]
        command: SessionCommand,
    },
}

/// Session management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SessionCommand {
    /// List all sessions
    List,

    /// End a conversation
    End {
        /// Session id
        id: String,
    },

    /// Delete a conversation and its messages
    Delete {
        /// Session id
        id: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
