//! One-shot session management commands

use crate::backend::{HttpBackend, SessionBackend};
use crate::config::Config;
use crate::error::Result;
use crate::session::ChatSession;

use colored::Colorize;
use prettytable::{row, Table};

/// List all sessions in a table
pub async fn run_list(config: Config) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;
    let sessions = backend.list_sessions().await?;

    if sessions.is_empty() {
        println!("No sessions.");
        return Ok(());
    }
    print_sessions(&sessions);
    Ok(())
}

/// End a conversation by id
pub async fn run_end(config: Config, id: &str) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;
    backend.end_session(id).await?;
    println!("Ended session {}", id.green());
    Ok(())
}

/// Delete a conversation and its messages by id
pub async fn run_delete(config: Config, id: &str) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;
    backend.delete_session(id).await?;
    println!("Deleted session {}", id.green());
    Ok(())
}

/// Render a session table
pub(crate) fn print_sessions(sessions: &[ChatSession]) {
    let mut table = Table::new();
    table.add_row(row!["ID", "CUSTOMER", "STATUS", "AGENT", "UPDATED"]);

    for session in sessions {
        table.add_row(row![
            session.id,
            session
                .customer_name
                .as_deref()
                .unwrap_or(&session.customer_email),
            session.status,
            session
                .assigned_agent
                .as_ref()
                .map(|a| a.name.as_str())
                .unwrap_or("-"),
            session.updated_at.format("%Y-%m-%d %H:%M:%S"),
        ]);
    }

    table.printstd();
}
