//! Command handlers for the Deskwire CLI
//!
//! One module per subcommand: the interactive customer widget, the
//! interactive agent console, and one-shot session management.

pub mod console;
pub mod sessions;
pub mod widget;

use crate::events::EngineEvent;
use crate::session::{ChatMessage, Sender};
use colored::Colorize;

/// Render one chat message line for the terminal
pub(crate) fn render_message(message: &ChatMessage) {
    let tag = match message.sender {
        Sender::User => "you".green(),
        Sender::Assistant => "bot".blue(),
        Sender::Agent => "agent".magenta(),
    };
    println!("{} {} {}", message.timestamp.format("%H:%M:%S"), tag, message.body);
}

/// Render an engine event as a status line
pub(crate) fn render_event(event: &EngineEvent) {
    match event {
        EngineEvent::ModeChanged { from, to } => {
            println!("{}", format!("* mode: {} -> {}", from, to).dimmed());
        }
        EngineEvent::OfflineChanged { offline: true } => {
            println!("{}", "* connection lost, answering offline".yellow());
        }
        EngineEvent::OfflineChanged { offline: false } => {
            println!("{}", "* back online".green());
        }
        EngineEvent::SessionReset { reason } => {
            println!("{}", format!("* conversation reset ({:?})", reason).dimmed());
        }
        EngineEvent::Info(text) => {
            println!("{}", format!("* {}", text).yellow());
        }
        // Message arrivals are rendered from the transcript, not here.
        EngineEvent::MessagesUpdated | EngineEvent::AgentMessage { .. } => {}
    }
}
