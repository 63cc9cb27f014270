//! Deskwire - Hybrid AI/human customer support chat client
//!
//! This library provides the client-side core of a poll-based support
//! chat: the customer widget engine, the agent console engine, and the
//! session/message synchronization logic they share.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `session`: session/message types, status state machine, reconciliation
//! - `backend`: session store abstraction and the HTTP implementation
//! - `engine`: the widget and console sync engines, poll scheduler, and
//!   offline fallback responder
//! - `notify`: notification dispatch for agent messages
//! - `events`: publish/subscribe channel between engines and front ends
//! - `storage`: local profile persistence
//! - `config`: configuration management and validation
//! - `error`: error types, result alias, and failure classification
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use deskwire::backend::HttpBackend;
//! use deskwire::config::Config;
//! use deskwire::engine::ClientSyncEngine;
//! use deskwire::events::EventBus;
//! use deskwire::notify::{NotificationDispatcher, TerminalNotifier};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config/config.yaml")?;
//!     config.validate()?;
//!
//!     let backend = Arc::new(HttpBackend::new(&config.backend)?);
//!     let notifications = NotificationDispatcher::new(
//!         Box::new(TerminalNotifier),
//!         &config.notifications,
//!     );
//!     let mut widget = ClientSyncEngine::new(
//!         backend,
//!         config.widget.clone(),
//!         EventBus::default(),
//!         notifications,
//!     );
//!     widget.start_session("pat@example.com", Some("Pat")).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod notify;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use config::Config;
pub use engine::{AgentConsoleSyncEngine, ClientSyncEngine, PollScheduler};
pub use error::{DeskwireError, ErrorClass, Result};
pub use session::{ChatMessage, ChatSession, ClientMode, SessionStatus};

#[cfg(test)]
pub mod test_utils;
