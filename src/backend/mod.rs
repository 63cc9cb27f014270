//! Backend abstraction for the session store
//!
//! The backend is the only place "true" state lives. Both sync engines
//! consume it exclusively through the [`SessionBackend`] trait so the
//! engines can be exercised against an in-memory double while the binary
//! wires in the HTTP implementation.

use crate::error::Result;
use crate::session::{AgentDescriptor, ChatMessage, ChatSession, SessionStatus};
use async_trait::async_trait;

pub mod http;

pub use http::HttpBackend;

/// Result of sending a customer message
///
/// The backend returns a fresh session snapshot with every send (its
/// status may have changed underneath the client) and, while the session
/// is in automated mode, an optional immediate automated reply.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    /// Post-send session snapshot
    pub session: ChatSession,
    /// Automated reply generated for this message, if any
    pub reply: Option<ChatMessage>,
}

/// Partial session update for agent-side operations
///
/// Only the provided fields change; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct SessionUpdate {
    /// New session status
    pub status: Option<SessionStatus>,
    /// New assigned agent
    pub assigned_agent: Option<AgentDescriptor>,
}

/// Operations the session store exposes to its clients
///
/// Shape only; the transport lives in the implementations. All methods
/// return errors classifiable by [`crate::error::classify`] so the engines
/// can apply their degradation policy uniformly.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Create a new chat session from the intake form
    async fn create_session(&self, email: &str, name: Option<&str>) -> Result<ChatSession>;

    /// Fetch the current session record (status, assigned agent)
    async fn get_session(&self, id: &str) -> Result<ChatSession>;

    /// Fetch the ordered message list for a session
    async fn get_messages(&self, id: &str) -> Result<Vec<ChatMessage>>;

    /// Send a customer message; returns a session snapshot and an optional
    /// immediate automated reply
    async fn send_message(&self, id: &str, text: &str) -> Result<SendOutcome>;

    /// Request a live human agent; moves the session to waiting
    async fn request_live_agent(&self, id: &str) -> Result<ChatSession>;

    /// Post a message authored by a human agent
    async fn send_agent_message(
        &self,
        id: &str,
        text: &str,
        agent_name: &str,
    ) -> Result<ChatMessage>;

    /// Apply a partial update to the session record
    async fn update_session(&self, id: &str, update: SessionUpdate) -> Result<ChatSession>;

    /// End the conversation
    async fn end_session(&self, id: &str) -> Result<()>;

    /// Delete the conversation and its messages
    async fn delete_session(&self, id: &str) -> Result<()>;

    /// List all sessions (console overview)
    async fn list_sessions(&self) -> Result<Vec<ChatSession>>;
}
