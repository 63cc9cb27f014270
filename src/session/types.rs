//! Core chat session and message types
//!
//! These are the client-side views of the records the backend owns. The
//! backend is the source of truth; both sync engines hold read-through
//! cached copies of these types and reconcile them on every poll.

use crate::session::status::SessionStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a chat message
///
/// Messages come from the customer (`User`), the automated responder
/// (`Assistant`), or a human support agent (`Agent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The customer typing into the widget
    User,
    /// The automated responder
    Assistant,
    /// A human support agent
    Agent,
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
            Self::Agent => write!(f, "agent"),
        }
    }
}

/// A single chat message
///
/// Immutable once created; a session owns an ordered, append-mostly
/// sequence of these. Ordering is by timestamp ascending with ties broken
/// by arrival order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Opaque identifier (server- or client-generated)
    pub id: String,
    /// Message text
    pub body: String,
    /// Message author
    pub sender: Sender,
    /// Creation time (UTC)
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Creates a message with a fresh client-generated id and the current time
    ///
    /// Used for optimistic local appends before the backend has confirmed
    /// the message and assigned its own id.
    ///
    /// # Examples
    ///
    /// ```
    /// use deskwire::session::{ChatMessage, Sender};
    ///
    /// let msg = ChatMessage::local(Sender::User, "Hello!");
    /// assert_eq!(msg.sender, Sender::User);
    /// assert!(!msg.id.is_empty());
    /// ```
    pub fn local(sender: Sender, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            body: body.into(),
            sender,
            timestamp: Utc::now(),
        }
    }

    /// Creates a customer message
    pub fn user(body: impl Into<String>) -> Self {
        Self::local(Sender::User, body)
    }

    /// Creates an automated-responder message
    pub fn assistant(body: impl Into<String>) -> Self {
        Self::local(Sender::Assistant, body)
    }

    /// Creates a human-agent message
    pub fn agent(body: impl Into<String>) -> Self {
        Self::local(Sender::Agent, body)
    }
}

/// Descriptor for a human support agent
///
/// Used both for the assigned-agent field on a session and for the
/// console-side roster of selectable identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Display name, e.g. "Ethan Parker"
    pub name: String,
    /// Contact email
    pub email: String,
}

impl AgentDescriptor {
    /// Creates a new agent descriptor
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// A customer support chat session
///
/// One record per conversation, owned by the backend. The client holds a
/// cached copy refreshed on every poll; the `status` field feeds the
/// status state machine and is never interpreted anywhere else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Opaque session identifier
    pub id: String,
    /// Customer email from the intake form
    pub customer_email: String,
    /// Optional customer display name
    pub customer_name: Option<String>,
    /// Backend-reported session status
    pub status: SessionStatus,
    /// Assigned agent, present once an agent has joined
    pub assigned_agent: Option<AgentDescriptor>,
    /// Creation time (UTC)
    pub created_at: DateTime<Utc>,
    /// Last update time (UTC)
    pub updated_at: DateTime<Utc>,
}
