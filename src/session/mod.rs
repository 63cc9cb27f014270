//! Session domain: types, status mapping, and message reconciliation
//!
//! Everything the sync engines know about a conversation lives here. The
//! backend owns the authoritative record; this module defines the cached
//! client view ([`ChatSession`], [`ChatMessage`]), the closed status union
//! and mode state machine ([`status`]), and the poll-merge logic
//! ([`reconcile`]).

pub mod reconcile;
pub mod status;
pub mod types;

pub use reconcile::{reconcile, ReconcileOutcome};
pub use status::{ClientMode, SessionStatus, StatusStateMachine, Transition};
pub use types::{AgentDescriptor, ChatMessage, ChatSession, Sender};
