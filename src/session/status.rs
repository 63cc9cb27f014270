//! Session status mapping and the client mode state machine
//!
//! The backend reports a session status as a string. This module is the
//! single place those raw strings are interpreted: [`SessionStatus`] is the
//! closed union over the known statuses, and [`StatusStateMachine`] maps a
//! stream of observed statuses to the client-facing [`ClientMode`] while
//! protecting against spurious downgrades from stale poll responses.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend-reported session status
///
/// Parsed from the raw status string once, at the wire boundary. Anything
/// the client does not recognize is carried in `Unrecognized` so it can be
/// logged and treated conservatively instead of being dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SessionStatus {
    /// Automated-response conversation, no escalation requested
    Active,
    /// Escalation requested, no agent joined yet
    WaitingAgent,
    /// An agent has been assigned but is not yet active
    AgentAssigned,
    /// An agent is actively handling the conversation
    AgentActive,
    /// Conversation is over
    Ended,
    /// Anything the client does not recognize
    Unrecognized(String),
}

impl SessionStatus {
    /// Parse a raw backend status string
    ///
    /// # Examples
    ///
    /// ```
    /// use deskwire::session::SessionStatus;
    ///
    /// assert_eq!(SessionStatus::parse("waiting_agent"), SessionStatus::WaitingAgent);
    /// assert!(matches!(
    ///     SessionStatus::parse("archived"),
    ///     SessionStatus::Unrecognized(_)
    /// ));
    /// ```
    pub fn parse(raw: &str) -> Self {
        match raw {
            "active" => Self::Active,
            "waiting_agent" => Self::WaitingAgent,
            "agent_assigned" => Self::AgentAssigned,
            "agent_active" => Self::AgentActive,
            "ended" => Self::Ended,
            other => Self::Unrecognized(other.to_string()),
        }
    }

    /// The wire representation of this status
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::WaitingAgent => "waiting_agent",
            Self::AgentAssigned => "agent_assigned",
            Self::AgentActive => "agent_active",
            Self::Ended => "ended",
            Self::Unrecognized(raw) => raw,
        }
    }
}

impl From<String> for SessionStatus {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<SessionStatus> for String {
    fn from(status: SessionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client-derived, UI-facing simplification of the session status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMode {
    /// The automated assistant answers directly
    Ai,
    /// Escalation requested, waiting for an agent
    Waiting,
    /// A human agent is active
    Agent,
    /// Terminal; the session and its UI are reset
    Ended,
}

impl fmt::Display for ClientMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ai => write!(f, "ai"),
            Self::Waiting => write!(f, "waiting"),
            Self::Agent => write!(f, "agent"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// A single observed mode transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Mode before the observation
    pub from: ClientMode,
    /// Mode after the observation
    pub to: ClientMode,
}

impl Transition {
    /// Whether the observation changed the mode
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Maps observed backend statuses to the client mode
///
/// The machine starts in `ai` and applies one rule per observation:
///
/// - `agent_assigned` and `agent_active` move to `agent` (the two are
///   deliberately not distinguished client-side)
/// - `waiting_agent` moves to `waiting`
/// - `ended` moves to `ended`
/// - `active` and unrecognized statuses move to `ai` ONLY from `ai` or
///   `ended`; observed from `agent` or `waiting` they are ignored
///
/// The guard in the last rule is the load-bearing invariant: the backend
/// may report a stale or ambiguous `active` while an agent is mid-handoff,
/// and an out-of-order poll response must never visibly downgrade a live
/// agent conversation. Mode moves from `ai`/`waiting` toward `agent`, or
/// toward `ended`; it never silently returns from `agent` to `ai`.
#[derive(Debug, Clone)]
pub struct StatusStateMachine {
    mode: ClientMode,
}

impl StatusStateMachine {
    /// Creates a machine in the initial `ai` mode
    ///
    /// # Examples
    ///
    /// ```
    /// use deskwire::session::{ClientMode, StatusStateMachine};
    ///
    /// let machine = StatusStateMachine::new();
    /// assert_eq!(machine.mode(), ClientMode::Ai);
    /// ```
    pub fn new() -> Self {
        Self {
            mode: ClientMode::Ai,
        }
    }

    /// The current client mode
    pub fn mode(&self) -> ClientMode {
        self.mode
    }

    /// Apply one observed backend status and return the transition
    ///
    /// # Examples
    ///
    /// ```
    /// use deskwire::session::{ClientMode, SessionStatus, StatusStateMachine};
    ///
    /// let mut machine = StatusStateMachine::new();
    /// let t = machine.observe(&SessionStatus::AgentActive);
    /// assert!(t.changed());
    /// assert_eq!(machine.mode(), ClientMode::Agent);
    ///
    /// // A stale `active` no longer downgrades the live conversation.
    /// let t = machine.observe(&SessionStatus::Active);
    /// assert!(!t.changed());
    /// ```
    pub fn observe(&mut self, status: &SessionStatus) -> Transition {
        let from = self.mode;
        let to = match status {
            SessionStatus::AgentAssigned | SessionStatus::AgentActive => ClientMode::Agent,
            SessionStatus::WaitingAgent => ClientMode::Waiting,
            SessionStatus::Ended => ClientMode::Ended,
            SessionStatus::Active | SessionStatus::Unrecognized(_) => {
                if matches!(from, ClientMode::Agent | ClientMode::Waiting) {
                    from
                } else {
                    ClientMode::Ai
                }
            }
        };

        if let SessionStatus::Unrecognized(raw) = status {
            tracing::warn!("Ignoring unrecognized session status: {}", raw);
        }

        self.mode = to;
        Transition { from, to }
    }

    /// Return to the `ai` baseline for a new session
    pub fn reset(&mut self) {
        self.mode = ClientMode::Ai;
    }
}

impl Default for StatusStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
