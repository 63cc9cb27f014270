//! Shared test helpers
//!
//! An in-memory [`SessionBackend`] with scripted failures, plus a
//! recording notifier. Unit tests drive the sync engines against these
//! doubles; integration tests use a real HTTP mock server instead.

use crate::backend::{SendOutcome, SessionBackend, SessionUpdate};
use crate::error::{DeskwireError, Result};
use crate::notify::{Notification, Notifier};
use crate::session::{ChatMessage, ChatSession, Sender, SessionStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// One-shot failure kinds the memory backend can be scripted with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    /// Network unreachable
    Connectivity,
    /// Session gone server-side
    NotFound,
    /// Caller not allowed
    Authorization,
    /// Generic server failure
    Server,
}

fn fail(kind: FailKind, context: &str) -> anyhow::Error {
    match kind {
        FailKind::Connectivity => {
            DeskwireError::Connectivity(format!("{}: connection refused", context)).into()
        }
        FailKind::NotFound => DeskwireError::SessionNotFound(context.to_string()).into(),
        FailKind::Authorization => {
            DeskwireError::Authorization(format!("{}: forbidden", context)).into()
        }
        FailKind::Server => DeskwireError::Backend(format!("{}: internal error", context)).into(),
    }
}

#[derive(Default)]
struct MemoryState {
    sessions: HashMap<String, ChatSession>,
    messages: HashMap<String, Vec<ChatMessage>>,
    auto_reply: Option<String>,
    unreachable: bool,
    fail_next_send: Option<FailKind>,
    fail_next_agent_send: Option<FailKind>,
    next_id: u64,
}

impl MemoryState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// In-memory session backend with failure injection
///
/// Every mutation helper works on shared state, so a clone handed to an
/// engine and the original held by the test observe the same store.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as a connectivity error
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.lock().unwrap().unreachable = unreachable;
    }

    /// Automated reply appended to sends while the session is `active`
    pub fn set_auto_reply(&self, reply: Option<&str>) {
        self.state.lock().unwrap().auto_reply = reply.map(String::from);
    }

    /// Fail only the next `send_message` call with the given kind
    pub fn fail_next_send(&self, kind: FailKind) {
        self.state.lock().unwrap().fail_next_send = Some(kind);
    }

    /// Fail only the next `send_agent_message` call with the given kind
    pub fn fail_next_agent_send(&self, kind: FailKind) {
        self.state.lock().unwrap().fail_next_agent_send = Some(kind);
    }

    /// Create a session directly with the given status
    pub fn seed_session(&self, status: SessionStatus) -> ChatSession {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("sess");
        let now = Utc::now();
        let session = ChatSession {
            id: id.clone(),
            customer_email: "pat@example.com".to_string(),
            customer_name: Some("Pat".to_string()),
            status,
            assigned_agent: None,
            created_at: now,
            updated_at: now,
        };
        state.sessions.insert(id.clone(), session.clone());
        state.messages.insert(id, Vec::new());
        session
    }

    /// Append an agent message server-side, as the console would
    pub fn push_agent_message(&self, session_id: &str, text: &str) -> ChatMessage {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("msg");
        let message = ChatMessage {
            id,
            body: text.to_string(),
            sender: Sender::Agent,
            timestamp: Utc::now(),
        };
        state
            .messages
            .get_mut(session_id)
            .expect("unknown session")
            .push(message.clone());
        message
    }

    /// Overwrite a session's status server-side
    pub fn set_status(&self, session_id: &str, status: SessionStatus) {
        let mut state = self.state.lock().unwrap();
        let session = state.sessions.get_mut(session_id).expect("unknown session");
        session.status = status;
        session.updated_at = Utc::now();
    }

    /// Drop all messages while keeping the session record (server-side
    /// conversation reset)
    pub fn clear_messages(&self, session_id: &str) {
        self.state
            .lock()
            .unwrap()
            .messages
            .insert(session_id.to_string(), Vec::new());
    }

    /// Current server-side message list
    pub fn server_messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Current server-side session record
    pub fn server_session(&self, session_id: &str) -> Option<ChatSession> {
        self.state.lock().unwrap().sessions.get(session_id).cloned()
    }

    fn guard(&self, context: &str) -> Result<()> {
        if self.state.lock().unwrap().unreachable {
            Err(fail(FailKind::Connectivity, context))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn create_session(&self, email: &str, name: Option<&str>) -> Result<ChatSession> {
        self.guard("create_session")?;
        let mut state = self.state.lock().unwrap();
        let id = state.next_id("sess");
        let now = Utc::now();
        let session = ChatSession {
            id: id.clone(),
            customer_email: email.to_string(),
            customer_name: name.map(String::from),
            status: SessionStatus::Active,
            assigned_agent: None,
            created_at: now,
            updated_at: now,
        };
        state.sessions.insert(id.clone(), session.clone());
        state.messages.insert(id, Vec::new());
        Ok(session)
    }

    async fn get_session(&self, id: &str) -> Result<ChatSession> {
        self.guard("get_session")?;
        self.state
            .lock()
            .unwrap()
            .sessions
            .get(id)
            .cloned()
            .ok_or_else(|| fail(FailKind::NotFound, id))
    }

    async fn get_messages(&self, id: &str) -> Result<Vec<ChatMessage>> {
        self.guard("get_messages")?;
        self.state
            .lock()
            .unwrap()
            .messages
            .get(id)
            .cloned()
            .ok_or_else(|| fail(FailKind::NotFound, id))
    }

    async fn send_message(&self, id: &str, text: &str) -> Result<SendOutcome> {
        self.guard("send_message")?;
        let mut state = self.state.lock().unwrap();

        if let Some(kind) = state.fail_next_send.take() {
            return Err(fail(kind, "send_message"));
        }
        if !state.sessions.contains_key(id) {
            return Err(fail(FailKind::NotFound, id));
        }

        let msg_id = state.next_id("msg");
        let message = ChatMessage {
            id: msg_id,
            body: text.to_string(),
            sender: Sender::User,
            timestamp: Utc::now(),
        };
        state.messages.get_mut(id).unwrap().push(message);

        let status = state.sessions.get(id).unwrap().status.clone();
        let reply = if status == SessionStatus::Active {
            state.auto_reply.clone().map(|body| {
                let reply_id = state.next_id("msg");
                let reply = ChatMessage {
                    id: reply_id,
                    body,
                    sender: Sender::Assistant,
                    timestamp: Utc::now(),
                };
                state.messages.get_mut(id).unwrap().push(reply.clone());
                reply
            })
        } else {
            None
        };

        Ok(SendOutcome {
            session: state.sessions.get(id).unwrap().clone(),
            reply,
        })
    }

    async fn request_live_agent(&self, id: &str) -> Result<ChatSession> {
        self.guard("request_live_agent")?;
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| fail(FailKind::NotFound, id))?;
        session.status = SessionStatus::WaitingAgent;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn send_agent_message(
        &self,
        id: &str,
        text: &str,
        _agent_name: &str,
    ) -> Result<ChatMessage> {
        self.guard("send_agent_message")?;
        let mut state = self.state.lock().unwrap();
        if let Some(kind) = state.fail_next_agent_send.take() {
            return Err(fail(kind, "send_agent_message"));
        }
        if !state.sessions.contains_key(id) {
            return Err(fail(FailKind::NotFound, id));
        }
        let msg_id = state.next_id("msg");
        let message = ChatMessage {
            id: msg_id,
            body: text.to_string(),
            sender: Sender::Agent,
            timestamp: Utc::now(),
        };
        state.messages.get_mut(id).unwrap().push(message.clone());
        Ok(message)
    }

    async fn update_session(&self, id: &str, update: SessionUpdate) -> Result<ChatSession> {
        self.guard("update_session")?;
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| fail(FailKind::NotFound, id))?;
        if let Some(status) = update.status {
            session.status = status;
        }
        if let Some(agent) = update.assigned_agent {
            session.assigned_agent = Some(agent);
        }
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn end_session(&self, id: &str) -> Result<()> {
        self.guard("end_session")?;
        let mut state = self.state.lock().unwrap();
        let session = state
            .sessions
            .get_mut(id)
            .ok_or_else(|| fail(FailKind::NotFound, id))?;
        session.status = SessionStatus::Ended;
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        self.guard("delete_session")?;
        let mut state = self.state.lock().unwrap();
        state
            .sessions
            .remove(id)
            .ok_or_else(|| fail(FailKind::NotFound, id))?;
        state.messages.remove(id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>> {
        self.guard("list_sessions")?;
        let state = self.state.lock().unwrap();
        let mut sessions: Vec<ChatSession> = state.sessions.values().cloned().collect();
        sessions.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(sessions)
    }
}

/// Records every delivered notification for assertions
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub delivered: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        self.delivered.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
