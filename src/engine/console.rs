//! Agent console sync engine
//!
//! The admin-side counterpart of the widget engine. It shares the status
//! state machine and reconciliation logic but adds an agent-identity
//! gate: no join or send proceeds until an operator has picked an
//! identity from the configured roster. An action attempted without one
//! is parked and resumed automatically once an identity is selected.
//!
//! While a session is displayed the console polls on its own interval,
//! independent of and unsynchronized with the widget's, regardless of
//! status, except when the session has ended.

use crate::backend::{SessionBackend, SessionUpdate};
use crate::config::ConsoleConfig;
use crate::error::{classify, DeskwireError, ErrorClass, Result};
use crate::events::{EngineEvent, EventBus, ResetReason};
use crate::session::{
    reconcile, AgentDescriptor, ChatMessage, ChatSession, ClientMode, ReconcileOutcome,
    SessionStatus, StatusStateMachine, Transition,
};
use crate::storage::ProfileStore;

use std::sync::Arc;

/// An action parked behind the identity gate
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingAction {
    /// Join the displayed session as an agent
    Join,
    /// Send an agent message with the given text
    Send(String),
}

/// Result of a gated console action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The action ran to completion
    Completed,
    /// No identity is selected; the action is parked and will run after
    /// `select_identity`
    NeedsIdentity,
}

/// Admin-side synchronization engine
pub struct AgentConsoleSyncEngine<B: SessionBackend> {
    backend: Arc<B>,
    config: ConsoleConfig,
    events: EventBus,
    store: Option<ProfileStore>,
    identity: Option<AgentDescriptor>,
    pending: Option<PendingAction>,
    machine: StatusStateMachine,
    session_ref: Option<String>,
    session: Option<ChatSession>,
    messages: Vec<ChatMessage>,
}

impl<B: SessionBackend> AgentConsoleSyncEngine<B> {
    /// Creates an engine with no displayed session and no identity
    pub fn new(backend: Arc<B>, config: ConsoleConfig, events: EventBus) -> Self {
        Self {
            backend,
            config,
            events,
            store: None,
            identity: None,
            pending: None,
            machine: StatusStateMachine::new(),
            session_ref: None,
            session: None,
            messages: Vec::new(),
        }
    }

    /// Attach a profile store and rehydrate a previously selected
    /// identity from it
    ///
    /// A stored identity that is no longer on the roster is ignored; the
    /// operator will be prompted again.
    pub fn with_store(mut self, store: ProfileStore) -> Self {
        match store.load_agent_identity() {
            Ok(Some(identity)) => {
                if self.config.roster.contains(&identity) {
                    tracing::info!("Resuming agent identity: {}", identity.name);
                    self.identity = Some(identity);
                } else {
                    tracing::warn!(
                        "Stored agent identity {} is not on the roster, ignoring",
                        identity.name
                    );
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to load agent identity: {}", e),
        }
        self.store = Some(store);
        self
    }

    /// The selectable roster
    pub fn roster(&self) -> &[AgentDescriptor] {
        &self.config.roster
    }

    /// The currently selected identity, if any
    pub fn identity(&self) -> Option<&AgentDescriptor> {
        self.identity.as_ref()
    }

    /// Current client mode for the displayed session
    pub fn mode(&self) -> ClientMode {
        self.machine.mode()
    }

    /// Cached message list for the displayed session
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Cached session record
    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// Identifier of the displayed session
    pub fn session_id(&self) -> Option<String> {
        self.session_ref.clone()
    }

    /// Whether polling should run for the displayed session
    ///
    /// The console polls regardless of status, except when the session
    /// has reached the terminal state.
    pub fn wants_polling(&self) -> bool {
        self.session_ref.is_some() && self.mode() != ClientMode::Ended
    }

    /// Select an agent identity from the roster by display name
    ///
    /// Persists the choice and resumes any action that was parked behind
    /// the identity gate.
    ///
    /// # Errors
    ///
    /// Returns error if the name is not on the roster, or if the resumed
    /// action itself fails
    pub async fn select_identity(&mut self, name: &str) -> Result<()> {
        let identity = self
            .config
            .roster
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .cloned()
            .ok_or_else(|| {
                DeskwireError::Engine(format!("'{}' is not on the agent roster", name))
            })?;

        tracing::info!("Selected agent identity: {}", identity.name);
        if let Some(store) = &self.store {
            if let Err(e) = store.save_agent_identity(&identity) {
                tracing::warn!("Failed to persist agent identity: {}", e);
            }
        }
        self.identity = Some(identity);

        // Resume whatever the gate interrupted.
        match self.pending.take() {
            Some(PendingAction::Join) => {
                self.join().await?;
            }
            Some(PendingAction::Send(text)) => {
                self.send_as_agent(&text).await?;
            }
            None => {}
        }
        Ok(())
    }

    /// Display a session: fetch its record and messages, start from a
    /// fresh state machine
    pub async fn open_session(&mut self, id: &str) -> Result<()> {
        self.machine.reset();
        self.messages.clear();
        self.session = None;
        self.session_ref = Some(id.to_string());

        match self.backend.get_session(id).await {
            Ok(session) => {
                self.apply_session(session);
            }
            Err(err) => {
                self.clear_displayed();
                return Err(err);
            }
        }
        self.messages = self.backend.get_messages(id).await.unwrap_or_default();
        Ok(())
    }

    /// Stop displaying the current session
    pub fn close_session(&mut self) {
        self.clear_displayed();
    }

    /// Join the displayed session as the selected agent
    ///
    /// Compound operation: mark the session agent-active with the
    /// identity attached, post the synthetic join message, then re-fetch
    /// to confirm. Without an identity the join parks behind the gate.
    pub async fn join(&mut self) -> Result<ActionOutcome> {
        let Some(session_id) = self.session_id() else {
            return Err(DeskwireError::Engine("no session displayed".into()).into());
        };
        let Some(identity) = self.identity.clone() else {
            tracing::debug!("Join attempted without identity, parking");
            self.pending = Some(PendingAction::Join);
            return Ok(ActionOutcome::NeedsIdentity);
        };

        let update = SessionUpdate {
            status: Some(SessionStatus::AgentActive),
            assigned_agent: Some(identity.clone()),
        };
        let session = self.backend.update_session(&session_id, update).await?;
        if self.is_current(&session_id) {
            self.apply_session(session);
        }

        self.backend
            .send_agent_message(
                &session_id,
                &format!("{} joined the chat.", identity.name),
                &identity.name,
            )
            .await?;

        // Confirm: both the record and the message list come back from
        // the store so the console shows what every other client will.
        if self.is_current(&session_id) {
            let session = self.backend.get_session(&session_id).await?;
            if self.is_current(&session_id) {
                self.apply_session(session);
            }
            let fetched = self.backend.get_messages(&session_id).await?;
            if self.is_current(&session_id) {
                self.apply_fetched_messages(fetched);
            }
        }

        tracing::info!("{} joined session {}", identity.name, session_id);
        Ok(ActionOutcome::Completed)
    }

    /// Send a message as the selected agent
    ///
    /// Without an identity the send parks behind the gate and runs after
    /// selection.
    pub async fn send_as_agent(&mut self, text: &str) -> Result<ActionOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(ActionOutcome::Completed);
        }
        let Some(session_id) = self.session_id() else {
            return Err(DeskwireError::Engine("no session displayed".into()).into());
        };
        let Some(identity) = self.identity.clone() else {
            tracing::debug!("Agent send attempted without identity, parking");
            self.pending = Some(PendingAction::Send(text.to_string()));
            return Ok(ActionOutcome::NeedsIdentity);
        };

        let message = self
            .backend
            .send_agent_message(&session_id, text, &identity.name)
            .await?;
        if self.is_current(&session_id) {
            self.messages.push(message);
            self.events.publish(EngineEvent::MessagesUpdated);
        }
        Ok(ActionOutcome::Completed)
    }

    /// One poll cycle for the displayed session
    ///
    /// Runs regardless of status except the terminal one. Failures are
    /// swallowed after logging, except a not-found, which clears the
    /// displayed session.
    pub async fn poll_once(&mut self) -> Result<()> {
        let Some(session_id) = self.session_id() else {
            return Ok(());
        };
        if self.mode() == ClientMode::Ended {
            return Ok(());
        }

        let session = match self.backend.get_session(&session_id).await {
            Ok(session) => session,
            Err(err) => return self.poll_failure(err),
        };
        // Stale response for a session no longer displayed.
        if !self.is_current(&session_id) {
            return Ok(());
        }
        self.apply_session(session);

        let fetched = match self.backend.get_messages(&session_id).await {
            Ok(fetched) => fetched,
            Err(err) => return self.poll_failure(err),
        };
        if !self.is_current(&session_id) {
            return Ok(());
        }
        self.apply_fetched_messages(fetched);
        Ok(())
    }

    /// End the displayed conversation
    pub async fn end_session(&mut self) -> Result<()> {
        let Some(session_id) = self.session_id() else {
            return Err(DeskwireError::Engine("no session displayed".into()).into());
        };
        self.backend.end_session(&session_id).await?;
        if self.is_current(&session_id) {
            if let Ok(session) = self.backend.get_session(&session_id).await {
                if self.is_current(&session_id) {
                    self.apply_session(session);
                }
            }
        }
        Ok(())
    }

    /// Delete the displayed conversation outright
    pub async fn delete_session(&mut self) -> Result<()> {
        let Some(session_id) = self.session_id() else {
            return Err(DeskwireError::Engine("no session displayed".into()).into());
        };
        self.backend.delete_session(&session_id).await?;
        self.clear_displayed();
        Ok(())
    }

    /// All sessions, for the console overview
    pub async fn list_sessions(&self) -> Result<Vec<ChatSession>> {
        self.backend.list_sessions().await
    }

    /// Subscribe to this engine's events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn is_current(&self, session_id: &str) -> bool {
        self.session_ref.as_deref() == Some(session_id)
    }

    fn clear_displayed(&mut self) {
        self.session_ref = None;
        self.session = None;
        self.messages.clear();
        self.machine.reset();
    }

    /// Observe a session snapshot
    ///
    /// Unlike the widget, an ended session stays on screen: the mode goes
    /// terminal, polling stops, and the transcript remains visible until
    /// the operator closes it.
    fn apply_session(&mut self, session: ChatSession) -> Transition {
        let transition = self.machine.observe(&session.status);
        if transition.changed() {
            tracing::info!(
                "Console mode changed: {} -> {}",
                transition.from,
                transition.to
            );
            self.events.publish(EngineEvent::ModeChanged {
                from: transition.from,
                to: transition.to,
            });
        }
        self.session = Some(session);
        transition
    }

    fn apply_fetched_messages(&mut self, fetched: Vec<ChatMessage>) {
        let outcome = reconcile(&mut self.messages, fetched);
        if !matches!(outcome, ReconcileOutcome::Unchanged) {
            self.events.publish(EngineEvent::MessagesUpdated);
        }
    }

    fn poll_failure(&mut self, err: anyhow::Error) -> Result<()> {
        match classify(&err) {
            ErrorClass::NotFound => {
                tracing::info!("Displayed session disappeared server-side");
                self.clear_displayed();
                self.events.publish(EngineEvent::SessionReset {
                    reason: ResetReason::NotFound,
                });
            }
            _ => tracing::debug!("Console poll failed: {:#}", err),
        }
        Ok(())
    }
}
