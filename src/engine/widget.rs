//! Customer widget sync engine
//!
//! Owns the widget-side view of one conversation: the session reference,
//! the cached message list, the mode state machine, the offline flag, and
//! the unread bookkeeping. The backend is polled while a human agent is
//! (or is about to be) involved; in pure automated mode nothing
//! server-pushed can arrive, so no polling runs.
//!
//! All failure handling branches on [`crate::error::ErrorClass`]:
//! not-found hard-resets local state, connectivity degrades to the
//! offline responder for automated conversations, and everything else
//! surfaces without flipping the offline flag.

use crate::backend::{SendOutcome, SessionBackend};
use crate::config::WidgetConfig;
use crate::engine::fallback;
use crate::error::{classify, DeskwireError, ErrorClass, Result};
use crate::events::{EngineEvent, EventBus, ResetReason};
use crate::notify::NotificationDispatcher;
use crate::session::{
    reconcile, ChatMessage, ChatSession, ClientMode, ReconcileOutcome, Sender, StatusStateMachine,
    Transition,
};
use crate::storage::{ProfileStore, WidgetProfile};

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Customer-side synchronization engine
///
/// One instance per widget. The interactive front end drives `send`,
/// `open_widget`, and `close_widget`; a [`super::PollScheduler`] drives
/// `poll_once` on the configured interval. All state mutation funnels
/// through this type, so the single-owner discipline makes every
/// read-modify-write atomic with respect to the poll loop.
pub struct ClientSyncEngine<B: SessionBackend> {
    backend: Arc<B>,
    config: WidgetConfig,
    events: EventBus,
    notifications: NotificationDispatcher,
    store: Option<ProfileStore>,
    machine: StatusStateMachine,
    /// The session identifier the engine is attached to. Survives even
    /// when the cached record is missing (degraded resume).
    session_ref: Option<String>,
    /// Read-through cached copy of the backend record
    session: Option<ChatSession>,
    messages: Vec<ChatMessage>,
    email: Option<String>,
    name: Option<String>,
    offline: bool,
    open: bool,
    last_read: Option<String>,
    unread: usize,
}

impl<B: SessionBackend> ClientSyncEngine<B> {
    /// Creates an engine with no attached session
    pub fn new(
        backend: Arc<B>,
        config: WidgetConfig,
        events: EventBus,
        notifications: NotificationDispatcher,
    ) -> Self {
        Self {
            backend,
            config,
            events,
            notifications,
            store: None,
            machine: StatusStateMachine::new(),
            session_ref: None,
            session: None,
            messages: Vec::new(),
            email: None,
            name: None,
            offline: false,
            open: false,
            last_read: None,
            unread: 0,
        }
    }

    /// Attach a profile store for persistence across restarts
    pub fn with_store(mut self, store: ProfileStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Current client mode
    pub fn mode(&self) -> ClientMode {
        self.machine.mode()
    }

    /// Cached message list
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Cached session record, if the last fetch succeeded
    pub fn session(&self) -> Option<&ChatSession> {
        self.session.as_ref()
    }

    /// Identifier of the attached session
    pub fn session_id(&self) -> Option<String> {
        self.session_ref.clone()
    }

    /// Current unread counter
    pub fn unread(&self) -> usize {
        self.unread
    }

    /// Newest message id the customer has seen
    pub fn last_read(&self) -> Option<&str> {
        self.last_read.as_deref()
    }

    /// Whether the client believes the backend is unreachable
    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// Whether the widget is currently open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether polling is useful in the current mode
    pub fn wants_polling(&self) -> bool {
        matches!(self.mode(), ClientMode::Waiting | ClientMode::Agent)
    }

    /// Create a fresh session from the intake form
    pub async fn start_session(&mut self, email: &str, name: Option<&str>) -> Result<()> {
        let session = self.backend.create_session(email, name).await?;
        tracing::info!("Started session {}", session.id);

        self.email = Some(email.to_string());
        self.name = name.map(String::from);
        self.machine.reset();
        self.messages.clear();
        self.unread = 0;
        self.last_read = None;
        self.set_offline(false);
        self.session_ref = Some(session.id.clone());
        self.apply_session(session);
        self.persist_profile();
        Ok(())
    }

    /// Reattach to a previously persisted session
    ///
    /// Returns `Ok(false)` when there is nothing to resume (no store, no
    /// profile, or the session is gone server-side). A connectivity
    /// failure keeps the attachment and resumes in offline mode.
    pub async fn resume(&mut self) -> Result<bool> {
        let Some(store) = &self.store else {
            return Ok(false);
        };
        let Some(profile) = store.load_widget_profile()? else {
            return Ok(false);
        };

        self.email = Some(profile.email.clone());
        self.name = profile.name.clone();
        self.last_read = profile.last_read.clone();
        self.session_ref = Some(profile.session_id.clone());

        match self.backend.get_session(&profile.session_id).await {
            Ok(session) => {
                let transition = self.apply_session(session);
                if transition.to != ClientMode::Ended {
                    if let Ok(fetched) = self.backend.get_messages(&profile.session_id).await {
                        self.messages = fetched;
                    }
                    self.unread = self.compute_unread();
                }
                Ok(true)
            }
            Err(err) => match classify(&err) {
                ErrorClass::NotFound => {
                    self.reset_local(ResetReason::NotFound);
                    Ok(false)
                }
                ErrorClass::Connectivity => {
                    self.set_offline(true);
                    Ok(true)
                }
                _ => Err(err),
            },
        }
    }

    /// One poll cycle: refresh status, then reconcile messages
    ///
    /// A no-op outside `waiting`/`agent` mode. Failures are swallowed
    /// after logging, except a not-found, which always resets local
    /// state; a poll loop must not spam the user with transient errors.
    pub async fn poll_once(&mut self) -> Result<()> {
        let Some(session_id) = self.session_id() else {
            return Ok(());
        };
        if !self.wants_polling() {
            return Ok(());
        }

        let session = match self.backend.get_session(&session_id).await {
            Ok(session) => session,
            Err(err) => return self.poll_failure(err),
        };
        // A response that raced a session change is stale; drop it.
        if !self.is_current(&session_id) {
            return Ok(());
        }
        let transition = self.apply_session(session);
        if transition.to == ClientMode::Ended {
            return Ok(());
        }

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

    /// Send a customer message
    ///
    /// The message is appended locally first (optimistic), then pushed to
    /// the backend. While offline in automated mode the answer comes from
    /// the local fallback responder instead; a conversation involving an
    /// agent never receives a canned answer under any failure.
    pub async fn send(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        let mode = self.mode();

        if self.offline && !matches!(mode, ClientMode::Agent | ClientMode::Waiting) {
            self.push_local(ChatMessage::user(text));
            sleep(Duration::from_millis(self.config.offline_reply_delay_ms)).await;
            self.push_local(ChatMessage::assistant(fallback::respond(text)));
            return Ok(());
        }

        let Some(session_id) = self.session_id() else {
            return Err(DeskwireError::Engine("no active session".into()).into());
        };
        let escalate = mode == ClientMode::Ai && !self.offline && self.is_escalation(text);

        self.push_local(ChatMessage::user(text));

        match self.backend.send_message(&session_id, text).await {
            Ok(SendOutcome { session, reply }) => {
                if !self.is_current(&session_id) {
                    return Ok(());
                }
                let transition = self.apply_session(session);
                if transition.to == ClientMode::Ended {
                    return Ok(());
                }

                if escalate {
                    // The automated reply, if one was generated, is
                    // dropped: an escalating conversation must not show a
                    // canned answer.
                    return match self.backend.request_live_agent(&session_id).await {
                        Ok(snapshot) => {
                            if self.is_current(&session_id) {
                                self.apply_session(snapshot);
                            }
                            Ok(())
                        }
                        Err(err) => self.send_failure(text, err).await,
                    };
                }

                match self.mode() {
                    ClientMode::Ai => {
                        if let Some(reply) = reply {
                            self.push_local(reply);
                        }
                    }
                    ClientMode::Agent => {
                        // One delayed re-fetch to catch an agent reply
                        // generated while our message was in flight.
                        sleep(Duration::from_millis(self.config.agent_followup_delay_ms)).await;
                        if self.is_current(&session_id) {
                            if let Ok(fetched) = self.backend.get_messages(&session_id).await {
                                if self.is_current(&session_id) {
                                    self.apply_fetched_messages(fetched);
                                }
                            }
                        }
                    }
                    _ => {}
                }
                Ok(())
            }
            Err(err) => self.send_failure(text, err).await,
        }
    }

    /// Open the widget: unread resets, last-read advances, and an offline
    /// client makes one reconnection probe
    pub async fn open_widget(&mut self) -> Result<()> {
        self.open = true;
        self.advance_last_read();
        if self.offline {
            self.reconnect().await;
        }
        Ok(())
    }

    /// Close the widget; unread accumulates from here on
    pub fn close_widget(&mut self) {
        self.open = false;
    }

    /// Subscribe to this engine's events
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    fn is_current(&self, session_id: &str) -> bool {
        self.session_ref.as_deref() == Some(session_id)
    }

    fn is_escalation(&self, text: &str) -> bool {
        let normalized = text.to_lowercase();
        self.config
            .escalation_keywords
            .iter()
            .any(|k| normalized.contains(k.as_str()))
    }

    fn push_local(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.events.publish(EngineEvent::MessagesUpdated);
    }

    fn set_offline(&mut self, offline: bool) {
        if self.offline != offline {
            if offline {
                tracing::warn!("Backend unreachable, entering offline mode");
            } else {
                tracing::info!("Back online");
            }
            self.offline = offline;
            self.events.publish(EngineEvent::OfflineChanged { offline });
        }
    }

    /// Observe a fresh session snapshot and cache it
    fn apply_session(&mut self, session: ChatSession) -> Transition {
        let transition = self.machine.observe(&session.status);
        if transition.changed() {
            tracing::info!("Mode changed: {} -> {}", transition.from, transition.to);
            self.events.publish(EngineEvent::ModeChanged {
                from: transition.from,
                to: transition.to,
            });
        }

        if transition.to == ClientMode::Ended {
            self.reset_local(ResetReason::Ended);
        } else {
            self.session_ref = Some(session.id.clone());
            self.session = Some(session);
        }
        transition
    }

    /// Merge a fetched message list and run unread/notification
    /// bookkeeping over whatever is newly visible
    fn apply_fetched_messages(&mut self, fetched: Vec<ChatMessage>) {
        let known: HashSet<String> = self.messages.iter().map(|m| m.id.clone()).collect();
        let outcome = reconcile(&mut self.messages, fetched);

        if matches!(outcome, ReconcileOutcome::Unchanged) {
            if self.open {
                self.advance_last_read();
            }
            return;
        }
        self.events.publish(EngineEvent::MessagesUpdated);

        if self.open {
            self.advance_last_read();
            return;
        }

        let fresh_agent: Vec<ChatMessage> = self
            .messages
            .iter()
            .filter(|m| m.sender == Sender::Agent && !known.contains(&m.id))
            .cloned()
            .collect();
        for message in fresh_agent {
            self.unread += 1;
            self.notifications.agent_message(&message);
            self.events.publish(EngineEvent::AgentMessage { message });
        }
    }

    fn advance_last_read(&mut self) {
        self.unread = 0;
        if let Some(last) = self.messages.last() {
            if self.last_read.as_deref() != Some(last.id.as_str()) {
                self.last_read = Some(last.id.clone());
                if let Some(store) = &self.store {
                    if let Err(e) = store.update_last_read(&last.id) {
                        tracing::warn!("Failed to persist last-read marker: {}", e);
                    }
                }
            }
        }
    }

    /// Agent messages newer than the last-read marker
    fn compute_unread(&self) -> usize {
        let start = match &self.last_read {
            Some(id) => self
                .messages
                .iter()
                .position(|m| &m.id == id)
                .map(|i| i + 1)
                .unwrap_or(0),
            None => 0,
        };
        self.messages[start..]
            .iter()
            .filter(|m| m.sender == Sender::Agent)
            .count()
    }

    fn persist_profile(&self) {
        let (Some(store), Some(session_id), Some(email)) =
            (&self.store, &self.session_ref, &self.email)
        else {
            return;
        };
        let profile = WidgetProfile {
            session_id: session_id.clone(),
            email: email.clone(),
            name: self.name.clone(),
            last_read: self.last_read.clone(),
        };
        if let Err(e) = store.save_widget_profile(&profile) {
            tracing::warn!("Failed to persist widget profile: {}", e);
        }
    }

    /// Clear all local session state
    ///
    /// `NotFound` additionally clears the customer identity and surfaces
    /// a one-time informational message, returning the UI to the intake
    /// step. `Ended` keeps the identity so a new chat starts faster.
    fn reset_local(&mut self, reason: ResetReason) {
        tracing::info!("Resetting local session state: {:?}", reason);
        self.session_ref = None;
        self.session = None;
        self.messages.clear();
        self.machine.reset();
        self.unread = 0;
        self.last_read = None;

        if let Some(store) = &self.store {
            if let Err(e) = store.clear_widget_profile() {
                tracing::warn!("Failed to clear widget profile: {}", e);
            }
        }

        if reason == ResetReason::NotFound {
            self.email = None;
            self.name = None;
            self.events.publish(EngineEvent::Info(
                "Your previous conversation is no longer available. Please start a new chat."
                    .to_string(),
            ));
        }
        self.events.publish(EngineEvent::SessionReset { reason });
    }

    fn poll_failure(&mut self, err: anyhow::Error) -> Result<()> {
        if classify(&err) == ErrorClass::NotFound {
            self.reset_local(ResetReason::NotFound);
        } else {
            // Background noise; never surfaced to the user.
            tracing::debug!("Poll failed: {:#}", err);
        }
        Ok(())
    }

    async fn send_failure(&mut self, text: &str, err: anyhow::Error) -> Result<()> {
        let class = classify(&err);

        if class == ErrorClass::NotFound {
            self.reset_local(ResetReason::NotFound);
            return Ok(());
        }
        if class == ErrorClass::Connectivity {
            self.set_offline(true);
        }

        if matches!(self.mode(), ClientMode::Agent | ClientMode::Waiting) {
            // Surface the failure; a live conversation never gets a
            // canned fallback.
            return Err(err);
        }

        match class {
            ErrorClass::Connectivity => {
                sleep(Duration::from_millis(self.config.offline_reply_delay_ms)).await;
                self.push_local(ChatMessage::assistant(fallback::respond(text)));
                Ok(())
            }
            _ => Err(err),
        }
    }

    /// One reconnection probe after the widget reopens while offline
    async fn reconnect(&mut self) {
        let probe = match self.session_id() {
            Some(id) => self.backend.get_session(&id).await,
            None => match self.email.clone() {
                Some(email) => self.backend.create_session(&email, self.name.as_deref()).await,
                None => return,
            },
        };

        match probe {
            Ok(session) => {
                tracing::info!("Reconnected to backend");
                self.set_offline(false);
                let id = session.id.clone();
                let transition = self.apply_session(session);
                if transition.to != ClientMode::Ended && self.is_current(&id) {
                    self.persist_profile();
                    if let Ok(fetched) = self.backend.get_messages(&id).await {
                        if self.is_current(&id) {
                            self.apply_fetched_messages(fetched);
                        }
                    }
                }
            }
            Err(err) => {
                if classify(&err) == ErrorClass::NotFound {
                    self.reset_local(ResetReason::NotFound);
                } else {
                    tracing::debug!("Reconnection probe failed: {:#}", err);
                }
            }
        }
    }
}
