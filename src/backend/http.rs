//! HTTP implementation of the session backend
//!
//! Talks JSON to the support backend's REST surface. Wire DTOs are kept
//! separate from the domain types so field naming and the raw status
//! string stay at this boundary; [`crate::session::SessionStatus::parse`]
//! is applied exactly once, on the way in.

use crate::config::BackendConfig;
use crate::error::{DeskwireError, Result};
use crate::session::{AgentDescriptor, ChatMessage, ChatSession, SessionStatus};

use super::{SendOutcome, SessionBackend, SessionUpdate};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP session backend
///
/// # Examples
///
/// ```no_run
/// use deskwire::backend::{HttpBackend, SessionBackend};
/// use deskwire::config::BackendConfig;
///
/// # async fn example() -> deskwire::error::Result<()> {
/// let config = BackendConfig {
///     base_url: "http://localhost:4000".to_string(),
///     timeout_seconds: 30,
/// };
/// let backend = HttpBackend::new(&config)?;
/// let session = backend.create_session("pat@example.com", Some("Pat")).await?;
/// println!("created session {}", session.id);
/// # Ok(())
/// # }
/// ```
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

/// Session record as the backend serializes it
#[derive(Debug, Deserialize)]
struct WireSession {
    id: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
    status: String,
    #[serde(default)]
    assigned_agent: Option<AgentDescriptor>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<WireSession> for ChatSession {
    fn from(wire: WireSession) -> Self {
        Self {
            id: wire.id,
            customer_email: wire.email,
            customer_name: wire.name,
            status: SessionStatus::parse(&wire.status),
            assigned_agent: wire.assigned_agent,
            created_at: wire.created_at,
            updated_at: wire.updated_at,
        }
    }
}

/// Body of POST .../messages responses
#[derive(Debug, Deserialize)]
struct WireSendOutcome {
    session: WireSession,
    #[serde(default)]
    reply: Option<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct CreateSessionRequest<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct AgentMessageRequest<'a> {
    text: &'a str,
    agent_name: &'a str,
}

#[derive(Debug, Serialize)]
struct UpdateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assigned_agent: Option<AgentDescriptor>,
}

impl HttpBackend {
    /// Create a backend client from configuration
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: &BackendConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("deskwire/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DeskwireError::Backend(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized HTTP backend: base_url={}", config.base_url);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/chat/{}", self.base_url, path)
    }

    /// Map transport errors to the connectivity class
    fn transport(err: reqwest::Error) -> anyhow::Error {
        if err.is_connect() || err.is_timeout() {
            DeskwireError::Connectivity(err.to_string()).into()
        } else {
            DeskwireError::Http(err).into()
        }
    }

    /// Triage a response status into the engine-visible error classes
    async fn check(resp: Response, context: &str) -> Result<Response> {
        match resp.status() {
            status if status.is_success() => Ok(resp),
            StatusCode::NOT_FOUND => {
                Err(DeskwireError::SessionNotFound(context.to_string()).into())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DeskwireError::Authorization(
                format!("{}: {}", context, resp.status()),
            )
            .into()),
            status => {
                let body = resp.text().await.unwrap_or_default();
                Err(DeskwireError::Backend(format!(
                    "{}: unexpected status {} ({})",
                    context,
                    status,
                    body.trim()
                ))
                .into())
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .await
            .map_err(Self::transport)?;
        let resp = Self::check(resp, path).await?;
        resp.json::<T>().await.map_err(Self::transport)
    }

    async fn post_json<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(Self::transport)?;
        let resp = Self::check(resp, path).await?;
        resp.json::<T>().await.map_err(Self::transport)
    }
}

#[async_trait]
impl SessionBackend for HttpBackend {
    async fn create_session(&self, email: &str, name: Option<&str>) -> Result<ChatSession> {
        let wire: WireSession = self
            .post_json("sessions", &CreateSessionRequest { email, name })
            .await?;
        Ok(wire.into())
    }

    async fn get_session(&self, id: &str) -> Result<ChatSession> {
        let wire: WireSession = self.get_json(&format!("sessions/{}", id)).await?;
        Ok(wire.into())
    }

    async fn get_messages(&self, id: &str) -> Result<Vec<ChatMessage>> {
        self.get_json(&format!("sessions/{}/messages", id)).await
    }

    async fn send_message(&self, id: &str, text: &str) -> Result<SendOutcome> {
        let wire: WireSendOutcome = self
            .post_json(
                &format!("sessions/{}/messages", id),
                &SendMessageRequest { text },
            )
            .await?;
        Ok(SendOutcome {
            session: wire.session.into(),
            reply: wire.reply,
        })
    }

    async fn request_live_agent(&self, id: &str) -> Result<ChatSession> {
        let wire: WireSession = self
            .post_json(&format!("sessions/{}/escalate", id), &serde_json::json!({}))
            .await?;
        Ok(wire.into())
    }

    async fn send_agent_message(
        &self,
        id: &str,
        text: &str,
        agent_name: &str,
    ) -> Result<ChatMessage> {
        self.post_json(
            &format!("sessions/{}/agent-messages", id),
            &AgentMessageRequest { text, agent_name },
        )
        .await
    }

    async fn update_session(&self, id: &str, update: SessionUpdate) -> Result<ChatSession> {
        let body = UpdateSessionRequest {
            status: update.status.map(|s| s.as_str().to_string()),
            assigned_agent: update.assigned_agent,
        };
        let path = format!("sessions/{}", id);
        let resp = self
            .client
            .patch(self.url(&path))
            .json(&body)
            .send()
            .await
            .map_err(Self::transport)?;
        let resp = Self::check(resp, &path).await?;
        let wire: WireSession = resp.json().await.map_err(Self::transport)?;
        Ok(wire.into())
    }

    async fn end_session(&self, id: &str) -> Result<()> {
        let path = format!("sessions/{}/end", id);
        let resp = self
            .client
            .post(self.url(&path))
            .send()
            .await
            .map_err(Self::transport)?;
        Self::check(resp, &path).await?;
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<()> {
        let path = format!("sessions/{}", id);
        let resp = self
            .client
            .delete(self.url(&path))
            .send()
            .await
            .map_err(Self::transport)?;
        Self::check(resp, &path).await?;
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>> {
        let wires: Vec<WireSession> = self.get_json("sessions").await?;
        Ok(wires.into_iter().map(Into::into).collect())
    }
}
