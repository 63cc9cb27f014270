//! Configuration management for Deskwire
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files and environment variables.

use crate::error::{DeskwireError, Result};
use crate::session::AgentDescriptor;
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure for Deskwire
///
/// Holds everything both front ends need: where the backend lives, how
/// each side polls, and how notifications behave.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend connection settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Customer widget settings
    #[serde(default)]
    pub widget: WidgetConfig,

    /// Agent console settings
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Notification settings
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// Backend connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the support backend
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Customer widget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetConfig {
    /// Poll interval while waiting for or talking to an agent (ms)
    #[serde(default = "default_widget_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Delay before the one-shot re-fetch after a send in agent mode (ms)
    #[serde(default = "default_agent_followup_delay_ms")]
    pub agent_followup_delay_ms: u64,

    /// Delay before an offline fallback reply is appended (ms)
    #[serde(default = "default_offline_reply_delay_ms")]
    pub offline_reply_delay_ms: u64,

    /// Phrases that automatically trigger a live-agent escalation
    #[serde(default = "default_escalation_keywords")]
    pub escalation_keywords: Vec<String>,
}

fn default_widget_poll_interval_ms() -> u64 {
    5000
}

fn default_agent_followup_delay_ms() -> u64 {
    1500
}

fn default_offline_reply_delay_ms() -> u64 {
    600
}

fn default_escalation_keywords() -> Vec<String> {
    [
        "live agent",
        "talk to agent",
        "talk to a human",
        "customer service",
        "real person",
        "speak to an agent",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_widget_poll_interval_ms(),
            agent_followup_delay_ms: default_agent_followup_delay_ms(),
            offline_reply_delay_ms: default_offline_reply_delay_ms(),
            escalation_keywords: default_escalation_keywords(),
        }
    }
}

/// Agent console configuration
///
/// The console polls on its own interval, deliberately unsynchronized
/// with the widget's, and carries the fixed roster of agent identities an
/// operator may select from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Poll interval while a session is displayed (ms)
    #[serde(default = "default_console_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Selectable agent identities
    #[serde(default = "default_roster")]
    pub roster: Vec<AgentDescriptor>,
}

fn default_console_poll_interval_ms() -> u64 {
    3000
}

fn default_roster() -> Vec<AgentDescriptor> {
    vec![
        AgentDescriptor::new("Ethan Parker", "ethan.parker@deskwire.io"),
        AgentDescriptor::new("Sofia Ramirez", "sofia.ramirez@deskwire.io"),
        AgentDescriptor::new("Liam Chen", "liam.chen@deskwire.io"),
    ]
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_console_poll_interval_ms(),
            roster: default_roster(),
        }
    }
}

/// Notification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether notifications may be shown at all
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,

    /// Auto-dismiss delay for a shown notification (ms)
    #[serde(default = "default_dismiss_after_ms")]
    pub dismiss_after_ms: u64,

    /// Maximum characters of message body shown before truncation
    #[serde(default = "default_max_body_chars")]
    pub max_body_chars: usize,
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_dismiss_after_ms() -> u64 {
    5000
}

fn default_max_body_chars() -> usize {
    120
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_notifications_enabled(),
            dismiss_after_ms: default_dismiss_after_ms(),
            max_body_chars: default_max_body_chars(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    ///
    /// A missing file yields the built-in defaults so the binaries work
    /// out of the box. After parsing, the `DESKWIRE_BACKEND_URL`
    /// environment variable overrides the configured base URL.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the YAML configuration file
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| DeskwireError::Config(format!("Failed to read {:?}: {}", path, e)))?;
            serde_yaml::from_str(&contents)
                .map_err(|e| DeskwireError::Config(format!("Failed to parse {:?}: {}", path, e)))?
        } else {
            tracing::warn!("Config file {:?} not found, using defaults", path);
            Self::default()
        };

        if let Ok(base_url) = std::env::var("DESKWIRE_BACKEND_URL") {
            tracing::info!("Using backend URL override from environment");
            config.backend.base_url = base_url;
        }

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the backend URL does not parse, any interval or
    /// delay is zero, the escalation keyword set is empty, or the agent
    /// roster is empty
    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend.base_url).map_err(|e| {
            DeskwireError::Config(format!(
                "Invalid backend base_url '{}': {}",
                self.backend.base_url, e
            ))
        })?;

        if self.backend.timeout_seconds == 0 {
            return Err(DeskwireError::Config("timeout_seconds must be > 0".into()).into());
        }
        if self.widget.poll_interval_ms == 0 {
            return Err(
                DeskwireError::Config("widget.poll_interval_ms must be > 0".into()).into(),
            );
        }
        if self.console.poll_interval_ms == 0 {
            return Err(
                DeskwireError::Config("console.poll_interval_ms must be > 0".into()).into(),
            );
        }
        if self.widget.escalation_keywords.is_empty() {
            return Err(DeskwireError::Config(
                "widget.escalation_keywords must not be empty".into(),
            )
            .into());
        }
        if self.console.roster.is_empty() {
            return Err(DeskwireError::Config("console.roster must not be empty".into()).into());
        }

        Ok(())
    }
}
