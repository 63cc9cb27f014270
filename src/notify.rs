//! Notification delivery for agent messages
//!
//! When an agent message arrives while the widget is closed, the widget
//! engine hands it to the [`NotificationDispatcher`], which emits one
//! notification through the configured [`Notifier`]. Permission is
//! resolved once, when the widget mounts; denied permission silently
//! disables delivery while unread accounting continues in the engine.

use crate::config::NotificationConfig;
use crate::error::Result;
use crate::session::ChatMessage;
use colored::Colorize;
use std::time::Duration;

/// Notification permission, resolved once at widget mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    /// Notifications may be shown
    Granted,
    /// Notifications are suppressed
    Denied,
}

/// One outgoing notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Short title line
    pub title: String,
    /// Truncated message body
    pub body: String,
    /// Auto-dismiss delay
    pub dismiss_after: Duration,
}

/// Delivery seam for notifications
///
/// The library ships a terminal implementation; tests substitute a
/// recording one.
pub trait Notifier: Send + Sync {
    /// Deliver a single notification
    fn notify(&self, notification: &Notification) -> Result<()>;
}

/// Prints notifications to stderr, colorized
///
/// Stands in for an OS notification center in the terminal front end;
/// activation (clicking) is modeled by the front end reopening the widget.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        eprintln!(
            "{} {}",
            format!("[{}]", notification.title).cyan().bold(),
            notification.body
        );
        Ok(())
    }
}

/// Turns newly observed agent messages into notifications
pub struct NotificationDispatcher {
    notifier: Box<dyn Notifier>,
    permission: NotificationPermission,
    dismiss_after: Duration,
    max_body_chars: usize,
}

impl NotificationDispatcher {
    /// Create a dispatcher, resolving permission from configuration
    ///
    /// This is the single permission request; it happens at widget mount
    /// and the result is held for the lifetime of the dispatcher.
    pub fn new(notifier: Box<dyn Notifier>, config: &NotificationConfig) -> Self {
        let permission = if config.enabled {
            NotificationPermission::Granted
        } else {
            NotificationPermission::Denied
        };

        Self {
            notifier,
            permission,
            dismiss_after: Duration::from_millis(config.dismiss_after_ms),
            max_body_chars: config.max_body_chars,
        }
    }

    /// The permission resolved at mount
    pub fn permission(&self) -> NotificationPermission {
        self.permission
    }

    /// Emit one notification for a newly observed agent message
    ///
    /// No-op when permission was denied. Delivery failures are logged and
    /// swallowed; a broken notifier must never take the sync engine down.
    pub fn agent_message(&self, message: &ChatMessage) {
        if self.permission == NotificationPermission::Denied {
            return;
        }

        let notification = Notification {
            title: "Support agent replied".to_string(),
            body: truncate(&message.body, self.max_body_chars),
            dismiss_after: self.dismiss_after,
        };

        if let Err(e) = self.notifier.notify(&notification) {
            tracing::warn!("Failed to deliver notification: {}", e);
        }
    }
}

/// Truncates a string to a maximum length, adding ellipsis if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let mut truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        truncated.push_str("...");
        truncated
    }
}
