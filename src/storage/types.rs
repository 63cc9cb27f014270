//! Persisted local profile records

use serde::{Deserialize, Serialize};

/// Customer-side persisted state
///
/// Everything the widget needs to reattach to its conversation after a
/// restart. One profile per installation; cross-device sharing is limited
/// to copying the session id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetProfile {
    /// Session the widget is attached to
    pub session_id: String,
    /// Customer email from the intake form
    pub email: String,
    /// Optional customer display name
    pub name: Option<String>,
    /// Id of the newest message the customer has seen
    pub last_read: Option<String>,
}

impl WidgetProfile {
    /// Creates a profile for a freshly started session
    pub fn new(session_id: impl Into<String>, email: impl Into<String>, name: Option<String>) -> Self {
        Self {
            session_id: session_id.into(),
            email: email.into(),
            name,
            last_read: None,
        }
    }
}
