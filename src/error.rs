//! Error types for Deskwire
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling, plus the failure
//! classification that drives the sync engines' degradation policy.

use thiserror::Error;

/// Main error type for Deskwire operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, backend interactions, local profile storage,
/// and notification delivery.
#[derive(Error, Debug)]
pub enum DeskwireError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Backend-related errors (API calls returning unexpected responses)
    #[error("Backend error: {0}")]
    Backend(String),

    /// The chat session no longer exists server-side
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// The backend is unreachable (connection refused, timed out)
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Authorization errors (e.g., 401/403 on agent operations)
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Engine state errors (operations attempted in an invalid state)
    #[error("Engine error: {0}")]
    Engine(String),

    /// Local profile storage errors (database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Deskwire operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

/// Failure classes the sync engines distinguish
///
/// Every failure from a backend call collapses into one of these classes,
/// and all degradation policy branches on the class rather than on the
/// concrete error:
///
/// - `NotFound`: the session is gone server-side; local state is reset
/// - `Connectivity`: the backend is unreachable; the widget may go offline
/// - `Authorization`: the caller is not allowed; state is preserved
/// - `Other`: anything else; state is preserved and the offline flag is
///   never flipped, so transient server errors do not cause degradation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Session no longer exists server-side
    NotFound,
    /// Network-level failure reaching the backend
    Connectivity,
    /// Authentication or permission failure
    Authorization,
    /// Any other failure
    Other,
}

/// Classify an error into the engine-visible failure classes
///
/// Downcasts the `anyhow::Error` chain to [`DeskwireError`]; raw reqwest
/// transport errors (connect/timeout) count as connectivity failures even
/// when they were not wrapped explicitly.
///
/// # Examples
///
/// ```
/// use deskwire::error::{classify, DeskwireError, ErrorClass};
///
/// let err: anyhow::Error = DeskwireError::SessionNotFound("abc".into()).into();
/// assert_eq!(classify(&err), ErrorClass::NotFound);
/// ```
pub fn classify(err: &anyhow::Error) -> ErrorClass {
    if let Some(e) = err.downcast_ref::<DeskwireError>() {
        return match e {
            DeskwireError::SessionNotFound(_) => ErrorClass::NotFound,
            DeskwireError::Connectivity(_) => ErrorClass::Connectivity,
            DeskwireError::Authorization(_) => ErrorClass::Authorization,
            DeskwireError::Http(http) if http.is_connect() || http.is_timeout() => {
                ErrorClass::Connectivity
            }
            _ => ErrorClass::Other,
        };
    }

    if let Some(http) = err.downcast_ref::<reqwest::Error>() {
        if http.is_connect() || http.is_timeout() {
            return ErrorClass::Connectivity;
        }
    }

    ErrorClass::Other
}
