//! Synchronization engines
//!
//! The customer widget and the agent console never share a process or a
//! socket; each side runs its own engine against the backend and
//! reconciles what it sees. [`widget`] and [`console`] hold the two
//! engines, [`scheduler`] the poll driver they share, and [`fallback`]
//! the offline responder the widget degrades to.

pub mod console;
pub mod fallback;
pub mod scheduler;
pub mod widget;

pub use console::{ActionOutcome, AgentConsoleSyncEngine};
pub use scheduler::PollScheduler;
pub use widget::ClientSyncEngine;
