//! Message list reconciliation
//!
//! Both sync engines poll the backend for the full message list and merge
//! it into their local copy. The merge must survive arbitrary interleaving
//! of the two sides' polls: a message the client optimistically appended
//! but the server has not confirmed yet must never be discarded, while a
//! racing agent message that landed between two polls must never be lost
//! or duplicated.

use crate::session::types::ChatMessage;
use std::collections::HashSet;

/// What a reconciliation pass did to the local list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The fetched list matched; the local list was left untouched
    Unchanged,
    /// The local list was replaced wholesale by the fetched list
    Replaced,
    /// Same length but differing ids; the listed ids were merged in
    Merged {
        /// Ids of messages appended from the fetched list
        added: Vec<String>,
    },
}

/// Merge a freshly fetched message list into the local one
///
/// Both lists are ordered by server timestamp ascending. The triage is by
/// length:
///
/// - fetched longer: the common new-messages case. The fetched list is a
///   superset by construction of appends, so it replaces the local list.
/// - fetched shorter: the conversation was deleted or reset server-side;
///   the fetched list replaces the local list wholesale.
/// - equal length: neither pure append nor deletion is detectable by count
///   alone. Ids present in the fetched list but absent locally (e.g. a
///   racing agent message that arrived while the client's own optimistic
///   message also landed) are appended, then the list is re-sorted by
///   timestamp; the sort is stable so arrival order breaks ties. If no ids
///   differ the local list is left untouched, which is what protects an
///   optimistically appended message the server has not echoed back yet.
///
/// A deletion and an addition landing within the same poll interval cancel
/// out in the length triage and reconcile as a no-op. The backend contract
/// has no per-message sequence number, so the equal-length case cannot
/// distinguish that from a quiet poll.
///
/// # Examples
///
/// ```
/// use deskwire::session::{reconcile, ChatMessage, ReconcileOutcome};
///
/// let mut local = vec![ChatMessage::user("hi")];
/// let fetched = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello!")];
/// let outcome = reconcile(&mut local, fetched);
/// assert_eq!(outcome, ReconcileOutcome::Replaced);
/// assert_eq!(local.len(), 2);
/// ```
pub fn reconcile(local: &mut Vec<ChatMessage>, fetched: Vec<ChatMessage>) -> ReconcileOutcome {
    if fetched.len() != local.len() {
        if fetched.len() < local.len() {
            tracing::info!(
                "Message list shrank from {} to {}, replacing local copy",
                local.len(),
                fetched.len()
            );
        }
        *local = fetched;
        return ReconcileOutcome::Replaced;
    }

    let known: HashSet<&str> = local.iter().map(|m| m.id.as_str()).collect();
    let fresh: Vec<ChatMessage> = fetched
        .into_iter()
        .filter(|m| !known.contains(m.id.as_str()))
        .collect();

    if fresh.is_empty() {
        return ReconcileOutcome::Unchanged;
    }

    let added: Vec<String> = fresh.iter().map(|m| m.id.clone()).collect();
    local.extend(fresh);
    local.sort_by_key(|m| m.timestamp);

    ReconcileOutcome::Merged { added }
}
