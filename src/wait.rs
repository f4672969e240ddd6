//! Follow-up message waiter.
//!
//! A handler may suspend until the same (author, channel) pair sends one
//! more message, bounded by a timeout. The embedding transport pumps every
//! inbound line through [`WaitRegistry::offer`] before dispatching; if a
//! handler is waiting on that pair the line is consumed by the wait instead
//! of being routed.
//!
//! No lock is held across the suspension point, so unrelated dispatches
//! proceed while a handler waits. On timeout the handler receives the
//! [`FollowUp::TimedOut`] sentinel exactly once; there are no retries, and
//! an elapsed wait is never resumed.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::oneshot;

/// Identifies the conversation a wait is bound to.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct WaitKey {
    /// Author id the follow-up must come from.
    pub author: String,
    /// Channel id the follow-up must arrive in.
    pub channel: String,
}

/// Outcome of a bounded wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    /// The follow-up line, verbatim.
    Reply(String),
    /// The timeout elapsed; delivered exactly once per wait.
    TimedOut,
}

struct Pending {
    ticket: u64,
    tx: oneshot::Sender<String>,
}

/// Registry of pending follow-up waits, one per (author, channel).
#[derive(Default)]
pub struct WaitRegistry {
    pending: DashMap<WaitKey, Pending>,
    tickets: AtomicU64,
}

impl WaitRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend until the (author, channel) pair sends one more message or
    /// `timeout` elapses.
    ///
    /// A second wait on the same pair replaces the first; the replaced
    /// waiter resolves through the sentinel path.
    pub async fn wait(&self, author: &str, channel: &str, timeout: Duration) -> FollowUp {
        let key = WaitKey {
            author: author.to_string(),
            channel: channel.to_string(),
        };
        let ticket = self.tickets.fetch_add(1, Ordering::Relaxed);
        let (tx, mut rx) = oneshot::channel();
        self.pending.insert(key.clone(), Pending { ticket, tx });

        match tokio::time::timeout(timeout, &mut rx).await {
            Ok(Ok(text)) => FollowUp::Reply(text),
            // Sender dropped: this wait was replaced by a newer one.
            Ok(Err(_)) => FollowUp::TimedOut,
            Err(_elapsed) => {
                // Only remove our own entry; a newer wait may have replaced it.
                self.pending
                    .remove_if(&key, |_, pending| pending.ticket == ticket);
                // An offer may have raced the timeout and already consumed
                // the sender; prefer the delivered message over the sentinel.
                match rx.try_recv() {
                    Ok(text) => FollowUp::Reply(text),
                    Err(_) => FollowUp::TimedOut,
                }
            }
        }
    }

    /// Offer an inbound line to a pending wait. Returns true when a handler
    /// consumed it; the caller must then not dispatch the line.
    pub fn offer(&self, author: &str, channel: &str, text: impl Into<String>) -> bool {
        let key = WaitKey {
            author: author.to_string(),
            channel: channel.to_string(),
        };
        match self.pending.remove(&key) {
            Some((_, pending)) => pending.tx.send(text.into()).is_ok(),
            None => false,
        }
    }

    /// Number of handlers currently suspended.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
