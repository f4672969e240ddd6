//! Dispatch instrumentation and scoped log suppression.
//!
//! [`Suppressor`] replaces the old pattern of global "be quiet" flags
//! flipped around administrative actions: a handler acquires a guard for
//! the action's duration and the count drops on every exit path, including
//! unwinding. The embedding bot's listeners consult [`Suppressor::active`]
//! before echoing activity.
//!
//! [`CommandTimer`] feeds the per-command latency histogram on drop.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

/// Counted, scope-bound suppression of activity logging.
///
/// Count-based so overlapping administrative actions nest: suppression is
/// active while at least one guard is alive.
#[derive(Default)]
pub struct Suppressor {
    engaged: AtomicUsize,
}

impl Suppressor {
    /// Create an idle suppressor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engage suppression for the lifetime of the returned guard.
    #[must_use = "suppression ends when the guard is dropped"]
    pub fn engage(&self) -> SuppressGuard<'_> {
        self.engaged.fetch_add(1, Ordering::SeqCst);
        SuppressGuard { owner: self }
    }

    /// Whether any guard is currently alive.
    pub fn active(&self) -> bool {
        self.engaged.load(Ordering::SeqCst) > 0
    }
}

/// RAII handle keeping a [`Suppressor`] engaged.
pub struct SuppressGuard<'a> {
    owner: &'a Suppressor,
}

impl Drop for SuppressGuard<'_> {
    fn drop(&mut self) {
        self.owner.engaged.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Measures one command's handling time; records on drop.
pub struct CommandTimer {
    command: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing `command`.
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        crate::metrics::observe_command_latency(&self.command, self.start.elapsed().as_secs_f64());
    }
}
