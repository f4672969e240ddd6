//! # bramble
//!
//! Command-dispatch core for a chat bot. One inbound line becomes a
//! validated, authorized invocation of exactly one registered handler:
//!
//! ```text
//! raw line -> tokenizer -> resolver -> option parser -> coercion -> handler
//! ```
//!
//! - quoting- and comment-aware tokenization ([`bramble_line`])
//! - multi-tier ordered permission resolution with one-hop aliases
//! - typed flag coercion against per-command schemas
//! - fault isolation around handler execution - a handler error or panic
//!   becomes a one-line reply, never a crash
//! - bounded follow-up waits, one per (author, channel), sentinel on
//!   timeout
//!
//! The chat transport is not here: the embedding bot feeds lines and a
//! [`auth::CallerContext`] into [`router::Router::run`] and delivers the
//! returned reply however it likes. `bramble-shell` does exactly that over
//! stdin for local poking.

pub mod alias;
pub mod auth;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod metrics;
pub mod router;
pub mod telemetry;
pub mod wait;

pub use alias::AliasStore;
pub use auth::{AccessPolicy, CallerContext, DenyReason, PermissionSource, StaticPerms};
pub use commands::{CommandSpec, Context, Engine, EngineBuilder, Handler, Invocation, ReplySink};
pub use config::Config;
pub use error::{HandlerError, HandlerResult};
pub use router::{Resolution, Router};
pub use wait::{FollowUp, WaitRegistry};
