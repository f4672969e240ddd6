//! Command handlers and engines.
//!
//! A [`Handler`] is one command: static metadata (name, syntax, option
//! schema) plus an async `handle`. Handlers are grouped into [`Engine`]s,
//! each with its own access policy; engines are built once at startup in
//! the configured order and never mutated afterwards, so the resolver can
//! read them concurrently without synchronization.

mod admin;
mod engine;
mod moderation;
mod public;
mod util;

pub use engine::{Engine, EngineBuilder};

use crate::alias::AliasStore;
use crate::auth::CallerContext;
use crate::config::Config;
use crate::error::HandlerResult;
use crate::telemetry::Suppressor;
use crate::wait::WaitRegistry;
use async_trait::async_trait;
use bramble_line::{opt_key, OptionKind, OptionMap, OptionValue};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::warn;

/// Sink for side-channel notes a handler (or the dispatcher) sends beyond
/// its final reply. Direct forwards to the transport; Capturing buffers for
/// tests.
#[derive(Clone)]
pub enum ReplySink {
    /// Forward to the embedding transport.
    Direct(mpsc::Sender<String>),
    /// Buffer, for assertions.
    Capturing(Arc<Mutex<Vec<String>>>),
}

impl ReplySink {
    /// A capturing sink plus its buffer.
    pub fn capturing() -> (Self, Arc<Mutex<Vec<String>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (Self::Capturing(Arc::clone(&buf)), buf)
    }

    /// Send or buffer one note.
    pub async fn send(
        &self,
        text: impl Into<String>,
    ) -> Result<(), mpsc::error::SendError<String>> {
        match self {
            Self::Direct(tx) => tx.send(text.into()).await,
            Self::Capturing(buf) => {
                buf.lock().await.push(text.into());
                Ok(())
            }
        }
    }
}

/// Static metadata describing one command.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    /// Keyword the command answers to; unique within its engine.
    pub name: &'static str,
    /// One-line description for listings.
    pub summary: &'static str,
    /// Syntax string for help output.
    pub syntax: &'static str,
    /// Declared option schema; undeclared options pass through unchecked.
    pub options: &'static [(&'static str, OptionKind)],
}

/// Everything a handler receives beyond its own invocation.
pub struct Context<'a> {
    /// Who is calling, from where.
    pub caller: &'a CallerContext,
    /// Side-channel note sink.
    pub notes: &'a ReplySink,
    /// All engines in search order, for listings and help.
    pub engines: &'a [Arc<Engine>],
    /// Shared alias table.
    pub aliases: &'a AliasStore,
    /// Follow-up waiter.
    pub waits: &'a WaitRegistry,
    /// Scoped activity-log suppression.
    pub suppressor: &'a Suppressor,
    /// When the dispatcher came up.
    pub started: DateTime<Utc>,
}

impl Context<'_> {
    /// Look up a command spec across every engine, listings-style.
    pub fn find_spec(&self, name: &str) -> Option<&'static CommandSpec> {
        self.engines
            .iter()
            .flat_map(|e| e.get_all())
            .find(|spec| spec.name == name)
    }
}

/// One parsed, validated invocation.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Positional arguments in input order.
    pub args: Vec<String>,
    /// Everything after the keyword, verbatim, up to the comment cut.
    pub tail: String,
    /// Coerced options, keys internally prefixed.
    pub opts: OptionMap,
}

impl Invocation {
    /// Look up an option by its declared (unprefixed) name.
    pub fn opt(&self, name: &str) -> Option<&OptionValue> {
        self.opts.get(&opt_key(name))
    }

    /// True when a boolean flag was given.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.opt(name), Some(OptionValue::Bool(true)))
    }

    /// A coerced integer option.
    pub fn int_opt(&self, name: &str) -> Option<i64> {
        match self.opt(name) {
            Some(OptionValue::Int(n)) => Some(*n),
            _ => None,
        }
    }

    /// A string option.
    pub fn str_opt(&self, name: &str) -> Option<&str> {
        match self.opt(name) {
            Some(OptionValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// One command: metadata plus behavior.
#[async_trait]
pub trait Handler: Send + Sync {
    /// The command's static metadata, including its option schema.
    fn spec(&self) -> &'static CommandSpec;

    /// Execute. `Ok(Some(text))` is the reply; `Ok(None)` stays silent.
    async fn handle(&self, ctx: &Context<'_>, inv: Invocation) -> HandlerResult;
}

/// Build the configured engines, in the configured order.
///
/// Unknown engine names are skipped with a warning; the order of the
/// survivors is the search priority for the process lifetime.
pub fn build_engines(config: &Config) -> Vec<Arc<Engine>> {
    let mut engines = Vec::new();
    for name in &config.engines {
        match name.as_str() {
            "admin" => engines.push(Arc::new(admin::engine())),
            "mod" => engines.push(Arc::new(moderation::engine(config))),
            "util" => engines.push(Arc::new(util::engine())),
            "public" => engines.push(Arc::new(public::engine())),
            other => warn!(engine = %other, "unknown engine name in config, skipping"),
        }
    }
    engines
}
