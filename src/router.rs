//! Command resolution and dispatch.
//!
//! The router walks the fixed engine order to turn a keyword into exactly
//! one authorized handler, then runs the full pipeline for a line:
//! tokenize, resolve, separate flags from positionals, coerce against the
//! handler's schema, and invoke inside a fault boundary. A handler fault,
//! whether a returned error or a panic, becomes a single-line reply and
//! never crashes the owning process.

use crate::alias::AliasStore;
use crate::auth::{CallerContext, DenyReason};
use crate::commands::{self, CommandSpec, Context, Engine, Handler, Invocation, ReplySink};
use crate::config::Config;
use crate::history::TypoHistory;
use crate::metrics;
use crate::telemetry::{CommandTimer, Suppressor};
use crate::wait::WaitRegistry;
use bramble_line::{coerce, parse, split};
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, span, Instrument, Level};

/// Sent once when a positional list still uses the legacy pipe separator.
const PIPE_ASIDE: &str = "It looks like you tried to separate arguments with a pipe (`|`). \
Arguments are space-separated and grouped by quotes these days; `argtest` shows how a line \
gets parsed. Running the command anyway.";

/// Outcome of resolving a keyword against the engine order.
pub enum Resolution {
    /// A defining engine permitted the caller.
    Found {
        /// The engine whose policy admitted the caller (the sub-engine,
        /// when the command lives there).
        engine: Arc<Engine>,
        /// The handler to invoke.
        handler: Arc<dyn Handler>,
    },
    /// At least one engine defines the keyword, none permitted the caller.
    Denied {
        /// The most recent non-empty denial text, ready to show.
        message: String,
    },
    /// No engine defines the keyword, directly or through one alias hop.
    NotFound,
}

/// Fixed user-facing text for each denial reason; `Denied` renders the
/// owning engine's template.
fn denial_text(reason: &DenyReason, engine: &Engine, caller: &CallerContext) -> String {
    match reason {
        DenyReason::BadUser => "Could not find you on the home server.".to_string(),
        DenyReason::BadRole => {
            "Could not find the required role on the home server.".to_string()
        }
        DenyReason::BadOp => {
            "Command wants an operator, but operator integration is not available.".to_string()
        }
        DenyReason::Private => "Command cannot be used in a direct message.".to_string(),
        DenyReason::Denied => engine.render_auth_fail(caller),
        DenyReason::Other(reason) => format!("`{reason}`."),
    }
}

/// The command router: fixed engine order, shared alias table, bounded
/// typo history, and the follow-up waiter. Built once; every field is safe
/// for concurrent readers, so one `Router` serves one task per inbound
/// message with no global serialization.
pub struct Router {
    prefix: String,
    engines: Vec<Arc<Engine>>,
    aliases: AliasStore,
    typos: TypoHistory,
    waits: WaitRegistry,
    suppressor: Suppressor,
    started: DateTime<Utc>,
}

impl Router {
    /// Build a router over explicit engines (tests, embedders with their
    /// own engine sets).
    pub fn new(prefix: impl Into<String>, engines: Vec<Arc<Engine>>, aliases: AliasStore) -> Self {
        Self {
            prefix: prefix.into(),
            engines,
            aliases,
            typos: TypoHistory::default(),
            waits: WaitRegistry::new(),
            suppressor: Suppressor::new(),
            started: Utc::now(),
        }
    }

    /// Build a router from configuration: engines in the configured order,
    /// aliases loaded from the configured path.
    pub fn from_config(config: &Config) -> Result<Self, crate::alias::AliasError> {
        let aliases = match &config.aliases.path {
            Some(path) => AliasStore::load(path)?,
            None => AliasStore::in_memory(),
        };
        Ok(Self::new(
            config.prefix.clone(),
            commands::build_engines(config),
            aliases,
        ))
    }

    /// The configured command prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Engines in search order.
    pub fn engines(&self) -> &[Arc<Engine>] {
        &self.engines
    }

    /// The shared alias table.
    pub fn aliases(&self) -> &AliasStore {
        &self.aliases
    }

    /// The follow-up waiter. The embedding pump must offer every inbound
    /// line here before dispatching it.
    pub fn waits(&self) -> &WaitRegistry {
        &self.waits
    }

    /// Scoped activity-log suppression, for the embedder's listeners.
    pub fn suppressor(&self) -> &Suppressor {
        &self.suppressor
    }

    /// The bounded possible-typo history.
    pub fn typo_history(&self) -> &TypoHistory {
        &self.typos
    }

    /// Every command descriptor across every engine, for listings.
    pub fn get_all(&self) -> Vec<&'static CommandSpec> {
        self.engines.iter().flat_map(|e| e.get_all()).collect()
    }

    /// One scan over the engine order, no alias consultation.
    ///
    /// Returns on the first engine that both defines the keyword and
    /// permits the caller. When none permits, the denial reported is the
    /// most recent non-empty reason among the engines that defined the
    /// keyword, so the scan keeps going across all defining engines.
    fn scan(&self, keyword: &str, caller: &CallerContext) -> Resolution {
        let mut denial: Option<String> = None;
        for engine in &self.engines {
            let Some((handler, sub)) = engine.get_command(keyword) else {
                continue;
            };
            let owner = sub.unwrap_or(engine);
            match owner.authenticate(caller) {
                Ok(()) => {
                    return Resolution::Found {
                        engine: Arc::clone(owner),
                        handler,
                    };
                }
                Err(reason) => {
                    metrics::record_permission_denied(owner.name(), reason.error_code());
                    let text = denial_text(&reason, owner, caller);
                    if !text.is_empty() {
                        denial = Some(text);
                    }
                }
            }
        }
        match denial {
            Some(message) => Resolution::Denied { message },
            None => Resolution::NotFound,
        }
    }

    /// Resolve a keyword to a handler, a denial, or nothing.
    ///
    /// Aliases apply only when the keyword is undefined in every engine,
    /// and only one hop deep: an alias pointing at another alias resolves
    /// to `NotFound` rather than chasing it.
    pub fn find_command(&self, keyword: &str, caller: &CallerContext) -> Resolution {
        match self.scan(keyword, caller) {
            Resolution::NotFound => match self.aliases.resolve(keyword) {
                Some(canonical) => self.scan(&canonical, caller),
                None => Resolution::NotFound,
            },
            resolution => resolution,
        }
    }

    /// Dispatch one prefixed-and-stripped command line.
    ///
    /// Returns the reply text; empty means stay silent.
    pub async fn route(&self, line: &str, caller: &CallerContext, sink: &ReplySink) -> String {
        let parsed = split(line);
        let Some((keyword, rest)) = parsed.tokens.split_first() else {
            return String::new();
        };

        let (engine, handler) = match self.find_command(keyword, caller) {
            Resolution::Denied { message } => {
                debug!(keyword = %keyword, author = %caller.author_id, "permission denied");
                return format!("Authentication failure: {message}");
            }
            Resolution::NotFound => {
                // Not a command; possibly a typo. Remember the message id
                // and stay silent rather than answering every stray line.
                self.typos.note(caller.message_id);
                metrics::record_unknown_keyword();
                debug!(keyword = %keyword, "unknown keyword");
                return String::new();
            }
            Resolution::Found { engine, handler } => {
                self.typos.forget(caller.message_id);
                (engine, handler)
            }
        };

        let spec = handler.spec();
        let (args, opts) = parse(rest);
        let opts = match coerce(&opts, spec.options) {
            Ok(opts) => opts,
            Err(e) => {
                metrics::record_command_error(spec.name, e.error_code());
                return e.to_string();
            }
        };

        if args.iter().any(|arg| arg == "|") {
            // Informational only; a closed sink must not block dispatch.
            let _ = sink.send(PIPE_ASIDE).await;
        }

        let inv = Invocation {
            args,
            tail: tail_after_keyword(&parsed.verbatim, keyword),
            opts,
        };
        let ctx = Context {
            caller,
            notes: sink,
            engines: &self.engines,
            aliases: &self.aliases,
            waits: &self.waits,
            suppressor: &self.suppressor,
            started: self.started,
        };

        metrics::record_command(spec.name);
        let _timer = CommandTimer::new(spec.name);
        let cmd_span = span!(
            Level::DEBUG,
            "bot.command",
            command = %spec.name,
            engine = %engine.name(),
            author = %caller.author_id,
            channel = %caller.channel_id,
        );

        // Fault boundary: a handler may return an error or panic outright;
        // either way the dispatcher answers with one line and stays up.
        let outcome = AssertUnwindSafe(handler.handle(&ctx, inv).instrument(cmd_span))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(Some(reply))) => reply,
            Ok(Ok(None)) => String::new(),
            Ok(Err(e)) => {
                metrics::record_command_error(spec.name, e.error_code());
                debug!(command = %spec.name, error = %e, "command failed");
                format!("Sorry, an exception was raised: `{}` (`{}`)", e.kind(), e)
            }
            Err(payload) => {
                let detail = panic_detail(payload.as_ref());
                metrics::record_command_error(spec.name, "panic");
                error!(command = %spec.name, detail = %detail, "handler panicked");
                format!("Sorry, an exception was raised: `Panic` (`{detail}`)")
            }
        }
    }

    /// Entry point for raw inbound lines: lines without the configured
    /// prefix are ignored entirely (never tokenized).
    pub async fn run(
        &self,
        raw: &str,
        caller: &CallerContext,
        sink: &ReplySink,
    ) -> Option<String> {
        let body = raw.strip_prefix(&self.prefix)?;
        Some(self.route(body, caller, sink).await)
    }
}

/// Everything after the keyword in the verbatim remainder.
fn tail_after_keyword(verbatim: &str, keyword: &str) -> String {
    let trimmed = verbatim.trim_start();
    let rest = match trimmed.strip_prefix(keyword) {
        Some(rest) => rest,
        // Keyword was quoted in the original line; fall back to cutting at
        // the first whitespace run.
        None => match trimmed.split_once(char::is_whitespace) {
            Some((_, rest)) => rest,
            None => "",
        },
    };
    rest.trim_start().to_string()
}

fn panic_detail(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_strips_keyword_and_leading_space() {
        assert_eq!(tail_after_keyword("echo  a b", "echo"), "a b");
        assert_eq!(tail_after_keyword("  echo a", "echo"), "a");
        assert_eq!(tail_after_keyword("echo", "echo"), "");
    }

    #[test]
    fn tail_survives_quoted_keyword() {
        assert_eq!(tail_after_keyword("\"echo\" a", "echo"), "a");
    }
}
