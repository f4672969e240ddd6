//! Prometheus metrics for the dispatch core.
//!
//! The core only records; exposition is up to the embedding process, which
//! calls [`gather_text`] from whatever endpoint it already serves.
//!
//! - `bot_commands_total{command}` - commands dispatched by name
//! - `bot_command_errors_total{command,kind}` - handler/coercion failures
//! - `bot_permission_denied_total{engine,reason}` - refused invocations
//! - `bot_command_duration_seconds{command}` - handling latency
//! - `bot_unknown_keywords_total` - lines that resolved to nothing

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global registry for all dispatch metrics.
static REGISTRY: OnceLock<Registry> = OnceLock::new();

fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

static COMMANDS: OnceLock<IntCounterVec> = OnceLock::new();
static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();
static PERMISSION_DENIED: OnceLock<IntCounterVec> = OnceLock::new();
static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();
static UNKNOWN_KEYWORDS: OnceLock<IntCounter> = OnceLock::new();

fn commands() -> &'static IntCounterVec {
    COMMANDS.get_or_init(|| {
        let c = IntCounterVec::new(
            Opts::new("bot_commands_total", "Commands dispatched by name"),
            &["command"],
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(c.clone()));
        c
    })
}

fn command_errors() -> &'static IntCounterVec {
    COMMAND_ERRORS.get_or_init(|| {
        let c = IntCounterVec::new(
            Opts::new(
                "bot_command_errors_total",
                "Command failures by name and error kind",
            ),
            &["command", "kind"],
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(c.clone()));
        c
    })
}

fn permission_denied() -> &'static IntCounterVec {
    PERMISSION_DENIED.get_or_init(|| {
        let c = IntCounterVec::new(
            Opts::new(
                "bot_permission_denied_total",
                "Refused invocations by engine and reason",
            ),
            &["engine", "reason"],
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(c.clone()));
        c
    })
}

fn command_latency() -> &'static HistogramVec {
    COMMAND_LATENCY.get_or_init(|| {
        let h = HistogramVec::new(
            HistogramOpts::new("bot_command_duration_seconds", "Command handling latency"),
            &["command"],
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(h.clone()));
        h
    })
}

fn unknown_keywords() -> &'static IntCounter {
    UNKNOWN_KEYWORDS.get_or_init(|| {
        let c = IntCounter::new(
            "bot_unknown_keywords_total",
            "Prefixed lines whose keyword resolved to nothing",
        )
        .expect("valid metric definition");
        let _ = registry().register(Box::new(c.clone()));
        c
    })
}

/// Count one dispatched command.
pub fn record_command(command: &str) {
    commands().with_label_values(&[command]).inc();
}

/// Count one failed command.
pub fn record_command_error(command: &str, kind: &str) {
    command_errors().with_label_values(&[command, kind]).inc();
}

/// Count one refused invocation.
pub fn record_permission_denied(engine: &str, reason: &str) {
    permission_denied().with_label_values(&[engine, reason]).inc();
}

/// Record one command's handling latency, in seconds.
pub fn observe_command_latency(command: &str, seconds: f64) {
    command_latency()
        .with_label_values(&[command])
        .observe(seconds);
}

/// Count one unknown keyword.
pub fn record_unknown_keyword() {
    unknown_keywords().inc();
}

/// Render every dispatch metric in the Prometheus text format.
pub fn gather_text() -> String {
    let mut buf = Vec::new();
    let encoder = TextEncoder::new();
    if encoder.encode(&registry().gather(), &mut buf).is_err() {
        return String::new();
    }
    String::from_utf8(buf).unwrap_or_default()
}
