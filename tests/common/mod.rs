//! Shared fixtures for integration tests: a static permission roster,
//! caller construction, and probe handlers with observable side effects.

// Each test binary uses a different slice of the fixtures.
#![allow(dead_code)]

use async_trait::async_trait;
use bramble::auth::{CallerContext, StaticPerms};
use bramble::commands::{CommandSpec, Context, Handler, Invocation};
use bramble::config::PermissionsConfig;
use bramble::error::{HandlerError, HandlerResult};
use bramble::wait::FollowUp;
use bramble_line::OptionKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Owner id in the test roster.
pub const OWNER: &str = "owner";
/// Level-1 admin id.
pub const ADMIN: &str = "admin";
/// Level-2 moderator id, holder of the `Moderators` role.
pub const MOD: &str = "mod";
/// An author in no roster; lands on the stranger level.
pub const RANDO: &str = "rando";

/// Roster: owner, one admin tier, one mod tier, strangers at level 5,
/// `Moderators` role held by the mod.
pub fn perms() -> Arc<StaticPerms> {
    let cfg = PermissionsConfig {
        owner: Some(OWNER.to_string()),
        levels: vec![vec![ADMIN.to_string()], vec![MOD.to_string()]],
        stranger_level: Some(5),
        roles: HashMap::from([("Moderators".to_string(), vec![MOD.to_string()])]),
    };
    Arc::new(StaticPerms::from_config(&cfg))
}

/// A caller in the shared test channel.
pub fn caller(author: &str, message_id: u64) -> CallerContext {
    caller_in(author, "chan", message_id)
}

/// A caller in a specific channel.
pub fn caller_in(author: &str, channel: &str, message_id: u64) -> CallerContext {
    CallerContext {
        author_id: author.to_string(),
        author_name: author.to_string(),
        channel_id: channel.to_string(),
        guild_id: Some("guild".to_string()),
        direct: false,
        message_id,
        perms: perms(),
    }
}

/// Handler that counts invocations and returns a fixed reply.
pub struct Probe {
    spec: &'static CommandSpec,
    reply: &'static str,
    calls: Arc<AtomicUsize>,
}

impl Probe {
    pub fn new(spec: &'static CommandSpec, reply: &'static str) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                spec,
                reply,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl Handler for Probe {
    fn spec(&self) -> &'static CommandSpec {
        self.spec
    }

    async fn handle(&self, _ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(self.reply.to_string()))
    }
}

/// Handler that panics outright.
pub struct PanicProbe(pub &'static CommandSpec);

#[async_trait]
impl Handler for PanicProbe {
    fn spec(&self) -> &'static CommandSpec {
        self.0
    }

    async fn handle(&self, _ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        panic!("probe exploded");
    }
}

/// Handler that fails with an internal error.
pub struct FailProbe(pub &'static CommandSpec);

#[async_trait]
impl Handler for FailProbe {
    fn spec(&self) -> &'static CommandSpec {
        self.0
    }

    async fn handle(&self, _ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        Err(HandlerError::Internal("the backend fell over".to_string()))
    }
}

/// Handler that suspends on a follow-up from its caller.
pub struct WaitProbe {
    pub spec: &'static CommandSpec,
    pub timeout: Duration,
}

#[async_trait]
impl Handler for WaitProbe {
    fn spec(&self) -> &'static CommandSpec {
        self.spec
    }

    async fn handle(&self, ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        let got = ctx
            .waits
            .wait(&ctx.caller.author_id, &ctx.caller.channel_id, self.timeout)
            .await;
        Ok(Some(match got {
            FollowUp::Reply(text) => format!("heard: {text}"),
            FollowUp::TimedOut => "heard nothing".to_string(),
        }))
    }
}

pub const KICK: CommandSpec = CommandSpec {
    name: "kick",
    summary: "probe",
    syntax: "kick",
    options: &[],
};

pub const BOOM: CommandSpec = CommandSpec {
    name: "boom",
    summary: "panics",
    syntax: "boom",
    options: &[],
};

pub const FLAKY: CommandSpec = CommandSpec {
    name: "flaky",
    summary: "fails",
    syntax: "flaky",
    options: &[],
};

pub const ASK: CommandSpec = CommandSpec {
    name: "ask",
    summary: "waits for a follow-up",
    syntax: "ask",
    options: &[],
};

pub const TYPED: CommandSpec = CommandSpec {
    name: "typed",
    summary: "probe with a schema",
    syntax: "typed [--n=<int>] [--rate=<float>] [--dry]",
    options: &[
        ("n", OptionKind::Int),
        ("rate", OptionKind::Float),
        ("dry", OptionKind::Bool),
    ],
};
