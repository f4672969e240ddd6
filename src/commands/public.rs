//! Everyday commands open to regular members.

use super::{CommandSpec, Context, Engine, Handler, Invocation};
use crate::auth::AccessPolicy;
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use bramble_line::OptionKind;
use rand::Rng;

/// Highest permission level admitted to the public engine.
const MEMBER_LEVEL: u8 = 4;

/// Repeating echoes beyond this is just spam.
const MAX_ECHO_TIMES: i64 = 5;

pub fn engine() -> Engine {
    Engine::builder("public")
        .policy(AccessPolicy::at_most(MEMBER_LEVEL))
        .auth_fail("Sorry {user}, you need to be a member to use this.")
        .command(PingHandler)
        .command(HelloHandler)
        .command(ChooseHandler)
        .command(EchoHandler)
        .build()
}

const PING: CommandSpec = CommandSpec {
    name: "ping",
    summary: "Check that the bot is alive.",
    syntax: "ping",
    options: &[],
};

pub struct PingHandler;

#[async_trait]
impl Handler for PingHandler {
    fn spec(&self) -> &'static CommandSpec {
        &PING
    }

    async fn handle(&self, _ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        Ok(Some("Pong!".to_string()))
    }
}

const HELLO: CommandSpec = CommandSpec {
    name: "hello",
    summary: "Say hi.",
    syntax: "hello",
    options: &[],
};

pub struct HelloHandler;

#[async_trait]
impl Handler for HelloHandler {
    fn spec(&self) -> &'static CommandSpec {
        &HELLO
    }

    async fn handle(&self, ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        if ctx.caller.is_owner() {
            Ok(Some("Hello boss! How's it going?".to_string()))
        } else {
            Ok(Some("Hey there!".to_string()))
        }
    }
}

const CHOOSE: CommandSpec = CommandSpec {
    name: "choose",
    summary: "Pick one of the given options at random.",
    syntax: "choose <option> [option ...]",
    options: &[],
};

pub struct ChooseHandler;

#[async_trait]
impl Handler for ChooseHandler {
    fn spec(&self) -> &'static CommandSpec {
        &CHOOSE
    }

    async fn handle(&self, _ctx: &Context<'_>, inv: Invocation) -> HandlerResult {
        if inv.args.is_empty() {
            return Ok(Some(
                "I need at least one option to choose from.".to_string(),
            ));
        }
        let pick = &inv.args[rand::thread_rng().gen_range(0..inv.args.len())];
        Ok(Some(format!(
            "From what you gave me, I believe `{pick}` is the best choice."
        )))
    }
}

const ECHO: CommandSpec = CommandSpec {
    name: "echo",
    summary: "Repeat your text back.",
    syntax: "echo [-l|--loud] [--times=<n>] <text>",
    options: &[("loud", OptionKind::Bool), ("l", OptionKind::Bool), ("times", OptionKind::Int)],
};

pub struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    fn spec(&self) -> &'static CommandSpec {
        &ECHO
    }

    async fn handle(&self, _ctx: &Context<'_>, inv: Invocation) -> HandlerResult {
        if inv.args.is_empty() {
            return Err(HandlerError::NeedMoreArgs(ECHO.syntax));
        }
        let text = inv.args.join(" ");

        let text = if inv.flag("loud") || inv.flag("l") {
            text.to_uppercase()
        } else {
            text
        };
        let times = inv.int_opt("times").unwrap_or(1).clamp(1, MAX_ECHO_TIMES);

        let lines: Vec<&str> = (0..times).map(|_| text.as_str()).collect();
        Ok(Some(lines.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_has_expected_commands() {
        let e = engine();
        for name in ["ping", "hello", "choose", "echo"] {
            assert!(e.get_command(name).is_some(), "missing {name}");
        }
        assert!(e.policy().allow_direct);
    }
}
