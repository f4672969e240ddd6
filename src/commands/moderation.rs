//! Moderation commands, gated by the moderator role. Not usable in DM.

use super::{CommandSpec, Context, Engine, Handler, Invocation};
use crate::auth::AccessPolicy;
use crate::config::Config;
use crate::error::{HandlerError, HandlerResult};
use crate::wait::FollowUp;
use async_trait::async_trait;
use std::time::Duration;

/// How long `confirm` waits for the follow-up answer.
const CONFIRM_TIMEOUT: Duration = Duration::from_secs(15);

/// Role key this engine is gated on; the config maps it to the concrete
/// role name on the home server.
const ROLE_KEY: &str = "moderator";

pub fn engine(config: &Config) -> Engine {
    let role = config
        .role_name(ROLE_KEY)
        .unwrap_or(ROLE_KEY)
        .to_string();
    Engine::builder("mod")
        .policy(AccessPolicy::role(role))
        .auth_fail("You need the `{role}` role for that, {user}.")
        .command(SayHandler)
        .command(ConfirmHandler)
        .build()
}

const SAY: CommandSpec = CommandSpec {
    name: "say",
    summary: "Relay text as the bot, without echoing into activity logs.",
    syntax: "say <text>",
    options: &[],
};

pub struct SayHandler;

#[async_trait]
impl Handler for SayHandler {
    fn spec(&self) -> &'static CommandSpec {
        &SAY
    }

    async fn handle(&self, ctx: &Context<'_>, inv: Invocation) -> HandlerResult {
        if inv.tail.is_empty() {
            return Err(HandlerError::NeedMoreArgs(SAY.syntax));
        }
        // Keep the relay out of activity logs for exactly as long as the
        // reply is being produced; the guard drops on every exit path.
        let _quiet = ctx.suppressor.engage();
        Ok(Some(inv.tail.clone()))
    }
}

const CONFIRM: CommandSpec = CommandSpec {
    name: "confirm",
    summary: "Ask for a yes within a bounded wait.",
    syntax: "confirm",
    options: &[],
};

pub struct ConfirmHandler;

#[async_trait]
impl Handler for ConfirmHandler {
    fn spec(&self) -> &'static CommandSpec {
        &CONFIRM
    }

    async fn handle(&self, ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        ctx.notes
            .send("Type `yes` within 15 seconds to confirm.")
            .await?;

        let answer = ctx
            .waits
            .wait(
                &ctx.caller.author_id,
                &ctx.caller.channel_id,
                CONFIRM_TIMEOUT,
            )
            .await;

        Ok(Some(
            match answer {
                FollowUp::Reply(text) if text.trim().eq_ignore_ascii_case("yes") => "Confirmed.",
                FollowUp::Reply(_) => "That was not a `yes`; nothing done.",
                FollowUp::TimedOut => "Confirmation timed out; nothing done.",
            }
            .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_resolves_role_from_config() {
        let mut config = Config::default();
        config
            .roles
            .insert("moderator".to_string(), "Moderators".to_string());
        let e = engine(&config);
        assert_eq!(e.policy().role.as_deref(), Some("Moderators"));
        assert!(!e.policy().allow_direct);
    }

    #[test]
    fn missing_mapping_falls_back_to_role_key() {
        let e = engine(&Config::default());
        assert_eq!(e.policy().role.as_deref(), Some("moderator"));
    }
}
