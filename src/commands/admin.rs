//! Administrative commands: alias management, engine listing, uptime.
//!
//! Carries an owner-only sub-engine; keywords not defined here fall
//! through to it and are gated by its stricter policy.

use super::{CommandSpec, Context, Engine, Handler, Invocation};
use crate::auth::AccessPolicy;
use crate::error::{HandlerError, HandlerResult};
use async_trait::async_trait;
use chrono::Utc;

/// Highest permission level admitted to the admin engine.
const ADMIN_LEVEL: u8 = 1;

pub fn engine() -> Engine {
    Engine::builder("admin")
        .policy(AccessPolicy::at_most(ADMIN_LEVEL))
        .auth_fail("Level {op} clearance required, {user}.")
        .command(AliasHandler)
        .command(EnginesHandler)
        .command(UptimeHandler)
        .sub(
            Engine::builder("owner")
                .policy(AccessPolicy::at_most(0))
                .auth_fail("Only the owner can do that, {user}.")
                .command(AnnounceHandler)
                .build(),
        )
        .build()
}

const ALIAS: CommandSpec = CommandSpec {
    name: "alias",
    summary: "Define, remove, or list command aliases.",
    syntax: "alias <add|rm|list> [alias] [canonical]",
    options: &[],
};

pub struct AliasHandler;

#[async_trait]
impl Handler for AliasHandler {
    fn spec(&self) -> &'static CommandSpec {
        &ALIAS
    }

    async fn handle(&self, ctx: &Context<'_>, inv: Invocation) -> HandlerResult {
        match inv.args.first().map(String::as_str) {
            Some("add") => {
                let (Some(alias), Some(canonical)) = (inv.args.get(1), inv.args.get(2)) else {
                    return Err(HandlerError::NeedMoreArgs("alias add <alias> <canonical>"));
                };
                // Administrative mutation; keep it out of activity logs.
                let _quiet = ctx.suppressor.engage();
                match ctx.aliases.define(alias.clone(), canonical.clone())? {
                    Some(prior) => Ok(Some(format!(
                        "Alias `{alias}` now points at `{canonical}` (was `{prior}`)."
                    ))),
                    None => Ok(Some(format!("Alias `{alias}` -> `{canonical}` saved."))),
                }
            }
            Some("rm") => {
                let Some(alias) = inv.args.get(1) else {
                    return Err(HandlerError::NeedMoreArgs("alias rm <alias>"));
                };
                let _quiet = ctx.suppressor.engage();
                match ctx.aliases.undefine(alias)? {
                    Some(canonical) => Ok(Some(format!(
                        "Alias `{alias}` (-> `{canonical}`) removed."
                    ))),
                    None => Ok(Some(format!("There is no alias `{alias}`."))),
                }
            }
            Some("list") | None => {
                let snapshot = ctx.aliases.snapshot();
                if snapshot.is_empty() {
                    return Ok(Some("No aliases defined.".to_string()));
                }
                let mut lines: Vec<String> = snapshot
                    .iter()
                    .map(|(alias, canonical)| format!("{alias} -> {canonical}"))
                    .collect();
                lines.sort();
                Ok(Some(lines.join("\n")))
            }
            Some(other) => Err(HandlerError::BadArgument(format!(
                "`{other}` is not an alias action; use add, rm, or list."
            ))),
        }
    }
}

const ENGINES: CommandSpec = CommandSpec {
    name: "engines",
    summary: "Show the engine search order.",
    syntax: "engines",
    options: &[],
};

pub struct EnginesHandler;

#[async_trait]
impl Handler for EnginesHandler {
    fn spec(&self) -> &'static CommandSpec {
        &ENGINES
    }

    async fn handle(&self, ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        let lines: Vec<String> = ctx
            .engines
            .iter()
            .enumerate()
            .map(|(i, engine)| {
                format!(
                    "{}. {} ({} commands)",
                    i + 1,
                    engine.name(),
                    engine.get_all().len()
                )
            })
            .collect();
        Ok(Some(lines.join("\n")))
    }
}

const UPTIME: CommandSpec = CommandSpec {
    name: "uptime",
    summary: "How long the dispatcher has been up.",
    syntax: "uptime",
    options: &[],
};

pub struct UptimeHandler;

#[async_trait]
impl Handler for UptimeHandler {
    fn spec(&self) -> &'static CommandSpec {
        &UPTIME
    }

    async fn handle(&self, ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        let total = (Utc::now() - ctx.started).num_seconds().max(0);
        let days = total / 86_400;
        let hours = (total % 86_400) / 3_600;
        let minutes = (total % 3_600) / 60;
        let seconds = total % 60;
        Ok(Some(format!(
            "{days} days, {hours} hours, {minutes} minutes, {seconds} seconds"
        )))
    }
}

const ANNOUNCE: CommandSpec = CommandSpec {
    name: "announce",
    summary: "Broadcast an announcement as the bot.",
    syntax: "announce <text>",
    options: &[],
};

pub struct AnnounceHandler;

#[async_trait]
impl Handler for AnnounceHandler {
    fn spec(&self) -> &'static CommandSpec {
        &ANNOUNCE
    }

    async fn handle(&self, _ctx: &Context<'_>, inv: Invocation) -> HandlerResult {
        if inv.tail.is_empty() {
            return Err(HandlerError::NeedMoreArgs(ANNOUNCE.syntax));
        }
        Ok(Some(format!("**Announcement:** {}", inv.tail)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announce_lives_in_the_owner_sub_engine() {
        let e = engine();
        let (_, sub) = e.get_command("announce").unwrap();
        assert_eq!(sub.unwrap().name(), "owner");
        let (_, sub) = e.get_command("alias").unwrap();
        assert!(sub.is_none());
    }
}
