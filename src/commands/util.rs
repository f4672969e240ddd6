//! Introspection commands: help, listings, argument echo.

use super::{CommandSpec, Context, Engine, Handler, Invocation};
use crate::auth::AccessPolicy;
use crate::error::HandlerResult;
use async_trait::async_trait;
use bramble_line::{display_name, OptionValue};

pub fn engine() -> Engine {
    Engine::builder("util")
        .policy(AccessPolicy::open())
        .command(HelpHandler)
        .command(CommandsHandler)
        .command(ArgtestHandler)
        .build()
}

const HELP: CommandSpec = CommandSpec {
    name: "help",
    summary: "Show what a command does and how to call it.",
    syntax: "help [command]",
    options: &[],
};

pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    fn spec(&self) -> &'static CommandSpec {
        &HELP
    }

    async fn handle(&self, ctx: &Context<'_>, inv: Invocation) -> HandlerResult {
        let Some(wanted) = inv.args.first() else {
            let mut lines = vec![
                "Commands are lines starting with the bot prefix.".to_string(),
                "Use `commands` for the full list, or `help <command>` for details.".to_string(),
            ];
            for engine in ctx.engines {
                lines.push(format!(
                    "- {} ({} commands)",
                    engine.name(),
                    engine.get_all().len()
                ));
            }
            return Ok(Some(lines.join("\n")));
        };

        // The asked-about name may itself be an alias; follow one hop, as
        // resolution would.
        let spec = ctx.find_spec(wanted).or_else(|| {
            ctx.aliases
                .resolve(wanted)
                .and_then(|canonical| ctx.find_spec(&canonical))
        });

        match spec {
            Some(spec) => Ok(Some(format!(
                "{} - {}\nSyntax: `{}`",
                spec.name, spec.summary, spec.syntax
            ))),
            None => Ok(Some(format!("`{wanted}` is not a valid command."))),
        }
    }
}

const COMMANDS: CommandSpec = CommandSpec {
    name: "commands",
    summary: "List every command, grouped by engine.",
    syntax: "commands",
    options: &[],
};

pub struct CommandsHandler;

#[async_trait]
impl Handler for CommandsHandler {
    fn spec(&self) -> &'static CommandSpec {
        &COMMANDS
    }

    async fn handle(&self, ctx: &Context<'_>, _inv: Invocation) -> HandlerResult {
        let mut lines = Vec::new();
        for engine in ctx.engines {
            let names: Vec<&str> = engine.get_all().iter().map(|s| s.name).collect();
            lines.push(format!("{}: {}", engine.name(), names.join(", ")));
        }
        Ok(Some(lines.join("\n")))
    }
}

const ARGTEST: CommandSpec = CommandSpec {
    name: "argtest",
    summary: "Echo back how your arguments and flags were parsed.",
    syntax: "argtest [anything ...]",
    options: &[],
};

pub struct ArgtestHandler;

#[async_trait]
impl Handler for ArgtestHandler {
    fn spec(&self) -> &'static CommandSpec {
        &ARGTEST
    }

    async fn handle(&self, _ctx: &Context<'_>, inv: Invocation) -> HandlerResult {
        let args: Vec<String> = inv.args.iter().map(|a| format!("`{a}`")).collect();

        let mut opts: Vec<(String, String)> = inv
            .opts
            .iter()
            .map(|(key, value)| (display_name(key), render_value(value)))
            .collect();
        opts.sort();
        let opts: Vec<String> = opts
            .into_iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();

        Ok(Some(format!(
            "args: [{}]\noptions: [{}]\ntail: `{}`",
            args.join(", "),
            opts.join(", "),
            inv.tail
        )))
    }
}

fn render_value(value: &OptionValue) -> String {
    match value {
        OptionValue::Bool(b) => b.to_string(),
        OptionValue::Str(s) => format!("\"{s}\""),
        OptionValue::Int(n) => n.to_string(),
        OptionValue::Float(x) => x.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_is_open_to_everyone() {
        let e = engine();
        assert!(e.policy().minimum_level.is_none());
        assert!(e.policy().role.is_none());
        assert!(e.get_command("help").is_some());
        assert!(e.get_command("argtest").is_some());
    }
}
