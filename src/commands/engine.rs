//! Command engines.
//!
//! An engine is an ordered, immutable-after-init command group: a
//! name-to-handler table built once at startup, an access policy shared by
//! every command in the table, and an `auth_fail` template rendered when
//! the policy turns a caller away. An engine may delegate to one
//! sub-engine; commands found there are gated by the sub-engine's policy.

use super::{CommandSpec, Handler};
use crate::auth::{AccessPolicy, CallerContext, DenyReason};
use std::collections::HashMap;
use std::sync::Arc;

/// Placeholder rendered when a template wants a role the config never
/// resolved.
const MISSING_ROLE: &str = "!! ERROR !!";

/// An ordered command group with its own authorization policy.
pub struct Engine {
    name: &'static str,
    commands: HashMap<&'static str, Arc<dyn Handler>>,
    policy: AccessPolicy,
    auth_fail: String,
    sub: Option<Arc<Engine>>,
}

impl Engine {
    /// Start building an engine.
    pub fn builder(name: &'static str) -> EngineBuilder {
        EngineBuilder {
            name,
            commands: HashMap::new(),
            policy: AccessPolicy::open(),
            auth_fail: "Access denied, {user}.".to_string(),
            sub: None,
        }
    }

    /// The engine's name, as configured.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The engine's access policy.
    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// The level this engine's commands are cleared at, if level-gated.
    pub fn op(&self) -> Option<u8> {
        self.policy.operator.or(self.policy.minimum_level)
    }

    /// The concrete role this engine is gated on, if role-gated.
    pub fn role(&self) -> Option<&str> {
        self.policy.role.as_deref()
    }

    /// The denial template, with `{op}`/`{role}`/`{user}` placeholders.
    pub fn auth_fail(&self) -> &str {
        &self.auth_fail
    }

    /// Look up a command, here or in the sub-engine. When the sub-engine
    /// defines it, the sub-engine is returned so the caller authenticates
    /// against the policy that actually owns the command.
    pub fn get_command(&self, name: &str) -> Option<(Arc<dyn Handler>, Option<&Arc<Engine>>)> {
        if let Some(handler) = self.commands.get(name) {
            return Some((Arc::clone(handler), None));
        }
        if let Some(sub) = &self.sub {
            if let Some((handler, _)) = sub.get_command(name) {
                return Some((handler, Some(sub)));
            }
        }
        None
    }

    /// Evaluate this engine's policy for a caller.
    pub fn authenticate(&self, caller: &CallerContext) -> Result<(), DenyReason> {
        self.policy.authenticate(caller)
    }

    /// Every command descriptor this engine answers for, sub-engine
    /// included, sorted by name.
    pub fn get_all(&self) -> Vec<&'static CommandSpec> {
        let mut specs: Vec<&'static CommandSpec> = self.commands.values().map(|h| h.spec()).collect();
        if let Some(sub) = &self.sub {
            specs.extend(sub.get_all());
        }
        specs.sort_by_key(|spec| spec.name);
        specs
    }

    /// Number of commands defined directly by this engine.
    pub fn command_count(&self) -> usize {
        self.commands.len()
    }

    /// Render the `auth_fail` template for a refused caller, substituting
    /// `{op}`, `{role}`, and `{user}`.
    pub fn render_auth_fail(&self, caller: &CallerContext) -> String {
        let op = self
            .op()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "-".to_string());
        let role = self.policy.role.as_deref().unwrap_or(MISSING_ROLE);
        self.auth_fail
            .replace("{op}", &op)
            .replace("{role}", role)
            .replace("{user}", &caller.author_name)
    }
}

/// Builder for [`Engine`]; consumed by `build`.
pub struct EngineBuilder {
    name: &'static str,
    commands: HashMap<&'static str, Arc<dyn Handler>>,
    policy: AccessPolicy,
    auth_fail: String,
    sub: Option<Arc<Engine>>,
}

impl EngineBuilder {
    /// Set the access policy.
    pub fn policy(mut self, policy: AccessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the denial template. `{op}`, `{role}`, and `{user}` are
    /// substituted at render time.
    pub fn auth_fail(mut self, template: impl Into<String>) -> Self {
        self.auth_fail = template.into();
        self
    }

    /// Register a command under its spec name. A duplicate name replaces
    /// the earlier registration.
    pub fn command(mut self, handler: impl Handler + 'static) -> Self {
        self.commands.insert(handler.spec().name, Arc::new(handler));
        self
    }

    /// Attach a sub-engine this engine delegates unknown keywords to.
    pub fn sub(mut self, sub: Engine) -> Self {
        self.sub = Some(Arc::new(sub));
        self
    }

    /// Finish building.
    pub fn build(self) -> Engine {
        Engine {
            name: self.name,
            commands: self.commands,
            policy: self.policy,
            auth_fail: self.auth_fail,
            sub: self.sub,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PermissionSource, StaticPerms};
    use crate::config::PermissionsConfig;
    use crate::error::HandlerResult;
    use async_trait::async_trait;

    struct Probe(&'static CommandSpec);

    #[async_trait]
    impl Handler for Probe {
        fn spec(&self) -> &'static CommandSpec {
            self.0
        }
        async fn handle(
            &self,
            _ctx: &super::super::Context<'_>,
            _inv: super::super::Invocation,
        ) -> HandlerResult {
            Ok(None)
        }
    }

    const OUTER: CommandSpec = CommandSpec {
        name: "outer",
        summary: "outer probe",
        syntax: "outer",
        options: &[],
    };
    const INNER: CommandSpec = CommandSpec {
        name: "inner",
        summary: "inner probe",
        syntax: "inner",
        options: &[],
    };

    fn caller(author: &str) -> CallerContext {
        let cfg = PermissionsConfig {
            owner: Some("boss".into()),
            ..PermissionsConfig::default()
        };
        let perms: std::sync::Arc<dyn PermissionSource> =
            std::sync::Arc::new(StaticPerms::from_config(&cfg));
        CallerContext {
            author_id: author.into(),
            author_name: author.into(),
            channel_id: "chan".into(),
            guild_id: Some("guild".into()),
            direct: false,
            message_id: 1,
            perms,
        }
    }

    fn sample() -> Engine {
        Engine::builder("outer")
            .command(Probe(&OUTER))
            .sub(
                Engine::builder("inner")
                    .policy(AccessPolicy::at_most(0))
                    .command(Probe(&INNER))
                    .build(),
            )
            .build()
    }

    #[test]
    fn finds_own_and_sub_commands() {
        let engine = sample();
        let (_, sub) = engine.get_command("outer").unwrap();
        assert!(sub.is_none());
        let (_, sub) = engine.get_command("inner").unwrap();
        assert_eq!(sub.unwrap().name(), "inner");
        assert!(engine.get_command("nope").is_none());
    }

    #[test]
    fn sub_commands_are_gated_by_sub_policy() {
        let engine = sample();
        let (_, sub) = engine.get_command("inner").unwrap();
        let owner = sub.unwrap();
        assert!(owner.authenticate(&caller("boss")).is_ok());
        assert!(owner.authenticate(&caller("rando")).is_err());
    }

    #[test]
    fn get_all_includes_sub_and_sorts() {
        let engine = sample();
        let names: Vec<&str> = engine.get_all().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["inner", "outer"]);
        assert_eq!(engine.command_count(), 1);
    }

    #[test]
    fn auth_fail_template_substitutes() {
        let engine = Engine::builder("staff")
            .policy(AccessPolicy {
                minimum_level: Some(2),
                role: Some("Moderators".into()),
                allow_direct: true,
                ..AccessPolicy::default()
            })
            .auth_fail("Level {op} or role {role} required, {user}.")
            .build();
        assert_eq!(
            engine.render_auth_fail(&caller("pat")),
            "Level 2 or role Moderators required, pat."
        );
    }
}
