//! Caller identity and permission gating.
//!
//! Permission tiers are a single ordered roster: the owner is level 0,
//! configured tiers follow, and everyone else lands on the stranger level.
//! One comparison gates every command; there is no per-level predicate
//! chain. Engines attach an [`AccessPolicy`]; a failed check produces a
//! [`DenyReason`] from a closed set, each with a fixed user-facing message.

use crate::config::PermissionsConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Identity and capability bundle accompanying one dispatch request.
///
/// Constructed per inbound message and discarded when the call completes.
#[derive(Clone)]
pub struct CallerContext {
    /// Stable author id on the chat platform.
    pub author_id: String,
    /// Display name, used in denial templates.
    pub author_name: String,
    /// Originating channel id.
    pub channel_id: String,
    /// Originating server id, absent in direct messages.
    pub guild_id: Option<String>,
    /// True when the message arrived outside any server.
    pub direct: bool,
    /// Platform message id, used for typo-history bookkeeping.
    pub message_id: u64,
    /// Capability to look up the caller's permission standing.
    pub perms: Arc<dyn PermissionSource>,
}

impl CallerContext {
    /// The caller's permission level, if they are known to the home server.
    pub fn level(&self) -> Option<u8> {
        self.perms.level_of(&self.author_id)
    }

    /// Whether the caller is the configured owner.
    pub fn is_owner(&self) -> bool {
        self.level() == Some(0)
    }
}

impl std::fmt::Debug for CallerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallerContext")
            .field("author_id", &self.author_id)
            .field("channel_id", &self.channel_id)
            .field("direct", &self.direct)
            .field("message_id", &self.message_id)
            .finish_non_exhaustive()
    }
}

/// Lookup capability for permission levels, roles, and operator status.
///
/// Implemented over the real chat platform by the embedding bot; tests and
/// the shell use [`StaticPerms`].
pub trait PermissionSource: Send + Sync {
    /// The author's permission level. `None` means the author could not be
    /// found on the home server at all.
    fn level_of(&self, author: &str) -> Option<u8>;

    /// Whether the author holds the named role. `None` means the role
    /// itself does not exist on the home server.
    fn has_role(&self, author: &str, role: &str) -> Option<bool>;

    /// The author's operator tier. `None` means operator integration is
    /// not available in this deployment.
    fn operator_level(&self, author: &str) -> Option<u8>;
}

/// The single gate: lower numbers outrank higher ones.
#[inline]
pub fn permits(required: u8, actual: u8) -> bool {
    actual <= required
}

/// Why an engine refused a caller. Closed set; every variant maps to one
/// fixed user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// Caller not found on the home server.
    BadUser,
    /// The required role does not exist on the home server.
    BadRole,
    /// The command wants an operator but operator integration is absent.
    BadOp,
    /// The command cannot be used in a direct message.
    Private,
    /// Plain lack of permission; rendered via the engine's template.
    Denied,
    /// Opaque fallback carried through from a collaborator.
    Other(String),
}

impl DenyReason {
    /// Static code for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadUser => "bad_user",
            Self::BadRole => "bad_role",
            Self::BadOp => "bad_op",
            Self::Private => "private",
            Self::Denied => "denied",
            Self::Other(_) => "other",
        }
    }
}

/// Declarative access requirements attached to an engine.
///
/// All present checks must pass, in order: direct-message gate, level,
/// role, operator.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    /// Maximum (numerically) permission level admitted.
    pub minimum_level: Option<u8>,
    /// Concrete role name the caller must hold.
    pub role: Option<String>,
    /// Operator tier required.
    pub operator: Option<u8>,
    /// Whether the engine's commands work in direct messages.
    pub allow_direct: bool,
}

impl AccessPolicy {
    /// A policy admitting everyone, everywhere.
    pub fn open() -> Self {
        Self {
            allow_direct: true,
            ..Self::default()
        }
    }

    /// Admit levels `0..=level`, direct messages allowed.
    pub fn at_most(level: u8) -> Self {
        Self {
            minimum_level: Some(level),
            allow_direct: true,
            ..Self::default()
        }
    }

    /// Require a concrete role; no direct messages.
    pub fn role(name: impl Into<String>) -> Self {
        Self {
            role: Some(name.into()),
            allow_direct: false,
            ..Self::default()
        }
    }

    /// Evaluate the policy for one caller.
    pub fn authenticate(&self, caller: &CallerContext) -> Result<(), DenyReason> {
        if caller.direct && !self.allow_direct {
            return Err(DenyReason::Private);
        }

        if let Some(required) = self.minimum_level {
            match caller.perms.level_of(&caller.author_id) {
                None => return Err(DenyReason::BadUser),
                Some(actual) if permits(required, actual) => {}
                Some(_) => return Err(DenyReason::Denied),
            }
        }

        if let Some(role) = &self.role {
            match caller.perms.has_role(&caller.author_id, role) {
                None => return Err(DenyReason::BadRole),
                Some(true) => {}
                Some(false) => return Err(DenyReason::Denied),
            }
        }

        if let Some(required) = self.operator {
            match caller.perms.operator_level(&caller.author_id) {
                None => return Err(DenyReason::BadOp),
                Some(actual) if permits(required, actual) => {}
                Some(_) => return Err(DenyReason::Denied),
            }
        }

        Ok(())
    }
}

/// Permission source backed by static rosters from the configuration.
///
/// Level 0 is the owner; configured tiers follow in order. Authors in no
/// roster get the stranger level when one is configured, and are otherwise
/// unknown to the server.
pub struct StaticPerms {
    owner: Option<String>,
    tiers: Vec<Vec<String>>,
    stranger_level: Option<u8>,
    roles: HashMap<String, Vec<String>>,
}

impl StaticPerms {
    /// Build from the `[permissions]` config table.
    pub fn from_config(cfg: &PermissionsConfig) -> Self {
        Self {
            owner: cfg.owner.clone(),
            tiers: cfg.levels.clone(),
            stranger_level: cfg.stranger_level,
            roles: cfg.roles.clone(),
        }
    }

    /// Grant a role to a set of authors (shell/test convenience).
    pub fn with_role(mut self, role: impl Into<String>, holders: Vec<String>) -> Self {
        self.roles.insert(role.into(), holders);
        self
    }
}

impl PermissionSource for StaticPerms {
    fn level_of(&self, author: &str) -> Option<u8> {
        if self.owner.as_deref() == Some(author) {
            return Some(0);
        }
        for (i, tier) in self.tiers.iter().enumerate() {
            if tier.iter().any(|id| id == author) {
                return Some(i as u8 + 1);
            }
        }
        self.stranger_level
    }

    fn has_role(&self, author: &str, role: &str) -> Option<bool> {
        self.roles
            .get(role)
            .map(|holders| holders.iter().any(|id| id == author))
    }

    fn operator_level(&self, _author: &str) -> Option<u8> {
        // Static rosters carry no operator integration.
        None
    }
}
