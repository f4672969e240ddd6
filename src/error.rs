//! Error types raised by command handlers.
//!
//! Everything a handler can fail with is caught at the dispatch boundary
//! and rendered as a single-line message; a handler fault never crashes the
//! owning process or reaches the transport as an exception.

use thiserror::Error;
use tokio::sync::mpsc;

/// Errors a command handler may raise during execution.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The invocation is missing required positional arguments.
    #[error("this command needs more arguments: `{0}`")]
    NeedMoreArgs(&'static str),

    /// A positional argument failed command-specific validation.
    #[error("{0}")]
    BadArgument(String),

    /// Alias table mutation or persistence failed.
    #[error("alias store error: {0}")]
    Alias(#[from] crate::alias::AliasError),

    /// The side-channel note sink is gone (transport shut down).
    #[error("note channel closed: {0}")]
    Send(#[from] mpsc::error::SendError<String>),

    /// Anything else; the message is shown to the user verbatim.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// The error's category name, used when rendering a handler fault.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NeedMoreArgs(_) => "NeedMoreArgs",
            Self::BadArgument(_) => "BadArgument",
            Self::Alias(_) => "AliasStore",
            Self::Send(_) => "NoteChannelClosed",
            Self::Internal(_) => "Internal",
        }
    }

    /// Static error code for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NeedMoreArgs(_) => "need_more_args",
            Self::BadArgument(_) => "bad_argument",
            Self::Alias(_) => "alias_store",
            Self::Send(_) => "send_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Result type for command handlers. `Ok(Some(text))` is the reply,
/// `Ok(None)` means reply with nothing.
pub type HandlerResult = Result<Option<String>, HandlerError>;
