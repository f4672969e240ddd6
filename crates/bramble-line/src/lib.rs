//! # bramble-line
//!
//! Line parsing for the bramble command dispatcher: quoting-aware
//! tokenization, flag/positional separation, and typed option coercion.
//!
//! This crate is pure and sans-io. It knows nothing about engines,
//! permissions, or transports; it turns text into structured arguments and
//! nothing more.
//!
//! ## Pipeline
//!
//! ```rust
//! use bramble_line::{split, parse, coerce, OptionKind};
//!
//! let line = split("echo \"hello there\" --times=3 ; a comment");
//! assert_eq!(line.tokens, vec!["echo", "hello there", "--times=3"]);
//! assert_eq!(line.verbatim, "echo \"hello there\" --times=3");
//!
//! let (args, opts) = parse(&line.tokens[1..]);
//! assert_eq!(args, vec!["hello there"]);
//!
//! const SCHEMA: &[(&str, OptionKind)] = &[("times", OptionKind::Int)];
//! let coerced = coerce(&opts, SCHEMA).unwrap();
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod opts;
pub mod split;
pub mod typed;

pub use opts::{display_name, opt_key, parse, OptionMap, OptionValue, OPT_PREFIX};
pub use split::{split, Split};
pub use typed::{coerce, OptionKind, OptionTypeError};
