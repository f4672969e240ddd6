//! Typed option coercion.
//!
//! Commands declare a schema mapping option names to expected semantic
//! types. Before a handler runs, every provided option that the schema
//! declares is checked and coerced; a single failure aborts the whole call
//! with a user-facing message naming the offending flag as the user typed
//! it. Options the schema does not declare pass through untouched.

use crate::opts::{display_name, opt_key, OptionMap, OptionValue};
use std::fmt;
use thiserror::Error;

/// Expected semantic type of a declared option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    /// Bare flag; providing `=value` is an error.
    Bool,
    /// Free-form string.
    Str,
    /// Digit-only string, coerced to `i64`.
    Int,
    /// Numeric string, coerced to `f64`.
    Float,
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bool => "boolean",
            Self::Str => "string",
            Self::Int => "integer",
            Self::Float => "float",
        })
    }
}

/// A provided option failed its declared schema entry.
///
/// The `Display` form of each variant is the exact user-facing message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionTypeError {
    /// A value was supplied to a flag declared boolean.
    #[error("Flag `{0}` does not take a value.")]
    UnexpectedValue(String),
    /// A valued option was given as a bare flag.
    #[error("Option `{flag}` requires a value of type {kind}.")]
    MissingValue {
        /// Flag as originally typed.
        flag: String,
        /// Declared type.
        kind: OptionKind,
    },
    /// Declared integer, value is not a digit-only string.
    #[error("Option `{0}` must be an integer.")]
    NotInteger(String),
    /// Declared float, value is not numeric.
    #[error("Option `{0}` must be numeric.")]
    NotNumeric(String),
    /// Value is of an incompatible already-typed form.
    #[error("Option `{flag}` is `{got}` but should be `{kind}`.")]
    WrongType {
        /// Flag as originally typed.
        flag: String,
        /// Actual type name.
        got: &'static str,
        /// Declared type.
        kind: OptionKind,
    },
}

impl OptionTypeError {
    /// Static code for metrics labeling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnexpectedValue(_) => "unexpected_value",
            Self::MissingValue { .. } => "missing_value",
            Self::NotInteger(_) => "not_integer",
            Self::NotNumeric(_) => "not_numeric",
            Self::WrongType { .. } => "wrong_type",
        }
    }
}

fn schema_kind(schema: &[(&str, OptionKind)], key: &str) -> Option<OptionKind> {
    schema
        .iter()
        .find(|(name, _)| opt_key(name) == key)
        .map(|(_, kind)| *kind)
}

/// Check and coerce `opts` against `schema`.
///
/// Returns a new map in which declared integer/float options carry their
/// converted values. The first failing option aborts the whole call; no
/// partial result is ever produced.
///
/// ```rust
/// use bramble_line::{coerce, OptionKind, OptionMap, OptionValue};
///
/// const SCHEMA: &[(&str, OptionKind)] = &[("depth", OptionKind::Int)];
/// let mut opts = OptionMap::new();
/// opts.insert("_depth".into(), OptionValue::Str("42".into()));
/// let coerced = coerce(&opts, SCHEMA).unwrap();
/// assert_eq!(coerced.get("_depth"), Some(&OptionValue::Int(42)));
/// ```
pub fn coerce(
    opts: &OptionMap,
    schema: &[(&str, OptionKind)],
) -> Result<OptionMap, OptionTypeError> {
    let mut out = opts.clone();

    for (key, value) in opts {
        let Some(wanted) = schema_kind(schema, key) else {
            continue;
        };
        let flag = display_name(key);

        match (wanted, value) {
            // A flag declared boolean must stay a bare flag.
            (OptionKind::Bool, OptionValue::Bool(_)) => {}
            (OptionKind::Bool, _) => return Err(OptionTypeError::UnexpectedValue(flag)),

            // Anything valued must actually have been given a value.
            (_, OptionValue::Bool(_)) => {
                return Err(OptionTypeError::MissingValue { flag, kind: wanted });
            }

            (OptionKind::Int, OptionValue::Str(s)) => {
                if s.chars().all(|c| c.is_ascii_digit()) && !s.is_empty() {
                    // Digit-only strings of i64 range; anything longer is
                    // not an integer the caller can mean.
                    match s.parse::<i64>() {
                        Ok(n) => {
                            out.insert(key.clone(), OptionValue::Int(n));
                        }
                        Err(_) => return Err(OptionTypeError::NotInteger(flag)),
                    }
                } else {
                    return Err(OptionTypeError::NotInteger(flag));
                }
            }
            (OptionKind::Int, OptionValue::Int(_)) => {}
            (OptionKind::Int, v) => {
                return Err(OptionTypeError::WrongType {
                    flag,
                    got: v.type_name(),
                    kind: wanted,
                });
            }

            (OptionKind::Float, OptionValue::Str(s)) => match s.parse::<f64>() {
                Ok(x) if x.is_finite() => {
                    out.insert(key.clone(), OptionValue::Float(x));
                }
                _ => return Err(OptionTypeError::NotNumeric(flag)),
            },
            (OptionKind::Float, OptionValue::Float(_)) => {}
            (OptionKind::Float, v) => {
                return Err(OptionTypeError::WrongType {
                    flag,
                    got: v.type_name(),
                    kind: wanted,
                });
            }

            // Declared string: strings and already-typed values pass.
            (OptionKind::Str, _) => {}
        }
    }

    Ok(out)
}
