//! Flag/positional separation.
//!
//! Walks a token list and pulls out option flags (`--name`, `--name=value`,
//! `-abc`, `-abc=value`), leaving everything else as positional arguments in
//! input order. Option keys are stored under an internal prefix so they can
//! never collide with positional binding names at invocation time.

use std::collections::HashMap;

/// Internal prefix applied to every option key.
pub const OPT_PREFIX: char = '_';

/// A parsed or coerced option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// A bare flag, or an explicitly boolean value after coercion.
    Bool(bool),
    /// An explicit `=value` as typed, or a coerced string.
    Str(String),
    /// Produced by coercion against an integer schema entry.
    Int(i64),
    /// Produced by coercion against a float schema entry.
    Float(f64),
}

impl OptionValue {
    /// Human-readable name of the value's current type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
        }
    }
}

/// Option keys (internally prefixed) to values.
pub type OptionMap = HashMap<String, OptionValue>;

/// Build the internal storage key for an option name.
///
/// Leading/trailing underscores in the typed name are stripped first, so a
/// creatively-typed `--_x_` lands on the same key as `-x`.
pub fn opt_key(name: &str) -> String {
    format!("{}{}", OPT_PREFIX, name.trim_matches('_'))
}

/// Render a stored option key the way the user originally typed it:
/// one dash for a short (single-character) key, two for a long one.
pub fn display_name(key: &str) -> String {
    let bare = key.strip_prefix(OPT_PREFIX).unwrap_or(key);
    if bare.chars().count() == 1 {
        format!("-{bare}")
    } else {
        format!("--{bare}")
    }
}

/// True when a token should be treated as a flag rather than a positional
/// argument: it starts with a dash and is not purely numeric once the
/// dashes are stripped, so bare negative numbers stay positional.
fn is_flag(token: &str) -> bool {
    let stripped = token.trim_start_matches('-');
    token.starts_with('-')
        && !stripped.is_empty()
        && !stripped.chars().all(|c| c.is_ascii_digit())
}

/// Separate `tokens` into positional arguments and options.
///
/// - `--name` / `--name=value`: the whole word is one key;
/// - `-abc` / `-abc=value`: each character but the last becomes an
///   independent `true` flag, the last takes the value (or `true`);
/// - a duplicated key keeps the last occurrence.
///
/// ```rust
/// use bramble_line::{parse, OptionValue};
///
/// let tokens: Vec<String> = ["x", "-ab=5", "--verbose"]
///     .iter().map(|s| s.to_string()).collect();
/// let (args, opts) = parse(&tokens);
/// assert_eq!(args, vec!["x"]);
/// assert_eq!(opts.get("_a"), Some(&OptionValue::Bool(true)));
/// assert_eq!(opts.get("_b"), Some(&OptionValue::Str("5".into())));
/// assert_eq!(opts.get("_verbose"), Some(&OptionValue::Bool(true)));
/// ```
pub fn parse(tokens: &[String]) -> (Vec<String>, OptionMap) {
    let mut args = Vec::new();
    let mut opts = OptionMap::new();

    for token in tokens {
        if !is_flag(token) {
            args.push(token.clone());
            continue;
        }

        let body = token.trim_start_matches('-');
        let (key, value) = match body.split_once('=') {
            Some((key, value)) => (key, Some(value)),
            None => (body, None),
        };
        let value = match value {
            Some(v) => OptionValue::Str(v.to_string()),
            None => OptionValue::Bool(true),
        };

        if token.starts_with("--") {
            opts.insert(opt_key(key), value);
        } else {
            // Short cluster: every char but the last is an independent flag.
            let chars: Vec<char> = key.chars().collect();
            if let Some((last, rest)) = chars.split_last() {
                for c in rest {
                    opts.insert(opt_key(&c.to_string()), OptionValue::Bool(true));
                }
                opts.insert(opt_key(&last.to_string()), value);
            }
        }
    }

    (args, opts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn long_flags_and_values() {
        let (args, opts) = parse(&toks(&["x", "--verbose", "--depth=3"]));
        assert_eq!(args, vec!["x"]);
        assert_eq!(opts.get("_verbose"), Some(&OptionValue::Bool(true)));
        assert_eq!(opts.get("_depth"), Some(&OptionValue::Str("3".into())));
    }

    #[test]
    fn short_cluster_expands() {
        let (args, opts) = parse(&toks(&["x", "-ab=5"]));
        assert_eq!(args, vec!["x"]);
        assert_eq!(opts.get("_a"), Some(&OptionValue::Bool(true)));
        assert_eq!(opts.get("_b"), Some(&OptionValue::Str("5".into())));
    }

    #[test]
    fn negative_numbers_stay_positional() {
        let (args, opts) = parse(&toks(&["-5"]));
        assert_eq!(args, vec!["-5"]);
        assert!(opts.is_empty());
        let (args, _) = parse(&toks(&["--12"]));
        assert_eq!(args, vec!["--12"]);
    }

    #[test]
    fn bare_dash_is_positional() {
        let (args, opts) = parse(&toks(&["-", "--"]));
        assert_eq!(args, vec!["-", "--"]);
        assert!(opts.is_empty());
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let (_, opts) = parse(&toks(&["--n=1", "--n=2"]));
        assert_eq!(opts.get("_n"), Some(&OptionValue::Str("2".into())));
    }

    #[test]
    fn positional_order_preserved() {
        let (args, _) = parse(&toks(&["b", "--f", "a", "c"]));
        assert_eq!(args, vec!["b", "a", "c"]);
    }

    #[test]
    fn underscores_in_typed_names_are_stripped() {
        let (_, opts) = parse(&toks(&["--_loud_"]));
        assert_eq!(opts.get("_loud"), Some(&OptionValue::Bool(true)));
    }

    #[test]
    fn display_names_round_trip() {
        assert_eq!(display_name("_a"), "-a");
        assert_eq!(display_name("_verbose"), "--verbose");
    }

    #[test]
    fn empty_value_after_equals() {
        let (_, opts) = parse(&toks(&["--name="]));
        assert_eq!(opts.get("_name"), Some(&OptionValue::Str(String::new())));
    }
}
