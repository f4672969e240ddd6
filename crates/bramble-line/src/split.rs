//! Quoting- and comment-aware line tokenization.
//!
//! Splits an input line on whitespace (commas count as whitespace), groups
//! quoted runs into single tokens, and truncates everything at an unquoted
//! semicolon. Alongside the token list it preserves the line as typed, up to
//! the same comment cut, so downstream code never has to reconstruct "the
//! rest of the line" by re-joining tokens.

/// Result of tokenizing one input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Tokens in input order, quotes consumed, comment stripped.
    pub tokens: Vec<String>,
    /// The line exactly as typed, up to the comment cut, trailing
    /// whitespace trimmed. No comma splitting, no quote removal.
    pub verbatim: String,
}

/// Quote characters that group text into a single token.
const QUOTES: &[char] = &['"', '\'', '`'];

/// Quote characters inside which a backslash still escapes the closing
/// quote and itself.
const ESCAPED_QUOTES: &[char] = &['"'];

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

/// Tokenize `line`.
///
/// Rules:
/// - whitespace and commas separate tokens;
/// - `"`, `'`, and `` ` `` group text into one token (marks consumed);
/// - a backslash outside single quotes/backticks escapes the next character;
/// - an unquoted, unescaped `;` truncates both the token stream and the
///   verbatim remainder;
/// - an unterminated quote is implicitly closed at end of input.
///
/// This function never fails; every input line produces a `Split`.
///
/// ```rust
/// use bramble_line::split;
///
/// let s = split("a b \"c d\" ; tail");
/// assert_eq!(s.tokens, vec!["a", "b", "c d"]);
/// assert_eq!(s.verbatim, "a b \"c d\"");
/// ```
pub fn split(line: &str) -> Split {
    let mut tokens = Vec::new();
    let mut current = String::new();
    // A quoted empty string ("") is a real, empty token; plain separators
    // between tokens are not. Track "token started" separately from content.
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut cut = line.len();

    let mut chars = line.char_indices().peekable();
    while let Some((idx, c)) = chars.next() {
        if let Some(q) = quote {
            if c == q {
                quote = None;
            } else if c == '\\' && ESCAPED_QUOTES.contains(&q) {
                match chars.peek().copied() {
                    Some((_, next)) if next == q || next == '\\' => {
                        chars.next();
                        current.push(next);
                    }
                    _ => current.push(c),
                }
            } else {
                current.push(c);
            }
            continue;
        }

        match c {
            ';' => {
                cut = idx;
                break;
            }
            c if is_separator(c) => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            '\\' => {
                in_token = true;
                if let Some((_, next)) = chars.next() {
                    current.push(next);
                }
                // A trailing lone backslash is dropped, as in POSIX shells.
            }
            c if QUOTES.contains(&c) => {
                in_token = true;
                quote = Some(c);
            }
            c => {
                in_token = true;
                current.push(c);
            }
        }
    }

    // Unterminated quotes close implicitly; whatever was gathered is a token.
    if in_token {
        tokens.push(current);
    }

    Split {
        tokens,
        verbatim: line[..cut].trim_end().to_string(),
    }
}
