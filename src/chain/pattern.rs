//! Compile pattern strings into match tokens.
//!
//! ```text
//! pattern := token+
//! token   := name '+' | name '-' | '*'
//! name    := one or more characters other than '+', '-', '*'
//! ```
//!
//! `name+` matches the begin of duration `name`, `name-` its end, and `*` a run
//! of other events between two named tokens. Whitespace around names is
//! ignored, so `a+ * a-` and `a+*a-` are the same pattern.

use std::fmt;
use std::str::FromStr;

use crate::error::TraceError;
use crate::trace::Phase;

/// Which side of a duration a named token matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Edge {
    Begin,
    End,
}

impl Edge {
    pub const fn phase(self) -> Phase {
        match self {
            Edge::Begin => Phase::DurationBegin,
            Edge::End => Phase::DurationEnd,
        }
    }

    const fn marker(self) -> char {
        match self {
            Edge::Begin => '+',
            Edge::End => '-',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Named { name: String, edge: Edge },
    Wildcard,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Named { name, edge } => write!(f, "{name}{}", edge.marker()),
            Token::Wildcard => f.write_str("*"),
        }
    }
}

/// A compiled pattern.
///
/// Never empty. Always starts and ends with a named token, and never has two
/// wildcards in a row.
///
/// # Examples
///
/// ```
/// use tracechain::chain::{Pattern, Token};
///
/// let pattern: Pattern = "request+*request-".parse().unwrap();
/// assert_eq!(pattern.tokens().len(), 3);
/// assert_eq!(pattern.tokens()[1], Token::Wildcard);
/// assert!("request+*".parse::<Pattern>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern {
    tokens: Vec<Token>,
}

impl Pattern {
    /// Parse `source` left to right.
    ///
    /// Fails with [`TraceError::InvalidPattern`] when the string is empty, a
    /// name is not followed by `+` or `-`, a `+`/`-` has no name, two
    /// wildcards are adjacent, or the pattern starts or ends with a wildcard.
    ///
    /// A `+` or `-` directly after `*` is accepted and ignored: `a+*-a-`
    /// compiles to the same tokens as `a+*a-`.
    pub fn compile(source: &str) -> Result<Self, TraceError> {
        let fail = |reason: String| Err(TraceError::invalid_pattern(source, reason));

        if source.trim().is_empty() {
            return fail("pattern is empty".to_string());
        }

        let mut tokens = Vec::new();
        let mut name_start = 0;
        // A marker right after `*` qualifies the wildcard rather than naming an event
        let mut after_wildcard = false;

        for (i, c) in source.char_indices() {
            let edge = match c {
                '+' => Edge::Begin,
                '-' => Edge::End,
                '*' => {
                    let pending = source[name_start..i].trim();
                    if !pending.is_empty() {
                        return fail(format!("event name `{pending}` must be followed by `+` or `-`"));
                    }
                    if matches!(tokens.last(), Some(Token::Wildcard)) {
                        return fail(format!("redundant wildcard at offset {i}"));
                    }
                    tokens.push(Token::Wildcard);
                    name_start = i + 1;
                    after_wildcard = true;
                    continue;
                }
                _ => continue,
            };

            let name = source[name_start..i].trim();
            name_start = i + 1;
            if name.is_empty() {
                if after_wildcard {
                    after_wildcard = false;
                    continue;
                }
                return fail(format!("`{c}` at offset {i} has no event name"));
            }
            after_wildcard = false;
            tokens.push(Token::Named {
                name: name.to_string(),
                edge,
            });
        }

        let trailing = source[name_start..].trim();
        if !trailing.is_empty() {
            return fail(format!(
                "event name `{trailing}` at the end must be followed by `+` or `-`"
            ));
        }

        match (tokens.first(), tokens.last()) {
            (Some(Token::Wildcard), _) => fail("pattern cannot start with a wildcard".to_string()),
            (_, Some(Token::Wildcard)) => fail("pattern cannot end with a wildcard".to_string()),
            (None, _) => fail("pattern has no tokens".to_string()),
            _ => {
                let pattern = Self { tokens };
                log::debug!("Compiled pattern {source:?} into {pattern}");
                Ok(pattern)
            }
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Event names referenced by the pattern, in token order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().filter_map(|t| match t {
            Token::Named { name, .. } => Some(name.as_str()),
            Token::Wildcard => None,
        })
    }
}

impl FromStr for Pattern {
    type Err = TraceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

/// Canonical form: tokens concatenated without whitespace.
impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for token in &self.tokens {
            write!(f, "{token}")?;
        }
        Ok(())
    }
}
