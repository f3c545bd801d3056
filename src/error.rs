//! Tracechain error types and formatting
//!
//! **`TraceError`** is a typed enum for domain errors that can be pattern-matched
//! and tested. Use `.into()` to convert to `anyhow::Error` while preserving the
//! type for pattern matching. Display produces styled output for users.
//!
//! Errors are raised where the bad input enters: event construction, pattern
//! compilation, line parsing or serialization. Matching itself never fails.

use color_print::cwrite;

use crate::styling::{ERROR_EMOJI, HINT_EMOJI};

/// Domain errors for trace construction, pattern compilation and export.
///
/// # Usage
///
/// ```ignore
/// // Return a typed error (Display produces styled output)
/// return Err(TraceError::InvalidPattern { pattern: "a+*".into(), reason: "...".into() }.into());
///
/// // Pattern match on errors
/// if let Some(TraceError::InvalidPattern { pattern, .. }) = err.downcast_ref() {
///     println!("Bad pattern {}", pattern);
/// }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum TraceError {
    /// An event could not be constructed (empty name, negative or non-finite timestamp).
    InvalidEvent { name: String, reason: String },
    /// A pattern string does not follow the `name+ | name- | *` grammar.
    InvalidPattern { pattern: String, reason: String },
    /// A `[trace]` log line was recognized but could not be turned into an event.
    Parse { line: usize, message: String },
    /// The Chrome Trace output could not be produced or written.
    Export { message: String },
}

impl TraceError {
    pub(crate) fn invalid_event(name: &str, reason: impl Into<String>) -> Self {
        TraceError::InvalidEvent {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_pattern(pattern: &str, reason: impl Into<String>) -> Self {
        TraceError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

impl std::error::Error for TraceError {}

impl std::fmt::Display for TraceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TraceError::InvalidEvent { name, reason } => {
                if name.is_empty() {
                    cwrite!(f, "{ERROR_EMOJI} <red>Invalid event: {reason}</>")
                } else {
                    cwrite!(
                        f,
                        "{ERROR_EMOJI} <red>Invalid event <bold>{name}</>: {reason}</>"
                    )
                }
            }

            TraceError::InvalidPattern { pattern, reason } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Invalid pattern <bold>{pattern}</>: {reason}</>\n\n{HINT_EMOJI} <dim>Compose patterns from </>name+<dim>, </>name-<dim> and </>*<dim>, e.g. </>request+*request-"
                )
            }

            TraceError::Parse { line, message } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Malformed trace line {line}: {message}</>\n\n{HINT_EMOJI} <dim>Trace lines look like </>[trace] ts=1.5 pid=1 tid=2 ph=B name=\"request\""
                )
            }

            TraceError::Export { message } => {
                cwrite!(f, "{ERROR_EMOJI} <red>Failed to export trace: {message}</>")
            }
        }
    }
}
