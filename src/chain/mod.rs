//! Pattern matching over traces.
//!
//! A [`Pattern`] such as `request+*request-` describes a sequence of events;
//! matching it against a [`Trace`](crate::trace::Trace) yields one [`Chain`] per
//! occurrence. [`TraceAnalyzer`] keeps the chains of many patterns together for
//! export.

mod analyzer;
mod matcher;
mod model;
mod pattern;

pub use analyzer::TraceAnalyzer;
pub use matcher::{
    ChainSpec, MatchOptions, WildcardMode, match_chains, match_chains_with, match_many,
};
pub use model::Chain;
pub use pattern::{Edge, Pattern, Token};
