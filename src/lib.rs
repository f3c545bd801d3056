//! Find higher-level event chains in execution traces.
//!
//! A [`trace::Trace`] holds timestamped events; a [`chain::Pattern`] such as
//! `request+*request-` describes a sequence of them. Matching yields
//! [`chain::Chain`]s, which export alongside the trace as Chrome Trace Format
//! JSON for chrome://tracing or Perfetto.

pub mod chain;
pub mod config;
pub mod display;
mod error;
pub mod styling;
pub mod trace;

pub use error::TraceError;
