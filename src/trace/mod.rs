//! Trace events, the ordered trace store and Chrome Trace Format export.
//!
//! # Features
//!
//! - **Event model**: typed events with phase, timestamp, scope and metadata
//! - **Trace store**: append-only, always read in timestamp order
//! - **Trace parsing**: `[trace]` log lines into events
//! - **Chrome Trace Format**: export for chrome://tracing or Perfetto visualization
//!
//! # Usage
//!
//! ```bash
//! # Export a trace log as Chrome Trace Format
//! tracechain export app.log > trace.json
//!
//! # Add every request chain on its own track
//! tracechain match app.log -p 'request+*request-' -l request > trace.json
//!
//! # Visualize: open trace.json in chrome://tracing or https://ui.perfetto.dev
//! ```

pub mod chrome;
mod event;
pub mod parse;
mod store;

// Re-export main types for convenience
pub use chrome::{ExportOptions, to_chrome_trace, write_chrome_trace};
pub use event::{Args, Event, Phase, Scope};
pub use parse::{parse_line, parse_lines, parse_trace};
pub use store::{EventId, Trace};
