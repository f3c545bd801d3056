//! Chrome Trace Format output for traces and matched chains.
//!
//! Converts a [`Trace`] plus any number of [`Chain`]s to Trace Event Format
//! JSON, which can be visualized in chrome://tracing or <https://ui.perfetto.dev>.
//!
//! # Records
//!
//! - **Trace events**: one record per event, in trace order, with
//!   `name`, `ts` (microseconds), `pid`, `tid`, `args` and `ph`
//!   (`B`, `E`, `I`, `s`, `f`). Flow records also carry their `id`.
//! - **Chains**: a synthetic `B`/`E` pair per chain, named by the chain label,
//!   placed on a dedicated process so viewers draw chains on their own track.
//! - **Names**: process and thread names become `M` metadata records.
//!
//! # Format Reference
//!
//! - [Trace Event Format](https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU/)
//! - [Perfetto UI](https://ui.perfetto.dev)

use std::borrow::Cow;
use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use super::event::{Args, Phase};
use super::store::Trace;
use crate::chain::Chain;
use crate::error::TraceError;

/// Where matched chains go in the exported trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Process ID for chain records. Must not be used by any event in the trace.
    pub chain_pid: u64,
    /// Thread ID for chain records
    pub chain_tid: u64,
    /// Optional process name shown for the chain process
    pub chain_process_name: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            chain_pid: 1000,
            chain_tid: 0,
            chain_process_name: None,
        }
    }
}

impl ExportOptions {
    pub fn with_chain_pid(chain_pid: u64) -> Self {
        Self {
            chain_pid,
            ..Self::default()
        }
    }
}

/// A Chrome Trace Event in the Trace Event Format.
#[derive(Debug, Serialize)]
struct TraceRecord<'a> {
    /// Event name (displayed in the UI)
    name: &'a str,
    /// Timestamp in microseconds. Metadata records have none.
    #[serde(skip_serializing_if = "Option::is_none")]
    ts: Option<f64>,
    pid: u64,
    tid: u64,
    /// Custom arguments (shown when event is selected in UI)
    args: Cow<'a, Args>,
    /// Phase code
    ph: &'static str,
    /// Flow binding id (flow records only)
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
}

/// The top-level Chrome Trace Format structure.
#[derive(Debug, Serialize)]
struct ChromeTrace<'a> {
    #[serde(rename = "traceEvents")]
    trace_events: Vec<TraceRecord<'a>>,
    /// Display time unit preference
    #[serde(rename = "displayTimeUnit")]
    display_time_unit: &'static str,
}

fn ms_to_us(ms: f64) -> f64 {
    ms * 1000.0
}

fn name_args(name: &str) -> Cow<'static, Args> {
    let mut args = Args::new();
    args.insert("name".to_string(), Value::from(name));
    Cow::Owned(args)
}

fn metadata_record<'a>(kind: &'static str, pid: u64, tid: u64, name: &str) -> TraceRecord<'a> {
    TraceRecord {
        name: kind,
        ts: None,
        pid,
        tid,
        args: name_args(name),
        ph: "M",
        id: None,
    }
}

fn build<'a>(
    trace: &'a Trace,
    chains: &'a [Chain],
    options: &'a ExportOptions,
) -> Result<ChromeTrace<'a>, TraceError> {
    if !chains.is_empty() && trace.has_process(options.chain_pid) {
        return Err(TraceError::Export {
            message: format!(
                "chain pid {} is already used by events in the trace",
                options.chain_pid
            ),
        });
    }

    let mut trace_events: Vec<TraceRecord<'a>> = trace
        .events()
        .map(|event| TraceRecord {
            name: event.name(),
            ts: Some(ms_to_us(event.ts())),
            pid: event.pid(),
            tid: event.tid(),
            args: Cow::Borrowed(event.args()),
            ph: event.phase().code(),
            id: event.phase().is_flow().then_some(event.id()).flatten(),
        })
        .collect();

    for chain in chains {
        for (phase, ts) in [
            (Phase::DurationBegin, chain.start_ts()),
            (Phase::DurationEnd, chain.end_ts()),
        ] {
            trace_events.push(TraceRecord {
                name: chain.label(),
                ts: Some(ms_to_us(ts)),
                pid: options.chain_pid,
                tid: options.chain_tid,
                args: Cow::Owned(Args::new()),
                ph: phase.code(),
                id: None,
            });
        }
    }

    for (pid, name) in trace.process_names() {
        trace_events.push(metadata_record("process_name", pid, 0, name));
    }
    if let Some(name) = &options.chain_process_name
        && !chains.is_empty()
    {
        trace_events.push(metadata_record(
            "process_name",
            options.chain_pid,
            0,
            name,
        ));
    }
    for (scope, name) in trace.thread_names() {
        trace_events.push(metadata_record("thread_name", scope.pid, scope.tid, name));
    }

    Ok(ChromeTrace {
        trace_events,
        display_time_unit: "ms",
    })
}

/// Convert a trace and its matched chains to Chrome Trace Format JSON.
///
/// Returns pretty-printed JSON suitable for chrome://tracing or Perfetto.
/// Fails if chains are exported onto a process the trace already uses.
pub fn to_chrome_trace(
    trace: &Trace,
    chains: &[Chain],
    options: &ExportOptions,
) -> Result<String, TraceError> {
    let chrome_trace = build(trace, chains, options)?;
    serde_json::to_string_pretty(&chrome_trace).map_err(|e| TraceError::Export {
        message: e.to_string(),
    })
}

/// Same as [`to_chrome_trace`], streaming into `writer`.
pub fn write_chrome_trace<W: Write>(
    writer: W,
    trace: &Trace,
    chains: &[Chain],
    options: &ExportOptions,
) -> Result<(), TraceError> {
    let chrome_trace = build(trace, chains, options)?;
    serde_json::to_writer_pretty(writer, &chrome_trace).map_err(|e| TraceError::Export {
        message: e.to_string(),
    })
}
