//! Trace events: the unit the matcher scans and the exporter serializes.
//!
//! An [`Event`] is validated once at construction and never changes after it
//! has been added to a [`Trace`](super::Trace). Timestamps are milliseconds;
//! conversion to microseconds happens only on export.

use std::fmt;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::TraceError;

/// Free-form key/value metadata attached to an event, exported as `args`.
pub type Args = IndexMap<String, Value>;

/// The role of an event in the trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// Opens a duration; closed by a `DurationEnd` with the same name in the same scope
    DurationBegin,
    /// Closes the most recent open duration with the same name in the same scope
    DurationEnd,
    /// A point in time with no duration
    Instant,
    /// Start of a flow arrow, possibly into another scope
    FlowBegin,
    /// End of a flow arrow
    FlowEnd,
}

impl Phase {
    /// Single-character Trace Event Format code (`ph` field).
    pub const fn code(self) -> &'static str {
        match self {
            Phase::DurationBegin => "B",
            Phase::DurationEnd => "E",
            Phase::Instant => "I",
            Phase::FlowBegin => "s",
            Phase::FlowEnd => "f",
        }
    }

    /// Inverse of [`Phase::code`]. Lowercase `i` is accepted for instants.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(Phase::DurationBegin),
            "E" => Some(Phase::DurationEnd),
            "I" | "i" => Some(Phase::Instant),
            "s" => Some(Phase::FlowBegin),
            "f" => Some(Phase::FlowEnd),
            _ => None,
        }
    }

    pub const fn is_flow(self) -> bool {
        matches!(self, Phase::FlowBegin | Phase::FlowEnd)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The logical execution context of an event.
///
/// Begin/End events only pair up inside one scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Scope {
    pub pid: u64,
    pub tid: u64,
}

impl Scope {
    pub const fn new(pid: u64, tid: u64) -> Self {
        Self { pid, tid }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.pid, self.tid)
    }
}

/// A single trace event.
///
/// # Examples
///
/// ```
/// use tracechain::trace::{Event, Phase};
///
/// let event = Event::begin("request", 1.5)
///     .unwrap()
///     .with_pid(3)
///     .with_arg("bytes", 512);
/// assert_eq!(event.phase(), Phase::DurationBegin);
/// assert_eq!(event.pid(), 3);
/// assert_eq!(event.tid(), 0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    name: String,
    phase: Phase,
    ts: f64,
    scope: Scope,
    id: Option<u64>,
    args: Args,
}

impl Event {
    /// Create an event in scope `0/0` with no metadata.
    ///
    /// Fails with [`TraceError::InvalidEvent`] if `name` is empty or `ts` is
    /// negative, NaN or infinite.
    pub fn new(name: impl Into<String>, phase: Phase, ts: f64) -> Result<Self, TraceError> {
        let name = name.into();
        if name.is_empty() {
            return Err(TraceError::invalid_event(&name, "event name is empty"));
        }
        if !ts.is_finite() {
            return Err(TraceError::invalid_event(
                &name,
                format!("timestamp {ts} is not a finite number"),
            ));
        }
        if ts < 0.0 {
            return Err(TraceError::invalid_event(
                &name,
                format!("timestamp {ts} is negative"),
            ));
        }

        Ok(Self {
            name,
            phase,
            ts,
            scope: Scope::default(),
            id: None,
            args: Args::new(),
        })
    }

    pub fn begin(name: impl Into<String>, ts: f64) -> Result<Self, TraceError> {
        Self::new(name, Phase::DurationBegin, ts)
    }

    pub fn end(name: impl Into<String>, ts: f64) -> Result<Self, TraceError> {
        Self::new(name, Phase::DurationEnd, ts)
    }

    pub fn instant(name: impl Into<String>, ts: f64) -> Result<Self, TraceError> {
        Self::new(name, Phase::Instant, ts)
    }

    /// Flow start bound to flow `id`. A flow end with the same name and id completes it.
    pub fn flow_begin(name: impl Into<String>, ts: f64, id: u64) -> Result<Self, TraceError> {
        Ok(Self::new(name, Phase::FlowBegin, ts)?.with_id(id))
    }

    pub fn flow_end(name: impl Into<String>, ts: f64, id: u64) -> Result<Self, TraceError> {
        Ok(Self::new(name, Phase::FlowEnd, ts)?.with_id(id))
    }

    pub fn with_pid(mut self, pid: u64) -> Self {
        self.scope.pid = pid;
        self
    }

    pub fn with_tid(mut self, tid: u64) -> Self {
        self.scope.tid = tid;
        self
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Bind id, exported as `id`. Only meaningful for flow events.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    pub fn with_args<K, V>(mut self, args: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.args
            .extend(args.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Timestamp in milliseconds
    pub fn ts(&self) -> f64 {
        self.ts
    }

    pub fn pid(&self) -> u64 {
        self.scope.pid
    }

    pub fn tid(&self) -> u64 {
        self.scope.tid
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn args(&self) -> &Args {
        &self.args
    }
}
