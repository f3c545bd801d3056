//! Matched chains.

use crate::error::TraceError;
use crate::trace::{Event, EventId, Trace};

/// One occurrence of a pattern: the matched events in trace order plus a label.
///
/// Chains refer to events by [`EventId`], so resolve them against the trace
/// they were matched on.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    label: String,
    events: Vec<EventId>,
    start_ts: f64,
    end_ts: f64,
}

impl Chain {
    /// `events` must be non-empty and in trace order.
    pub(crate) fn new(label: &str, events: Vec<EventId>, trace: &Trace) -> Self {
        let ts = |id: Option<&EventId>| id.map_or(0.0, |&id| trace[id].ts());
        Self {
            label: label.to_string(),
            start_ts: ts(events.first()),
            end_ts: ts(events.last()),
            events,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn set_label(&mut self, label: &str) {
        label.clone_into(&mut self.label);
    }

    /// Matched events in trace order
    pub fn events(&self) -> &[EventId] {
        &self.events
    }

    pub fn first(&self) -> Option<EventId> {
        self.events.first().copied()
    }

    pub fn last(&self) -> Option<EventId> {
        self.events.last().copied()
    }

    /// Timestamp of the first matched event, in milliseconds
    pub fn start_ts(&self) -> f64 {
        self.start_ts
    }

    /// Timestamp of the last matched event, in milliseconds
    pub fn end_ts(&self) -> f64 {
        self.end_ts
    }

    pub fn duration(&self) -> f64 {
        self.end_ts - self.start_ts
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// The chain as a begin/end pair named after its label, in scope `0/0`.
    pub fn as_event_pair(&self) -> Result<(Event, Event), TraceError> {
        Ok((
            Event::begin(self.label.as_str(), self.start_ts)?,
            Event::end(self.label.as_str(), self.end_ts)?,
        ))
    }
}
