//! The append-only, timestamp-ordered event store.
//!
//! Events live in an arena in insertion order and are addressed by [`EventId`].
//! A separate index keeps the ids sorted by timestamp, so reads never sort and
//! chains can hold ids that stay valid while the trace keeps growing.

use std::collections::BTreeMap;
use std::ops::Index;

use indexmap::IndexMap;

use super::event::{Event, Scope};
use crate::error::TraceError;

/// How far a flow end is placed before the event it points at, in milliseconds.
///
/// Viewers bind a flow end to the next slice that begins after it, so it has
/// to come strictly before the destination.
const FLOW_END_LEAD_MS: f64 = 1e-6;

/// Handle to an event inside one [`Trace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(usize);

impl EventId {
    /// Position in insertion order
    pub fn index(self) -> usize {
        self.0
    }
}

/// A chronological log of events.
///
/// Reads are always in non-decreasing timestamp order; events with equal
/// timestamps keep their insertion order.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    events: Vec<Event>,
    order: Vec<EventId>,
    process_names: BTreeMap<u64, String>,
    thread_names: BTreeMap<Scope, String>,
    flow_ids: IndexMap<String, u64>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event after every event with a timestamp `<=` its own.
    pub fn add_event(&mut self, event: Event) -> EventId {
        let id = EventId(self.events.len());
        let events = &self.events;
        let pos = self
            .order
            .partition_point(|existing| events[existing.0].ts() <= event.ts());
        self.events.push(event);
        self.order.insert(pos, id);
        id
    }

    /// Same as calling [`Trace::add_event`] for each event in order.
    pub fn add_events(&mut self, events: impl IntoIterator<Item = Event>) -> Vec<EventId> {
        events.into_iter().map(|e| self.add_event(e)).collect()
    }

    /// Link two events with a flow arrow.
    ///
    /// Adds a flow start at `src` in the source scope and a flow end just before
    /// `dest` in the destination scope. Flows with the same name share an id.
    /// The flow start follows `src` in its scope, so a pattern that names the
    /// event after `src` needs a wildcard to step over it.
    pub fn add_flow(
        &mut self,
        name: &str,
        src: EventId,
        dest: EventId,
    ) -> Result<(EventId, EventId), TraceError> {
        let (src_ts, src_scope) = match self.get(src) {
            Some(e) => (e.ts(), e.scope()),
            None => return Err(TraceError::invalid_event(name, "flow source is not in this trace")),
        };
        let (dest_ts, dest_scope) = match self.get(dest) {
            Some(e) => (e.ts(), e.scope()),
            None => {
                return Err(TraceError::invalid_event(
                    name,
                    "flow destination is not in this trace",
                ));
            }
        };

        let next_id = self.flow_ids.len() as u64;
        let flow_id = *self.flow_ids.entry(name.to_string()).or_insert(next_id);

        let start = Event::flow_begin(name, src_ts, flow_id)?.with_scope(src_scope);
        let finish = Event::flow_end(name, (dest_ts - FLOW_END_LEAD_MS).max(0.0), flow_id)?
            .with_scope(dest_scope);

        Ok((self.add_event(start), self.add_event(finish)))
    }

    pub fn set_process_name(&mut self, pid: u64, name: impl Into<String>) {
        self.process_names.insert(pid, name.into());
    }

    pub fn set_thread_name(&mut self, pid: u64, tid: u64, name: impl Into<String>) {
        self.thread_names.insert(Scope::new(pid, tid), name.into());
    }

    /// Events in trace order. Restartable: clone the iterator to scan again.
    pub fn events(&self) -> impl Iterator<Item = &Event> + Clone + '_ {
        self.order.iter().map(move |id| &self.events[id.0])
    }

    /// Event ids in trace order
    pub fn ids(&self) -> &[EventId] {
        &self.order
    }

    pub fn get(&self, id: EventId) -> Option<&Event> {
        self.events.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn process_names(&self) -> impl Iterator<Item = (u64, &str)> {
        self.process_names
            .iter()
            .map(|(pid, name)| (*pid, name.as_str()))
    }

    pub fn thread_names(&self) -> impl Iterator<Item = (Scope, &str)> {
        self.thread_names
            .iter()
            .map(|(scope, name)| (*scope, name.as_str()))
    }

    /// Whether any event runs in process `pid`
    pub fn has_process(&self, pid: u64) -> bool {
        self.events.iter().any(|e| e.pid() == pid)
    }
}

impl Index<EventId> for Trace {
    type Output = Event;

    fn index(&self, id: EventId) -> &Event {
        &self.events[id.0]
    }
}

impl FromIterator<Event> for Trace {
    fn from_iter<I: IntoIterator<Item = Event>>(iter: I) -> Self {
        let mut trace = Trace::new();
        trace.add_events(iter);
        trace
    }
}
