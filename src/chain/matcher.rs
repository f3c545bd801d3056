//! Find every occurrence of a pattern in a trace.
//!
//! The trace is scanned in timestamp order. Each unclaimed event that satisfies
//! the first token opens a candidate; the candidate walks forward through the
//! events of its own scope:
//!
//! - a named token must match the very next event in scope, or the candidate fails;
//! - a wildcard absorbs events in scope until one matches the following named
//!   token. With [`WildcardMode::NoRepeat`], absorbing the same `(name, phase)`
//!   twice in one run is not allowed, so a repeating background event ends the
//!   run there.
//!
//! When an event could either end a wildcard run or be absorbed by it, ending
//! the run is tried first and absorbing is the fallback. Each candidate is a
//! small state machine explored depth-first with an explicit stack; states
//! already explored are not revisited. States from which a candidate failed are
//! remembered for the rest of the scan, so later candidates that reach them
//! stop there instead of walking the same events again.
//!
//! A successful candidate becomes a [`Chain`] and claims its events. Later
//! candidates cannot use claimed events, so chains never overlap. Events of other
//! scopes are invisible to a candidate unless a flow it absorbed leads there.

use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::Chain;
use super::pattern::{Pattern, Token};
use crate::trace::{Event, EventId, Phase, Scope, Trace};

/// How wildcards treat repeated events.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum WildcardMode {
    /// A wildcard run never absorbs the same `(name, phase)` twice
    #[default]
    NoRepeat,
    /// A wildcard run absorbs anything until the next token matches
    Unrestricted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOptions {
    pub wildcard: WildcardMode,
}

/// A pattern together with the label its chains get.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSpec {
    pub label: String,
    pub pattern: Pattern,
}

impl ChainSpec {
    pub fn new(label: impl Into<String>, pattern: Pattern) -> Self {
        Self {
            label: label.into(),
            pattern,
        }
    }
}

/// Interned `(name, phase)` pair
type Kind = u32;

/// One step of a compiled pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// The next event in scope must be of this kind
    Exact(Kind),
    /// Absorb events in scope until one of this kind
    Until(Kind),
}

/// Trace events in trace order with their kinds interned.
pub(super) struct ScanIndex<'t> {
    trace: &'t Trace,
    kinds: Vec<Kind>,
    kind_of: HashMap<(&'t str, Phase), Kind>,
}

impl<'t> ScanIndex<'t> {
    pub(super) fn new(trace: &'t Trace) -> Self {
        let mut kind_of = HashMap::new();
        let kinds = trace
            .events()
            .map(|e| {
                let next = kind_of.len() as Kind;
                *kind_of.entry((e.name(), e.phase())).or_insert(next)
            })
            .collect();
        Self {
            trace,
            kinds,
            kind_of,
        }
    }

    fn event(&self, pos: usize) -> &'t Event {
        &self.trace[self.trace.ids()[pos]]
    }

    /// Compile pattern tokens to steps. `None` if the pattern names an event
    /// the trace never contains, in which case nothing can match.
    fn steps(&self, pattern: &Pattern) -> Option<Vec<Step>> {
        let mut steps = Vec::with_capacity(pattern.tokens().len());
        let mut wildcard = false;
        for token in pattern.tokens() {
            match token {
                Token::Wildcard => wildcard = true,
                Token::Named { name, edge } => {
                    let Some(&kind) = self.kind_of.get(&(name.as_str(), edge.phase())) else {
                        log::debug!("Event {name}{} never occurs in the trace", edge.phase());
                        return None;
                    };
                    steps.push(if wildcard {
                        Step::Until(kind)
                    } else {
                        Step::Exact(kind)
                    });
                    wildcard = false;
                }
            }
        }
        Some(steps)
    }
}

/// Flows a candidate has entered but not left: `(name, id)`
type FlowKey<'t> = (&'t str, Option<u64>);

/// Everything that decides how a candidate can continue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct State<'t> {
    /// Index of the step to satisfy next
    step: usize,
    /// Next trace position to look at
    pos: usize,
    /// Kinds absorbed by the current wildcard run, sorted. Empty when repeats are allowed.
    run: Vec<Kind>,
    /// Scopes the candidate may draw events from, sorted
    scopes: Vec<Scope>,
    /// Open flows, sorted
    flows: Vec<FlowKey<'t>>,
}

#[derive(Debug, Clone)]
struct Candidate<'t> {
    state: State<'t>,
    consumed: Vec<usize>,
}

fn insert_sorted<T: Ord>(items: &mut Vec<T>, item: T) {
    if let Err(at) = items.binary_search(&item) {
        items.insert(at, item);
    }
}

impl<'t> Candidate<'t> {
    fn open(index: &ScanIndex<'t>, start: usize) -> Self {
        Self {
            state: State {
                step: 1,
                pos: start + 1,
                run: Vec::new(),
                scopes: vec![index.event(start).scope()],
                flows: Vec::new(),
            },
            consumed: vec![start],
        }
    }

    /// Whether `event` is visible to this candidate.
    fn in_scope(&self, event: &'t Event) -> bool {
        if self.state.scopes.binary_search(&event.scope()).is_ok() {
            return true;
        }
        event.phase() == Phase::FlowEnd
            && self
                .state
                .flows
                .binary_search(&(event.name(), event.id()))
                .is_ok()
    }

    /// The next visible event, unless it is already part of another chain.
    fn next_position(&self, index: &ScanIndex<'t>, claimed: &[bool]) -> Option<usize> {
        (self.state.pos..index.kinds.len())
            .find(|&pos| self.in_scope(index.event(pos)))
            .filter(|&pos| !claimed[pos])
    }

    fn take(&mut self, index: &ScanIndex<'t>, pos: usize) {
        let event = index.event(pos);
        match event.phase() {
            Phase::FlowBegin => insert_sorted(&mut self.state.flows, (event.name(), event.id())),
            Phase::FlowEnd => {
                let key = (event.name(), event.id());
                if let Ok(at) = self.state.flows.binary_search(&key) {
                    self.state.flows.remove(at);
                }
                insert_sorted(&mut self.state.scopes, event.scope());
            }
            _ => {}
        }
        self.consumed.push(pos);
        self.state.pos = pos + 1;
    }

    /// Consume `pos` for the current step.
    fn advance(mut self, index: &ScanIndex<'t>, pos: usize) -> Self {
        self.take(index, pos);
        self.state.run.clear();
        self.state.step += 1;
        self
    }

    /// Consume `pos` into the current wildcard run.
    fn absorb(mut self, index: &ScanIndex<'t>, pos: usize, mode: WildcardMode) -> Self {
        self.take(index, pos);
        if mode == WildcardMode::NoRepeat {
            insert_sorted(&mut self.state.run, index.kinds[pos]);
        }
        self
    }
}

/// Run one candidate from `start` to its first successful completion.
///
/// `failed` holds states that cannot complete. The outcome of a state depends
/// only on the state and on `claimed`, and `claimed` only grows during a scan,
/// so a state that failed once fails for every later candidate too. When this
/// candidate fails, every state it explored is added.
fn search<'t>(
    index: &ScanIndex<'t>,
    steps: &[Step],
    start: usize,
    claimed: &[bool],
    mode: WildcardMode,
    failed: &mut HashSet<State<'t>>,
) -> Option<Vec<usize>> {
    let initial = Candidate::open(index, start);
    if steps.len() == 1 {
        return Some(initial.consumed);
    }

    let mut stack = vec![initial];
    let mut explored = HashSet::new();

    while let Some(candidate) = stack.pop() {
        if failed.contains(&candidate.state) || !explored.insert(candidate.state.clone()) {
            continue;
        }
        let Some(pos) = candidate.next_position(index, claimed) else {
            log::trace!(
                "Candidate at {start} ran out of events at step {}",
                candidate.state.step
            );
            continue;
        };
        let kind = index.kinds[pos];

        let next = match steps[candidate.state.step] {
            Step::Exact(wanted) => (kind == wanted).then(|| candidate.advance(index, pos)),
            Step::Until(wanted) => {
                let repeat = candidate.state.run.binary_search(&kind).is_ok();
                if !repeat {
                    // Lower priority: keep absorbing
                    stack.push(candidate.clone().absorb(index, pos, mode));
                }
                (kind == wanted).then(|| candidate.advance(index, pos))
            }
        };

        if let Some(next) = next {
            if next.state.step == steps.len() {
                return Some(next.consumed);
            }
            stack.push(next);
        }
    }

    failed.extend(explored);
    None
}

pub(super) fn match_indexed(
    index: &ScanIndex<'_>,
    pattern: &Pattern,
    label: &str,
    options: &MatchOptions,
) -> Vec<Chain> {
    let Some(steps) = index.steps(pattern) else {
        return Vec::new();
    };
    let Some(&Step::Exact(first)) = steps.first() else {
        return Vec::new();
    };

    let ids = index.trace.ids();
    let mut claimed = vec![false; ids.len()];
    let mut chains = Vec::new();
    let mut failed = HashSet::new();

    for start in 0..ids.len() {
        if claimed[start] || index.kinds[start] != first {
            continue;
        }
        log::trace!("Trying {pattern} from position {start}");
        if let Some(consumed) = search(index, &steps, start, &claimed, options.wildcard, &mut failed) {
            for &pos in &consumed {
                claimed[pos] = true;
            }
            let events: Vec<EventId> = consumed.iter().map(|&pos| ids[pos]).collect();
            let chain = Chain::new(label, events, index.trace);
            log::trace!("Found {label} spanning {} events", chain.event_count());
            chains.push(chain);
        }
    }

    log::debug!(
        "Pattern {pattern} matched {} chains in {} events",
        chains.len(),
        ids.len()
    );
    chains
}

/// Find all chains of `pattern` in `trace`, with default options.
///
/// # Examples
///
/// ```
/// use tracechain::chain::{Pattern, match_chains};
/// use tracechain::trace::{Event, Trace};
///
/// let mut trace = Trace::new();
/// trace.add_events([
///     Event::begin("request", 1.0).unwrap(),
///     Event::begin("parse", 2.0).unwrap(),
///     Event::end("parse", 3.0).unwrap(),
///     Event::end("request", 4.0).unwrap(),
/// ]);
///
/// let pattern = Pattern::compile("request+*request-").unwrap();
/// let chains = match_chains(&trace, &pattern, "request");
/// assert_eq!(chains.len(), 1);
/// assert_eq!(chains[0].event_count(), 4);
/// ```
pub fn match_chains(trace: &Trace, pattern: &Pattern, label: &str) -> Vec<Chain> {
    match_chains_with(trace, pattern, label, &MatchOptions::default())
}

/// Find all chains of `pattern` in `trace`.
///
/// Chains are returned in order of their first event and never share events.
/// No match is an empty result.
pub fn match_chains_with(
    trace: &Trace,
    pattern: &Pattern,
    label: &str,
    options: &MatchOptions,
) -> Vec<Chain> {
    match_indexed(&ScanIndex::new(trace), pattern, label, options)
}

/// Match several independent patterns against one trace in parallel.
///
/// Results are in the order of `specs`, identical to matching each spec alone.
pub fn match_many(trace: &Trace, specs: &[ChainSpec], options: &MatchOptions) -> Vec<Vec<Chain>> {
    match_many_indexed(&ScanIndex::new(trace), specs, options)
}

pub(super) fn match_many_indexed(
    index: &ScanIndex<'_>,
    specs: &[ChainSpec],
    options: &MatchOptions,
) -> Vec<Vec<Chain>> {
    specs
        .par_iter()
        .map(|spec| match_indexed(index, &spec.pattern, &spec.label, options))
        .collect()
}
