//! Accumulate chains from many patterns over one trace.

use std::collections::HashMap;
use std::io::Write;

use super::Chain;
use super::matcher::{ChainSpec, MatchOptions, ScanIndex, match_indexed, match_many_indexed};
use super::pattern::Pattern;
use crate::error::TraceError;
use crate::trace::{EventId, ExportOptions, Trace, to_chrome_trace, write_chrome_trace};

/// Runs patterns against a trace and keeps every chain found so far.
///
/// A chain that was already found (same first and last event) is renamed to
/// the latest label rather than added twice. [`TraceAnalyzer::chains`] is kept
/// sorted by start time.
///
/// # Examples
///
/// ```
/// use tracechain::chain::TraceAnalyzer;
/// use tracechain::trace::{Event, Trace};
///
/// let trace: Trace = [
///     Event::begin("receive", 1.0).unwrap(),
///     Event::end("receive", 3.0).unwrap(),
///     Event::begin("respond", 4.0).unwrap(),
///     Event::end("respond", 8.0).unwrap(),
/// ]
/// .into_iter()
/// .collect();
///
/// let mut analyzer = TraceAnalyzer::new(&trace);
/// analyzer.match_pattern("respond+*respond-", "response").unwrap();
/// analyzer.match_pattern("receive+*receive-", "request").unwrap();
///
/// let labels: Vec<&str> = analyzer.chains().iter().map(|c| c.label()).collect();
/// assert_eq!(labels, ["request", "response"]);
/// ```
pub struct TraceAnalyzer<'t> {
    trace: &'t Trace,
    index: ScanIndex<'t>,
    options: MatchOptions,
    chains: Vec<Chain>,
    by_span: HashMap<(EventId, EventId), usize>,
}

impl<'t> TraceAnalyzer<'t> {
    pub fn new(trace: &'t Trace) -> Self {
        Self::with_options(trace, MatchOptions::default())
    }

    pub fn with_options(trace: &'t Trace, options: MatchOptions) -> Self {
        Self {
            trace,
            index: ScanIndex::new(trace),
            options,
            chains: Vec::new(),
            by_span: HashMap::new(),
        }
    }

    pub fn trace(&self) -> &'t Trace {
        self.trace
    }

    /// Match `pattern` and record the chains under `label`.
    ///
    /// Returns the chains of this call, new and renamed. Fails only if
    /// `pattern` does not compile.
    pub fn match_pattern(&mut self, pattern: &str, label: &str) -> Result<Vec<Chain>, TraceError> {
        let pattern = Pattern::compile(pattern)?;
        Ok(self.match_compiled(&pattern, label))
    }

    /// Same as [`TraceAnalyzer::match_pattern`] with an already compiled pattern.
    pub fn match_compiled(&mut self, pattern: &Pattern, label: &str) -> Vec<Chain> {
        let found = match_indexed(&self.index, pattern, label, &self.options);
        self.record(&found);
        found
    }

    /// Match several patterns at once.
    ///
    /// Patterns are matched in parallel and recorded in the order of `specs`,
    /// so the outcome is the same as matching them one after another.
    pub fn match_specs(&mut self, specs: &[ChainSpec]) -> Vec<Vec<Chain>> {
        let found = match_many_indexed(&self.index, specs, &self.options);
        for chains in &found {
            self.record(chains);
        }
        found
    }

    fn record(&mut self, found: &[Chain]) {
        let mut added = 0;

        for chain in found {
            let (Some(first), Some(last)) = (chain.first(), chain.last()) else {
                continue;
            };
            match self.by_span.get(&(first, last)) {
                Some(&at) => {
                    log::debug!("Renaming chain {} to {}", self.chains[at].label(), chain.label());
                    self.chains[at].set_label(chain.label());
                }
                None => {
                    self.chains.push(chain.clone());
                    added += 1;
                }
            }
        }

        if added > 0 {
            // Stable, so chains starting together keep the order they were found in
            self.chains
                .sort_by(|a, b| a.start_ts().total_cmp(&b.start_ts()));
            self.by_span = self
                .chains
                .iter()
                .enumerate()
                .filter_map(|(at, chain)| Some(((chain.first()?, chain.last()?), at)))
                .collect();
        }
    }

    /// Every chain found so far, ordered by start time
    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    /// The trace plus all accumulated chains as Chrome Trace Format JSON.
    pub fn to_chrome_trace(&self, options: &ExportOptions) -> Result<String, TraceError> {
        to_chrome_trace(self.trace, &self.chains, options)
    }

    pub fn write_chrome_trace<W: Write>(
        &self,
        writer: W,
        options: &ExportOptions,
    ) -> Result<(), TraceError> {
        write_chrome_trace(writer, self.trace, &self.chains, options)
    }
}
