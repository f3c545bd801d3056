//! Human-readable listings of events and chains.
//!
//! - Events: `[<ts> ms]: <name> (<phase code>)`
//! - Chains: `[<start> - <end> ms]: <label> (<n> events)`
//!
//! Timestamps use the shortest exact form, so `1.0` prints as `1`.

use crate::chain::Chain;
use crate::styling::{CHAIN_LABEL, TIMESTAMP};
use crate::trace::{Event, Trace};

pub fn format_event(event: &Event) -> String {
    format!("[{} ms]: {} ({})", event.ts(), event.name(), event.phase())
}

pub fn format_chain(chain: &Chain) -> String {
    format!(
        "[{} - {} ms]: {} ({} events)",
        chain.start_ts(),
        chain.end_ts(),
        chain.label(),
        chain.event_count()
    )
}

/// One line per event, in trace order
pub fn format_trace(trace: &Trace) -> String {
    trace
        .events()
        .map(|event| format!("{}\n", format_event(event)))
        .collect()
}

/// One line per chain, followed by its events indented.
pub fn format_chains(trace: &Trace, chains: &[Chain]) -> String {
    let mut out = String::new();
    for chain in chains {
        out.push_str(&format_chain(chain));
        out.push('\n');
        for &id in chain.events() {
            out.push_str(&format!("    {}\n", format_event(&trace[id])));
        }
    }
    out
}

/// Listing for the terminal: chain headers in color, timestamps dimmed.
pub fn styled_chains(trace: &Trace, chains: &[Chain]) -> String {
    let mut out = String::new();
    for chain in chains {
        out.push_str(&format!(
            "{TIMESTAMP}[{} - {} ms]{TIMESTAMP:#} {CHAIN_LABEL}{}{CHAIN_LABEL:#} ({} events)\n",
            chain.start_ts(),
            chain.end_ts(),
            chain.label(),
            chain.event_count()
        ));
        for &id in chain.events() {
            let event = &trace[id];
            out.push_str(&format!(
                "    {TIMESTAMP}[{} ms]{TIMESTAMP:#} {} ({}) {TIMESTAMP}{}{TIMESTAMP:#}\n",
                event.ts(),
                event.name(),
                event.phase(),
                event.scope()
            ));
        }
    }
    out
}
