//! Parse `[trace]` log lines into events.
//!
//! Each event is one line with `key=value` pairs after a `[trace]` marker:
//! ```text
//! [trace] ts=1.000 pid=1 tid=3 ph=B name="receive_request"
//! [trace] ts=1.250 pid=1 tid=3 ph=I name="cache miss" arg.key="user:42"
//! [trace] ts=1.300 pid=1 tid=3 ph=s name=rpc id=7
//! [trace] ts=2.500 pid=1 tid=3 ph=E name="receive_request" arg.status=200
//! ```
//!
//! `ts` is in milliseconds. `pid`/`tid` default to 0. `arg.<key>` entries become
//! event metadata: quoted values stay strings, unquoted values are read as
//! integers, floats or booleans when they look like one.
//!
//! The marker can appear anywhere in the line (to handle log prefixes); lines
//! without it are skipped.

use serde_json::Value;

use super::event::{Event, Phase};
use super::store::Trace;
use crate::error::TraceError;

const MARKER: &str = "[trace] ";

/// Split `key=value key="quoted value"` pairs.
fn split_pairs(mut remaining: &str) -> Result<Vec<(&str, &str, bool)>, String> {
    let mut pairs = Vec::new();

    loop {
        remaining = remaining.trim_start();
        if remaining.is_empty() {
            break;
        }

        // Find key=
        let eq_pos = remaining
            .find('=')
            .ok_or_else(|| format!("expected key=value, found `{remaining}`"))?;
        let key = &remaining[..eq_pos];
        if key.is_empty() || key.contains(char::is_whitespace) {
            return Err(format!("invalid key `{key}`"));
        }
        remaining = &remaining[eq_pos + 1..];

        // Parse value (quoted or unquoted)
        if let Some(rest) = remaining.strip_prefix('"') {
            let end_quote = rest
                .find('"')
                .ok_or_else(|| format!("unterminated quote in value of `{key}`"))?;
            pairs.push((key, &rest[..end_quote], true));
            remaining = &rest[end_quote + 1..];
        } else {
            let end = remaining.find(' ').unwrap_or(remaining.len());
            pairs.push((key, &remaining[..end], false));
            remaining = &remaining[end..];
        }
    }

    Ok(pairs)
}

fn arg_value(raw: &str, quoted: bool) -> Value {
    if quoted {
        return Value::from(raw);
    }
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(x) = raw.parse::<f64>()
        && x.is_finite()
    {
        return Value::from(x);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::from(raw),
    }
}

/// Parse a single trace line.
///
/// Returns `Ok(None)` if the line carries no `[trace]` marker. Marker lines
/// missing `ts`, `ph` or `name`, or with unparseable values, are errors.
/// Unknown keys are ignored for forward compatibility.
pub fn parse_line(line: &str) -> Result<Option<Event>, String> {
    let Some(marker_pos) = line.find(MARKER) else {
        return Ok(None);
    };
    let rest = &line[marker_pos + MARKER.len()..];

    let mut name = None;
    let mut phase = None;
    let mut ts = None;
    let mut pid = 0;
    let mut tid = 0;
    let mut id = None;
    let mut args = Vec::new();

    for (key, value, quoted) in split_pairs(rest)? {
        match key {
            "name" => name = Some(value),
            "ph" => {
                phase =
                    Some(Phase::from_code(value).ok_or_else(|| format!("unknown phase `{value}`"))?)
            }
            "ts" => {
                ts = Some(
                    value
                        .parse::<f64>()
                        .map_err(|_| format!("invalid timestamp `{value}`"))?,
                )
            }
            "pid" => pid = value.parse().map_err(|_| format!("invalid pid `{value}`"))?,
            "tid" => tid = value.parse().map_err(|_| format!("invalid tid `{value}`"))?,
            "id" => id = Some(value.parse().map_err(|_| format!("invalid id `{value}`"))?),
            _ => {
                if let Some(arg) = key.strip_prefix("arg.") {
                    args.push((arg, arg_value(value, quoted)));
                }
                // Ignore unknown keys for forward compatibility
            }
        }
    }

    let name = name.ok_or("missing `name`")?;
    let phase = phase.ok_or("missing `ph`")?;
    let ts = ts.ok_or("missing `ts`")?;

    let mut event = Event::new(name, phase, ts)
        .map_err(|e| match e {
            TraceError::InvalidEvent { reason, .. } => reason,
            other => other.to_string(),
        })?
        .with_pid(pid)
        .with_tid(tid)
        .with_args(args);
    if let Some(id) = id {
        event = event.with_id(id);
    }

    Ok(Some(event))
}

/// Parse multiple lines, skipping lines that aren't trace lines.
pub fn parse_lines(input: &str) -> Result<Vec<Event>, TraceError> {
    let mut events = Vec::new();
    for (index, line) in input.lines().enumerate() {
        match parse_line(line) {
            Ok(Some(event)) => events.push(event),
            Ok(None) => {}
            Err(message) => {
                return Err(TraceError::Parse {
                    line: index + 1,
                    message,
                });
            }
        }
    }
    log::debug!("Parsed {} trace events", events.len());
    Ok(events)
}

/// Parse input straight into a [`Trace`].
pub fn parse_trace(input: &str) -> Result<Trace, TraceError> {
    Ok(parse_lines(input)?.into_iter().collect())
}
