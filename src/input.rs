use thiserror::Error;

use crate::event::Event;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct InputError {
    pub line: usize,
    pub reason: String,
}

/// Parses an arrivals listing, one `arrival_time service_duration` pair per
/// line. Blank lines and lines starting with `#` are skipped.
pub fn parse_arrivals(text: &str) -> Result<Vec<Event>, InputError> {
    let mut events = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        let [time, duration] = fields.as_slice() else {
            return Err(InputError {
                line,
                reason: format!("expected 2 fields, found {}", fields.len()),
            });
        };
        events.push(Event::arrival(
            parse_field(line, "arrival time", time)?,
            parse_field(line, "service duration", duration)?,
        ));
    }
    Ok(events)
}

fn parse_field(line: usize, name: &str, value: &str) -> Result<u64, InputError> {
    value.parse().map_err(|e| InputError {
        line,
        reason: format!("bad {name} `{value}`: {e}"),
    })
}
