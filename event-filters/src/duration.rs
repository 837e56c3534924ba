use regex::Regex;
use std::sync::OnceLock;

/// Upper bound (inclusive) of a short event, in minutes
pub const SHORT_MAX_MINUTES: u32 = 120;
/// Upper bound (inclusive) of a medium event, in minutes
pub const MEDIUM_MAX_MINUTES: u32 = 240;

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)\s*([a-z]*)").expect("duration pattern is valid")
    })
}

fn range_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d+(?:\.\d+)?\s*[a-z]*\s*(?:-|–|to)\s*(\d+(?:\.\d+)?)")
            .expect("range pattern is valid")
    })
}

const MINUTE: u32 = 1;
const HOUR: u32 = 60;
const DAY: u32 = 24 * 60;

fn unit_minutes(unit: &str) -> Option<u32> {
    match unit {
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(HOUR),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(MINUTE),
        "d" | "day" | "days" => Some(DAY),
        _ => None,
    }
}

/// Unit of a bare number that follows a quantity in `previous` ("1 hour 30")
fn next_smaller_unit(previous: u32) -> Option<u32> {
    match previous {
        DAY => Some(HOUR),
        HOUR => Some(MINUTE),
        _ => None,
    }
}

/// Parses the free-text duration typed on the add-event form into minutes.
///
/// Handles "2 hours", "90 minutes", "1h 30m", "1 hour 30", "1.5 hours" and a
/// lone bare number (read as hours). Ranges such as "1-2 hours" count by
/// their upper bound. Returns `None` when no quantity is found, a unit is not
/// a time unit, or a bare number cannot be placed.
pub fn parse_duration_minutes(text: &str) -> Option<u32> {
    let text = text.trim().to_lowercase();
    if text.is_empty() {
        return None;
    }

    let text = range_pattern().replace_all(&text, "$1");

    let quantities = duration_pattern()
        .captures_iter(&text)
        .map(|caps| {
            let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
            let unit = caps.get(2).map_or("", |m| m.as_str());
            Some((amount, unit))
        })
        .collect::<Option<Vec<_>>>()?;

    if quantities.is_empty() {
        return None;
    }

    let mut total = 0.0;
    let mut previous: Option<u32> = None;

    for (amount, unit) in &quantities {
        let per_unit = if unit.is_empty() {
            match previous {
                Some(previous) => next_smaller_unit(previous)?,
                None if quantities.len() == 1 => HOUR,
                None => return None,
            }
        } else {
            unit_minutes(unit)?
        };

        total += amount * f64::from(per_unit);
        previous = Some(per_unit);
    }

    Some(total.round() as u32)
}

/// Substring rule the dashboard used before durations were parsed. Only
/// consulted when the text cannot be parsed.
pub fn legacy_is_short(text: &str) -> bool {
    text.contains("2 hours") || text.contains("1 hour")
}
