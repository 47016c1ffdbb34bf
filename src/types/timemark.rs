use std::sync::OnceLock;

use regex::Regex;

/// Leading integer of a component, the rest is ignored ("12abc" -> 12)
const INT_PREFIX: &str = r"^\s*[+-]?\d+";

/// Leading decimal of a component, the rest is ignored ("03.50s" -> 3.5)
const FLOAT_PREFIX: &str = r"^\s*[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?";

static INT_RE: OnceLock<Regex> = OnceLock::new();
static FLOAT_RE: OnceLock<Regex> = OnceLock::new();

fn leading_int(part: Option<&str>) -> f64 {
    let re = INT_RE.get_or_init(|| Regex::new(INT_PREFIX).unwrap());
    part.and_then(|s| re.find(s))
        .and_then(|m| m.as_str().trim().parse::<i64>().ok())
        .map_or(0.0, |n| n as f64)
}

fn leading_float(part: Option<&str>) -> f64 {
    let re = FLOAT_RE.get_or_init(|| Regex::new(FLOAT_PREFIX).unwrap());
    part.and_then(|s| re.find(s))
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .unwrap_or(0.0)
}

/// Convert a `HH:MM:SS[.fff]` time mark to milliseconds.
///
/// This never fails: a missing or unparseable component counts as 0.
/// Callers that need strict validation must check the input beforehand.
/// A negative total is clamped to 0.
pub fn time_mark_to_ms(time_mark: &str) -> u64 {
    let mut parts = time_mark.split(':');
    let hours = leading_int(parts.next());
    let minutes = leading_int(parts.next());
    let seconds = leading_float(parts.next());

    let total_ms = (hours * 3600.0 + minutes * 60.0 + seconds) * 1000.0;
    total_ms.max(0.0).round() as u64
}

/// Convert milliseconds to a zero-padded `HH:MM:SS.ss` time mark.
///
/// Hours grow past two digits when needed, the seconds field is always
/// at least 5 characters long.
pub fn ms_to_time_mark(ms: u64) -> String {
    // Round to centiseconds first so a carry reaches the minutes
    let centis = ms.saturating_add(5) / 10;
    let hours = centis / 360_000;
    let minutes = centis / 6_000 % 60;
    let seconds = centis % 6_000;

    format!(
        "{hours:02}:{minutes:02}:{:02}.{:02}",
        seconds / 100,
        seconds % 100
    )
}
