//! Release-time re-formatting between source-native and configured patterns.

use chrono::{DateTime, NaiveDateTime};

/// Default human-readable output pattern.
pub const DEFAULT_TIMEFMT: &str = "%Y/%m/%d %H:%M";

/// Re-format an offset-less source timestamp into the output pattern.
pub fn reformat_naive(
    raw: &str,
    native_fmt: &str,
    timefmt: &str,
) -> Result<String, chrono::ParseError> {
    let parsed = NaiveDateTime::parse_from_str(raw.trim(), native_fmt)?;
    Ok(parsed.format(timefmt).to_string())
}

/// Re-format an offset-aware source timestamp into the output pattern.
pub fn reformat_offset(
    raw: &str,
    native_fmt: &str,
    timefmt: &str,
) -> Result<String, chrono::ParseError> {
    let parsed = DateTime::parse_from_str(raw.trim(), native_fmt)?;
    Ok(parsed.format(timefmt).to_string())
}
