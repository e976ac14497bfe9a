//! Internal helpers for payload validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! field-level checks so every operation reports the offending field the same
//! way.

use chrono::{DateTime, Utc};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Largest amount a single record may carry. Sums over thousands of records
/// at this size still fit in an `i64`.
pub const MAX_AMOUNT_MINOR: i64 = 1_000_000_000_000_000;

/// Trim a required text field, rejecting empty values and values longer than
/// `max_chars` when a limit is given.
pub(crate) fn required_text(
    value: &str,
    field: &str,
    max_chars: Option<usize>,
) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{field} is required")));
    }
    if let Some(max) = max_chars
        && trimmed.chars().count() > max
    {
        return Err(EngineError::Validation(format!(
            "{field} cannot exceed {max} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

pub(crate) fn non_negative(value: i64, field: &str) -> ResultEngine<i64> {
    if value < 0 {
        return Err(EngineError::Validation(format!("{field} must be >= 0")));
    }
    within_cap(value, field)
}

pub(crate) fn within_cap(value: i64, field: &str) -> ResultEngine<i64> {
    if value > MAX_AMOUNT_MINOR {
        return Err(EngineError::Validation(format!(
            "{field} cannot exceed {MAX_AMOUNT_MINOR}"
        )));
    }
    Ok(value)
}

/// Parse a record id coming from a path. Malformed ids are reported exactly
/// like missing records.
pub fn parse_id(value: &str, label: &str) -> ResultEngine<Uuid> {
    Uuid::parse_str(value.trim()).map_err(|_| EngineError::KeyNotFound(label.to_string()))
}

/// Case and accent insensitive key used for category uniqueness.
pub(crate) fn normalize_name_key(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut out = String::new();
    let mut prev_space = false;
    for ch in trimmed.nfkd() {
        if is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                out.push(lower);
            }
            prev_space = false;
        } else if !out.is_empty() && !prev_space {
            out.push(' ');
            prev_space = true;
        }
    }
    let normalized = out.trim();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized.to_string())
    }
}

/// Whole days from `now` until `until`, rounded up. Negative when `until` is in
/// the past.
pub(crate) fn days_until(until: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (until - now).num_milliseconds();
    -(-millis).div_euclid(MILLIS_PER_DAY)
}

/// `part / whole` as a percentage clamped to `[0, 100]`; `0` when `whole` is 0.
pub(crate) fn clamped_percentage(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    let ratio = part as f64 / whole as f64 * 100.0;
    ratio.clamp(0.0, 100.0)
}
