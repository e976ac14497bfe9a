use chrono::{DateTime, NaiveDate, Utc};

use crate::ServerError;

/// Parses an RFC 3339 timestamp or a plain `YYYY-MM-DD` date (midnight UTC).
pub(crate) fn parse_date(value: &str, field: &str) -> Result<DateTime<Utc>, ServerError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| ServerError::Validation(format!("{field} is not a valid date")))
}

pub(crate) fn parse_optional_date(
    value: Option<&str>,
    field: &str,
) -> Result<Option<DateTime<Utc>>, ServerError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => parse_date(v, field).map(Some),
        None => Ok(None),
    }
}
