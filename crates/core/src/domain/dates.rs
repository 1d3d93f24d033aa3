//! Date handling for ERP timestamps.
//!
//! The ERP stores wall-clock times without an offset (`YYYY-MM-DD HH:MM:SS`)
//! in its configured zone. They are parsed as naive datetimes and never
//! shifted; only unix epochs are converted, into that same zone.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;
use serde_json::Value;

/// Output format shared by every normalized timestamp.
pub const DOLIBARR_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Values above this are treated as milliseconds rather than seconds.
const MILLIS_THRESHOLD: i64 = 10_000_000_000;

/// Parse a Dolibarr wall-clock timestamp.
///
/// Accepts a space or `T` separator, optional seconds, and ignores any
/// fractional part or trailing offset. A bare date parses to midnight.
#[must_use]
pub fn parse_dolibarr_date(input: &str) -> Option<NaiveDateTime> {
    let normalized = input.trim().replacen('T', " ", 1);
    let mut parts = normalized.split_whitespace();
    let date = NaiveDate::parse_from_str(parts.next()?, "%Y-%m-%d").ok()?;

    let Some(time_part) = parts.next() else {
        return date.and_hms_opt(0, 0, 0);
    };

    let clock = time_part
        .split(['.', '+', 'Z'])
        .next()
        .unwrap_or(time_part);
    let mut fields = clock.split(':').map(str::parse::<u32>);
    let hour = fields.next()?.ok()?;
    let minute = fields.next()?.ok()?;
    let second = match fields.next() {
        Some(s) => s.ok()?,
        None => 0,
    };

    NaiveTime::from_hms_opt(hour, minute, second).map(|t| date.and_time(t))
}

/// Parse a `YYYY-MM-DD` (or full timestamp) string down to its date.
#[must_use]
pub fn parse_day(input: &str) -> Option<NaiveDate> {
    parse_dolibarr_date(input).map(|dt| dt.date())
}

/// Format a naive datetime back into the ERP representation.
#[must_use]
pub fn format_dolibarr_date(value: NaiveDateTime) -> String {
    value.format(DOLIBARR_FORMAT).to_string()
}

/// Normalize a timestamp that may arrive as a unix epoch.
///
/// Numbers (and numeric strings without `-` or `:`) are read as seconds, or
/// milliseconds when large enough, and rendered as wall-clock time in `tz`.
/// Anything else is passed through untouched.
#[must_use]
pub fn normalize_timestamp(value: &Value, tz: Tz) -> Option<Value> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) if s.is_empty() => return None,
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        other => return Some(other.clone()),
    };

    if text.contains('-') || text.contains(':') {
        return Some(value.clone());
    }

    let Ok(raw) = text.trim().parse::<f64>() else {
        return Some(value.clone());
    };
    let raw = raw as i64;
    let millis = if raw > MILLIS_THRESHOLD { raw } else { raw * 1000 };

    match tz.timestamp_millis_opt(millis).single() {
        Some(dt) => Some(Value::String(format_dolibarr_date(dt.naive_local()))),
        None => Some(value.clone()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dt(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, DOLIBARR_FORMAT).unwrap()
    }

    #[test]
    fn test_parse_space_and_t_separators() {
        assert_eq!(
            parse_dolibarr_date("2026-02-02 09:56:34"),
            Some(dt("2026-02-02 09:56:34"))
        );
        assert_eq!(
            parse_dolibarr_date("2026-02-02T09:56:34.000Z"),
            Some(dt("2026-02-02 09:56:34"))
        );
    }

    #[test]
    fn test_parse_without_seconds_and_date_only() {
        assert_eq!(
            parse_dolibarr_date("2026-02-02 09:56"),
            Some(dt("2026-02-02 09:56:00"))
        );
        assert_eq!(
            parse_dolibarr_date("2026-02-02"),
            Some(dt("2026-02-02 00:00:00"))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_dolibarr_date("").is_none());
        assert!(parse_dolibarr_date("yesterday").is_none());
        assert!(parse_dolibarr_date("2026-02-02 25:00:00").is_none());
    }

    #[test]
    fn test_normalize_epoch_seconds_and_millis() {
        // 2025-02-10 10:40:00 UTC
        let expected = json!("2025-02-10 11:40:00");
        let madrid = chrono_tz::Europe::Madrid;

        assert_eq!(normalize_timestamp(&json!(1_739_184_000), madrid), Some(expected.clone()));
        assert_eq!(normalize_timestamp(&json!("1739184000"), madrid), Some(expected.clone()));
        assert_eq!(
            normalize_timestamp(&json!(1_739_184_000_000_i64), madrid),
            Some(expected)
        );
    }

    #[test]
    fn test_normalize_uses_given_zone_not_host() {
        // 2025-07-01 06:00:00 UTC, summer time in Madrid
        let epoch = json!(1_751_349_600);
        assert_eq!(
            normalize_timestamp(&epoch, chrono_tz::Europe::Madrid),
            Some(json!("2025-07-01 08:00:00"))
        );
        assert_eq!(
            normalize_timestamp(&epoch, chrono_tz::UTC),
            Some(json!("2025-07-01 06:00:00"))
        );
    }

    #[test]
    fn test_normalize_passes_formatted_dates_through() {
        let madrid = chrono_tz::Europe::Madrid;
        let value = json!("2026-02-02 09:56:34");
        assert_eq!(normalize_timestamp(&value, madrid), Some(value.clone()));
        assert_eq!(normalize_timestamp(&json!(null), madrid), None);
        assert_eq!(normalize_timestamp(&json!(""), madrid), None);
    }
}
