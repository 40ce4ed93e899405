//! Lenient parsing of request values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer};

/// Parses an API timestamp into a UTC `NaiveDateTime`.
///
/// Accepts RFC 3339 (`2025-03-01T09:00:00Z`, with any offset), a local
/// date-time without offset (`2025-03-01T09:00[:00[.sss]]`, taken as UTC) or a
/// bare date (`2025-03-01`, taken as midnight UTC).
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    parse_date(raw).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parses a calendar date, also accepting a full timestamp (whose date part
/// is kept).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.date_naive()))
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`). Use together with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Timelike};
    use serde::Deserialize;

    use super::*;

    #[test]
    fn rfc3339_is_converted_to_utc() {
        let dt = parse_datetime("2025-03-01T09:00:00-03:00").unwrap();
        assert_eq!(dt.hour(), 12);
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
    }

    #[test]
    fn bare_dates_are_midnight() {
        let dt = parse_datetime("2025-12-24").unwrap();
        assert_eq!(dt.hour(), 0);
        assert_eq!(dt.date(), NaiveDate::from_ymd_opt(2025, 12, 24).unwrap());
    }

    #[test]
    fn local_datetimes_are_accepted() {
        assert!(parse_datetime("2025-03-01T09:30").is_some());
        assert!(parse_datetime("2025-03-01T09:30:15.250").is_some());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_datetime("").is_none());
        assert!(parse_datetime("tomorrow").is_none());
        assert!(parse_datetime("2025-13-01").is_none());
        assert!(parse_date("01/02/2025").is_none());
    }

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        end_date: Option<Option<String>>,
    }

    #[test]
    fn nullable_separates_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.end_date, None);

        let null: Patch = serde_json::from_str(r#"{"end_date": null}"#).unwrap();
        assert_eq!(null.end_date, Some(None));

        let set: Patch =
            serde_json::from_str(r#"{"end_date": "2025-01-01"}"#).unwrap();
        assert_eq!(set.end_date, Some(Some("2025-01-01".to_string())));
    }
}
