//! Best-effort timestamp parsing for descriptor fields.
use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y%m%dT%H%M%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Parse a timestamp in any of the layouts seen in BigEarthNet descriptors.
/// Offsets are dropped; the wall-clock time is kept as written.
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_both_descriptor_layouts() {
        let s2 = parse_datetime("2017-06-13 10:10:31").unwrap();
        let s1 = parse_datetime("2017-06-13T10:10:31").unwrap();
        assert_eq!(s1, s2);
        assert_eq!((s2.month(), s2.hour(), s2.second()), (6, 10, 31));
    }

    #[test]
    fn parses_loose_layouts() {
        assert!(parse_datetime("2018-01-21T11:02:09.123").is_some());
        assert!(parse_datetime("2018-01-21T11:02:09+01:00").is_some());
        assert!(parse_datetime("20180121T110209").is_some());
        let date_only = parse_datetime("2017-10-27").unwrap();
        assert_eq!((date_only.day(), date_only.hour()), (27, 0));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_datetime("yesterday"), None);
        assert_eq!(parse_datetime(""), None);
    }
}
