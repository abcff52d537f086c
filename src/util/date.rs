//! Publish date parsing and display formatting.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

/// Offset-carrying formats tried after RFC 2822 and RFC 3339.
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%z",
    "%a, %d %b %Y %H:%M %z",
];

/// Formats without an offset. Values are taken to already be UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%m/%d/%Y", "%d %B %Y", "%B %d, %Y"];

/// Parses a feed `pubDate` into a UTC instant.
///
/// Accepts RFC 2822 (the RSS norm), RFC 3339 / ISO 8601, and a handful of
/// common offset-less layouts. Anything carrying an offset is converted to
/// UTC; anything without one is assumed to be UTC already. Day-first is
/// preferred over month-first for ambiguous `dd/mm/yyyy` dates.
///
/// Returns `None` when nothing matches. Callers cannot tell an unparsable
/// date from a missing one.
pub fn parse_pub_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc2822(text) {
        return Some(date.with_timezone(&Utc));
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(text) {
        return Some(date.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(text, format) {
            return Some(date.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    tracing::debug!(date = %text, "Unrecognised publish date format");
    None
}

/// English ordinal suffix for a day of the month.
///
/// ```
/// use newsfeed::util::ordinal_suffix;
///
/// assert_eq!(ordinal_suffix(1), "st");
/// assert_eq!(ordinal_suffix(11), "th");
/// assert_eq!(ordinal_suffix(22), "nd");
/// ```
pub fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day) {
        (1, d) if d != 11 => "st",
        (2, d) if d != 12 => "nd",
        (3, d) if d != 13 => "rd",
        _ => "th",
    }
}

/// Formats a UTC date as `"12th November 2025"`.
///
/// Month names are always English. Returns an empty string for `None`.
pub fn format_with_ordinal(date: Option<DateTime<Utc>>) -> String {
    let Some(date) = date else {
        return String::new();
    };

    let day = date.day();
    format!(
        "{}{} {} {}",
        day,
        ordinal_suffix(day),
        date.format("%B"),
        date.year()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    #[test]
    fn test_rfc2822_gmt() {
        assert_eq!(
            parse_pub_date("Wed, 02 Oct 2024 10:00:00 GMT"),
            Some(utc(2024, 10, 2, 10, 0, 0))
        );
    }

    #[test]
    fn test_rfc2822_with_offset_normalized_to_utc() {
        assert_eq!(
            parse_pub_date("Wed, 02 Oct 2024 12:30:00 +0200"),
            Some(utc(2024, 10, 2, 10, 30, 0))
        );
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            parse_pub_date("2024-10-02T10:00:00-05:00"),
            Some(utc(2024, 10, 2, 15, 0, 0))
        );
        assert_eq!(
            parse_pub_date("2024-10-02T10:00:00.250Z").map(|d| d.timestamp()),
            Some(utc(2024, 10, 2, 10, 0, 0).timestamp())
        );
    }

    #[test]
    fn test_naive_datetime_assumed_utc() {
        assert_eq!(
            parse_pub_date("2025-01-03T08:15:00"),
            Some(utc(2025, 1, 3, 8, 15, 0))
        );
        assert_eq!(
            parse_pub_date("2025-01-03 08:15:00"),
            Some(utc(2025, 1, 3, 8, 15, 0))
        );
    }

    #[test]
    fn test_date_only_is_midnight_utc() {
        assert_eq!(parse_pub_date("2025-01-03"), Some(utc(2025, 1, 3, 0, 0, 0)));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert_eq!(
            parse_pub_date("\n   2025-01-01  \n"),
            Some(utc(2025, 1, 1, 0, 0, 0))
        );
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_pub_date(""), None);
        assert_eq!(parse_pub_date("   "), None);
        assert_eq!(parse_pub_date("yesterday-ish"), None);
        assert_eq!(parse_pub_date("2025-13-45"), None);
    }

    #[test]
    fn test_ordinal_suffixes() {
        let cases = [
            (1, "st"),
            (2, "nd"),
            (3, "rd"),
            (4, "th"),
            (11, "th"),
            (12, "th"),
            (13, "th"),
            (21, "st"),
            (22, "nd"),
            (23, "rd"),
            (30, "th"),
            (31, "st"),
        ];
        for (day, expected) in cases {
            assert_eq!(ordinal_suffix(day), expected, "day {}", day);
        }
    }

    #[test]
    fn test_format_with_ordinal() {
        assert_eq!(
            format_with_ordinal(Some(utc(2025, 11, 12, 9, 0, 0))),
            "12th November 2025"
        );
        assert_eq!(
            format_with_ordinal(Some(utc(2024, 3, 1, 0, 0, 0))),
            "1st March 2024"
        );
        assert_eq!(
            format_with_ordinal(Some(utc(2024, 2, 22, 23, 59, 59))),
            "22nd February 2024"
        );
        assert_eq!(
            format_with_ordinal(Some(utc(2023, 8, 3, 0, 0, 0))),
            "3rd August 2023"
        );
    }

    #[test]
    fn test_format_none_is_empty() {
        assert_eq!(format_with_ordinal(None), "");
    }

    proptest! {
        #[test]
        fn teens_always_take_th(day in 11u32..=13) {
            prop_assert_eq!(ordinal_suffix(day), "th");
        }

        #[test]
        fn suffix_follows_last_digit_outside_teens(day in 1u32..=31) {
            prop_assume!(!(11..=13).contains(&day));
            let expected = match day % 10 {
                1 => "st",
                2 => "nd",
                3 => "rd",
                _ => "th",
            };
            prop_assert_eq!(ordinal_suffix(day), expected);
        }
    }
}
