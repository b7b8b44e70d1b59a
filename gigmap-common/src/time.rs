//! Date and duration utilities
//!
//! Event dates arrive as ISO strings (`2025-07-05` or a full timestamp); the
//! published datasets show them in the audience's locale.

use chrono::{DateTime, Local, Locale, NaiveDate, NaiveTime, TimeZone, Utc};

/// Locale used for every user-facing date
pub const DISPLAY_LOCALE: Locale = Locale::it_IT;

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Convert milliseconds to duration
pub fn millis_to_duration(millis: u64) -> std::time::Duration {
    std::time::Duration::from_millis(millis)
}

/// Parse the calendar date at the start of an event date string
///
/// Accepts `YYYY-MM-DD` optionally followed by a time component.
pub fn parse_event_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.trim().get(..10)?;
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

fn as_utc(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// Long display form, e.g. `5 luglio 2025`
pub fn format_long_date(date: NaiveDate) -> String {
    as_utc(date)
        .format_localized("%-d %B %Y", DISPLAY_LOCALE)
        .to_string()
}

/// Abbreviated upper-case month, e.g. `LUG`
pub fn month_abbrev_upper(date: NaiveDate) -> String {
    as_utc(date)
        .format_localized("%b", DISPLAY_LOCALE)
        .to_string()
        .to_uppercase()
}

/// Format a raw event date for display, passing unparseable input through
pub fn display_date(raw: &str) -> String {
    match parse_event_date(raw) {
        Some(date) => format_long_date(date),
        None => {
            tracing::warn!(date = %raw, "Unparseable event date, showing it verbatim");
            raw.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_parse_plain_date() {
        assert_eq!(
            parse_event_date("2025-07-05"),
            NaiveDate::from_ymd_opt(2025, 7, 5)
        );
    }

    #[test]
    fn test_parse_timestamp_prefix() {
        assert_eq!(
            parse_event_date("2024-12-31T21:30:00.000+01:00"),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_event_date(""), None);
        assert_eq!(parse_event_date("sabato"), None);
        assert_eq!(parse_event_date("2025-13-40"), None);
    }

    #[test]
    fn test_long_date_is_italian() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 5).unwrap();
        assert_eq!(format_long_date(date), "5 luglio 2025");
    }

    #[test]
    fn test_month_abbrev_upper() {
        let date = NaiveDate::from_ymd_opt(2025, 10, 18).unwrap();
        assert_eq!(month_abbrev_upper(date), "OTT");
    }

    #[test]
    fn test_display_date_passthrough() {
        assert_eq!(display_date("da definire"), "da definire");
        assert_eq!(display_date("2025-01-03"), "3 gennaio 2025");
    }

    #[test]
    fn test_millis_to_duration() {
        assert_eq!(millis_to_duration(1200), Duration::from_millis(1200));
        assert_eq!(millis_to_duration(0), Duration::ZERO);
    }
}
