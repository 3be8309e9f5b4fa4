//! Calendar classification
//!
//! Dates are plain local calendar dates; no timezone conversion happens here.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::error::StoreError;
use crate::types::DayKind;

/// Number of days in the trailing analytics window
pub const WINDOW_DAYS: usize = 7;

/// Map a date to its weight column
pub fn classify(date: NaiveDate) -> DayKind {
    match date.weekday() {
        Weekday::Fri => DayKind::Fri,
        Weekday::Sat => DayKind::Sat,
        Weekday::Sun => DayKind::Sun,
        _ => DayKind::Weekday,
    }
}

/// Years a stored `YYYY` date can carry
const YEAR_RANGE: std::ops::RangeInclusive<i32> = 0..=9999;

/// Parse an ISO `YYYY-MM-DD` date with a four-digit year
pub fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| StoreError::DateParseError(format!("{s:?}: {e}")))?;
    if !YEAR_RANGE.contains(&date.year()) {
        return Err(StoreError::DateParseError(format!(
            "{s:?}: year outside 0000-9999"
        )));
    }
    Ok(date)
}

/// `MM-DD` label used for window rows
pub fn short_label(date: NaiveDate) -> String {
    date.format("%m-%d").to_string()
}

/// The window's dates ending at (and including) `anchor`, oldest first.
///
/// Days before the earliest representable date are left out, so an anchor
/// within a week of `NaiveDate::MIN` yields a short window.
pub fn trailing_dates(anchor: NaiveDate) -> Vec<NaiveDate> {
    (0..WINDOW_DAYS as i64)
        .rev()
        .filter_map(|back| anchor.checked_sub_signed(Duration::days(back)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_classify_full_week() {
        // 2024-01-15 is a Monday
        let kinds: Vec<DayKind> = (15..=21).map(|d| classify(date(2024, 1, d))).collect();
        assert_eq!(
            kinds,
            vec![
                DayKind::Weekday,
                DayKind::Weekday,
                DayKind::Weekday,
                DayKind::Weekday,
                DayKind::Fri,
                DayKind::Sat,
                DayKind::Sun,
            ]
        );
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-02-29").unwrap(), date(2024, 2, 29));
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("15/01/2024").is_err());
        assert!(parse_date("").is_err());
    }

    #[test]
    fn test_parse_date_rejects_out_of_range_years() {
        assert_eq!(parse_date("0000-01-01").unwrap(), date(0, 1, 1));
        assert_eq!(parse_date("9999-12-31").unwrap(), date(9999, 12, 31));
        assert!(matches!(
            parse_date("-262143-01-03"),
            Err(StoreError::DateParseError(_))
        ));
        assert!(parse_date("10000-01-01").is_err());
        assert!(parse_date("-0001-06-01").is_err());
    }

    #[test]
    fn test_trailing_dates_near_min_date_does_not_overflow() {
        assert_eq!(trailing_dates(NaiveDate::MIN), vec![NaiveDate::MIN]);

        let anchor = NaiveDate::MIN + Duration::days(3);
        let dates = trailing_dates(anchor);
        assert_eq!(dates.len(), 4);
        assert_eq!(dates[0], NaiveDate::MIN);
        assert_eq!(dates[3], anchor);
    }

    #[test]
    fn test_short_label() {
        assert_eq!(short_label(date(2024, 3, 5)), "03-05");
    }

    #[test]
    fn test_trailing_dates_crosses_month_and_year() {
        let dates = trailing_dates(date(2024, 1, 3));
        assert_eq!(dates.len(), WINDOW_DAYS);
        assert_eq!(dates[0], date(2023, 12, 28));
        assert_eq!(dates[6], date(2024, 1, 3));
        assert!(dates.windows(2).all(|w| w[1] - w[0] == Duration::days(1)));
    }
}
