//! # IST Calendar Helpers
//!
//! The festival runs on Indian Standard Time. Gate scanners and servers may
//! run on UTC clocks, so "is this ticket valid today" must convert the scan
//! instant to IST before comparing calendar dates. IST has no DST, a fixed
//! offset is exact.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// IST is UTC+05:30.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The IST timezone offset.
pub fn ist_offset() -> FixedOffset {
    // 19800 seconds is always in range for east_opt
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is a valid FixedOffset")
}

/// Calendar date in IST for the given instant.
pub fn ist_date(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&ist_offset()).date_naive()
}

/// Whether an instant falls on the given IST calendar date.
pub fn is_on_ist_date(instant: DateTime<Utc>, date: NaiveDate) -> bool {
    ist_date(instant) == date
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ist_offset_is_five_thirty() {
        assert_eq!(ist_offset().local_minus_utc(), 19800);
    }

    #[test]
    fn test_utc_evening_is_next_ist_day() {
        // 2025-09-23 20:00 UTC is 2025-09-24 01:30 IST
        let instant = Utc.with_ymd_and_hms(2025, 9, 23, 20, 0, 0).unwrap();
        assert_eq!(
            ist_date(instant),
            NaiveDate::from_ymd_opt(2025, 9, 24).unwrap()
        );
    }

    #[test]
    fn test_utc_morning_is_same_ist_day() {
        // 2025-09-23 06:00 UTC is 2025-09-23 11:30 IST
        let instant = Utc.with_ymd_and_hms(2025, 9, 23, 6, 0, 0).unwrap();
        assert!(is_on_ist_date(
            instant,
            NaiveDate::from_ymd_opt(2025, 9, 23).unwrap()
        ));
    }

    #[test]
    fn test_ist_midnight_boundary() {
        // 18:30 UTC is exactly 00:00 IST next day
        let instant = Utc.with_ymd_and_hms(2025, 9, 23, 18, 30, 0).unwrap();
        assert_eq!(
            ist_date(instant),
            NaiveDate::from_ymd_opt(2025, 9, 24).unwrap()
        );

        let just_before = Utc.with_ymd_and_hms(2025, 9, 23, 18, 29, 59).unwrap();
        assert_eq!(
            ist_date(just_before),
            NaiveDate::from_ymd_opt(2025, 9, 23).unwrap()
        );
    }
}
