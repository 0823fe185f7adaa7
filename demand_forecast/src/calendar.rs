//! Calendar features of the forecast day

use chrono::{Datelike, Days, NaiveDate};

/// Calendar features describing the day after a given date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TomorrowCalendar {
    /// Day of week, Monday = 0 through Sunday = 6
    pub dow: u32,
    /// Month, 1 through 12
    pub month: u32,
    /// Saturday or Sunday
    pub is_weekend: bool,
}

impl TomorrowCalendar {
    /// Calendar features of `date` itself (used when the forecast day is known directly)
    pub fn of_day(date: NaiveDate) -> Self {
        let dow = date.weekday().num_days_from_monday();
        Self {
            dow,
            month: date.month(),
            is_weekend: dow >= 5,
        }
    }
}

/// Derive the next calendar day's features from `date`
///
/// The last representable date has no successor; its own features are
/// returned in that case so the function stays total.
pub fn derive_tomorrow(date: NaiveDate) -> TomorrowCalendar {
    let tomorrow = next_day(date).unwrap_or(date);
    TomorrowCalendar::of_day(tomorrow)
}

/// The following calendar day, if representable
pub fn next_day(date: NaiveDate) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use rstest::rstest;

    #[test]
    fn test_friday_rolls_into_weekend() {
        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let calendar = derive_tomorrow(friday);
        assert_eq!(calendar.dow, 5);
        assert_eq!(calendar.month, 1);
        assert!(calendar.is_weekend);
    }

    #[rstest]
    #[case(2024, 1, 31, 3, 2)] // Wed -> Thu 1 Feb
    #[case(2023, 12, 31, 0, 1)] // Sun -> Mon 1 Jan
    #[case(2024, 2, 28, 3, 2)] // leap year: Wed -> Thu 29 Feb
    #[case(2024, 1, 6, 6, 1)] // Sat -> Sun
    fn test_month_and_weekday_boundaries(
        #[case] year: i32,
        #[case] month: u32,
        #[case] day: u32,
        #[case] expected_dow: u32,
        #[case] expected_month: u32,
    ) {
        let date = NaiveDate::from_ymd_opt(year, month, day).unwrap();
        let calendar = derive_tomorrow(date);
        assert_eq!(calendar.dow, expected_dow);
        assert_eq!(calendar.month, expected_month);
    }

    #[test]
    fn test_weekend_flag_matches_weekday_over_a_year() {
        let mut date = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        for _ in 0..400 {
            let tomorrow = next_day(date).unwrap();
            let expected = matches!(tomorrow.weekday(), Weekday::Sat | Weekday::Sun);
            assert_eq!(derive_tomorrow(date).is_weekend, expected, "date {}", date);
            date = tomorrow;
        }
    }

    #[test]
    fn test_total_at_max_date() {
        let calendar = derive_tomorrow(NaiveDate::MAX);
        assert!(calendar.dow <= 6);
    }
}
