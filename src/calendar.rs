//! Calendar arithmetic that clamps the day of the month.

use time::{Date, Duration, Month};

/// Add `months` calendar months to `date`.
///
/// The day is clamped to the last day of the target month, so adding one
/// month to 2024-01-31 gives 2024-02-29. Returns `None` if the result is
/// outside the range supported by [Date].
pub fn add_months(date: Date, months: u32) -> Option<Date> {
    let month_index = i64::from(date.year()) * 12 + i64::from(u8::from(date.month()) - 1);
    let target_index = month_index.checked_add(i64::from(months))?;

    let year = i32::try_from(target_index.div_euclid(12)).ok()?;
    let month = Month::try_from(u8::try_from(target_index.rem_euclid(12) + 1).ok()?).ok()?;
    let day = date.day().min(last_day_of_month(year, month));

    Date::from_calendar_date(year, month, day).ok()
}

/// Add `years` calendar years to `date`, clamping February 29 to February 28
/// in common years.
pub fn add_years(date: Date, years: u32) -> Option<Date> {
    add_months(date, years.checked_mul(12)?)
}

/// The number of days in `month` of `year`.
pub fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

/// The first day of the month containing `date`.
pub fn first_day_of_month(date: Date) -> Date {
    date - Duration::days(i64::from(date.day()) - 1)
}

/// The first and last day of the month containing `date`.
pub fn month_bounds(date: Date) -> (Date, Date) {
    let first = first_day_of_month(date);
    let last_day = last_day_of_month(date.year(), date.month());

    (first, first + Duration::days(i64::from(last_day) - 1))
}

/// The first day of the month before the one containing `date`.
pub fn previous_month(date: Date) -> Date {
    first_day_of_month(first_day_of_month(date) - Duration::days(1))
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod calendar_tests {
    use time::{Date, Month, macros::date};

    use super::{
        add_months, add_years, first_day_of_month, last_day_of_month, month_bounds,
        previous_month,
    };

    #[test]
    fn add_months_keeps_day() {
        assert_eq!(add_months(date!(2024 - 01 - 15), 1), Some(date!(2024 - 02 - 15)));
        assert_eq!(add_months(date!(2024 - 01 - 15), 0), Some(date!(2024 - 01 - 15)));
    }

    #[test]
    fn add_months_clamps_to_end_of_month() {
        assert_eq!(add_months(date!(2024 - 01 - 31), 1), Some(date!(2024 - 02 - 29)));
        assert_eq!(add_months(date!(2023 - 01 - 31), 1), Some(date!(2023 - 02 - 28)));
        assert_eq!(add_months(date!(2024 - 03 - 31), 1), Some(date!(2024 - 04 - 30)));
    }

    #[test]
    fn add_months_rolls_over_year() {
        assert_eq!(add_months(date!(2024 - 11 - 30), 3), Some(date!(2025 - 02 - 28)));
        assert_eq!(add_months(date!(2024 - 12 - 01), 25), Some(date!(2027 - 01 - 01)));
    }

    #[test]
    fn add_months_past_max_date_is_none() {
        assert_eq!(add_months(Date::MAX, 1), None);
    }

    #[test]
    fn add_years_clamps_leap_day() {
        assert_eq!(add_years(date!(2024 - 02 - 29), 1), Some(date!(2025 - 02 - 28)));
        assert_eq!(add_years(date!(2024 - 02 - 29), 4), Some(date!(2028 - 02 - 29)));
    }

    #[test]
    fn last_day_of_february() {
        assert_eq!(last_day_of_month(2024, Month::February), 29);
        assert_eq!(last_day_of_month(1900, Month::February), 28);
        assert_eq!(last_day_of_month(2000, Month::February), 29);
    }

    #[test]
    fn month_bounds_cover_whole_month() {
        assert_eq!(
            month_bounds(date!(2024 - 02 - 14)),
            (date!(2024 - 02 - 01), date!(2024 - 02 - 29))
        );
        assert_eq!(first_day_of_month(date!(2024 - 12 - 31)), date!(2024 - 12 - 01));
    }

    #[test]
    fn previous_month_crosses_year() {
        assert_eq!(previous_month(date!(2024 - 01 - 31)), date!(2023 - 12 - 01));
        assert_eq!(previous_month(date!(2024 - 03 - 31)), date!(2024 - 02 - 01));
    }
}
