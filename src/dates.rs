use chrono::{Datelike, NaiveDate};

/// add calendar months preserving the day of month, clamped to the
/// shorter month when needed (jan 31 + 1 month = feb 28/29)
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = total.div_euclid(12);
    let month = total.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    // year/month/day are valid by construction
    NaiveDate::from_ymd_opt(year, month, day).expect("valid clamped date")
}

/// integer days between two calendar dates
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}

/// first day of the month containing the given date
pub fn month_of(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).expect("valid first of month")
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 30,
    }
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_add_months_preserves_day() {
        assert_eq!(add_months(d(2024, 1, 15), 1), d(2024, 2, 15));
        assert_eq!(add_months(d(2024, 1, 15), 13), d(2025, 2, 15));
    }

    #[test]
    fn test_add_months_clamps_to_shorter_month() {
        assert_eq!(add_months(d(2024, 1, 31), 1), d(2024, 2, 29));
        assert_eq!(add_months(d(2023, 1, 31), 1), d(2023, 2, 28));
        assert_eq!(add_months(d(2024, 3, 31), 1), d(2024, 4, 30));
    }

    #[test]
    fn test_add_months_does_not_stick_to_clamp() {
        // the original day of month is preserved, not the clamped one
        let start = d(2024, 1, 31);
        assert_eq!(add_months(start, 2), d(2024, 3, 31));
    }

    #[test]
    fn test_add_months_across_year_boundary() {
        assert_eq!(add_months(d(2023, 11, 30), 3), d(2024, 2, 29));
    }

    #[test]
    fn test_days_between() {
        assert_eq!(days_between(d(2024, 1, 10), d(2024, 2, 10)), 31);
        assert_eq!(days_between(d(2024, 2, 10), d(2024, 3, 10)), 29);
        assert_eq!(days_between(d(2024, 3, 10), d(2024, 3, 10)), 0);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2100, 2), 28);
        assert_eq!(days_in_month(2000, 2), 29);
        assert_eq!(days_in_month(2024, 4), 30);
    }
}
