//! Calendar windows used by listings and reports.
//!
//! Windows are half-open, `[start, end)`, so a month ends where the next begins.

use chrono::{Datelike, NaiveDate};

use super::error::{ServiceError, ServiceResult};

/// Oldest and newest years accepted by period filters
pub const MIN_YEAR: i32 = 1900;
pub const MAX_YEAR: i32 = 9998;

fn check_year(year: i32) -> ServiceResult<()> {
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(())
    } else {
        Err(ServiceError::validation(
            "year",
            format!("Year must be between {} and {}", MIN_YEAR, MAX_YEAR),
        ))
    }
}

/// `[first day of month, first day of next month)`
pub fn month_bounds(year: i32, month: u32) -> ServiceResult<(NaiveDate, NaiveDate)> {
    check_year(year)?;
    if !(1..=12).contains(&month) {
        return Err(ServiceError::validation("month", "Month must be between 1 and 12"));
    }

    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ServiceError::validation("month", "Invalid month"))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| ServiceError::validation("year", "Invalid year"))?;

    Ok((start, end))
}

/// `[1 January, 1 January of the next year)`
pub fn year_bounds(year: i32) -> ServiceResult<(NaiveDate, NaiveDate)> {
    check_year(year)?;
    let start = NaiveDate::from_ymd_opt(year, 1, 1);
    let end = NaiveDate::from_ymd_opt(year + 1, 1, 1);

    start
        .zip(end)
        .ok_or_else(|| ServiceError::validation("year", "Invalid year"))
}

/// Age in whole years as the difference of calendar years
pub fn age_in_years(birth_date: NaiveDate, today: NaiveDate) -> i32 {
    today.year() - birth_date.year()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(month_bounds(2024, 2).unwrap(), (date(2024, 2, 1), date(2024, 3, 1)));
        assert_eq!(month_bounds(2024, 12).unwrap(), (date(2024, 12, 1), date(2025, 1, 1)));
    }

    #[test]
    fn test_month_out_of_range() {
        for month in [0, 13] {
            assert!(matches!(
                month_bounds(2024, month),
                Err(ServiceError::Validation { field: "month", .. })
            ));
        }
    }

    #[test]
    fn test_year_bounds() {
        assert_eq!(year_bounds(2023).unwrap(), (date(2023, 1, 1), date(2024, 1, 1)));
        assert!(year_bounds(1200).is_err());
        assert!(month_bounds(10000, 1).is_err());
    }

    #[test]
    fn test_age_uses_calendar_years() {
        assert_eq!(age_in_years(date(2000, 12, 31), date(2018, 1, 1)), 18);
        assert_eq!(age_in_years(date(2000, 1, 1), date(2017, 12, 31)), 17);
    }
}
