//! Calendar helpers shared by the schedule and aggregation code.
//!
//! Month arithmetic clamps the day to the target month's length, so a loan
//! started on Jan 31 falls due on Feb 28 (or 29), then Mar 31.

use chrono::{Datelike, Duration, NaiveDate};

use crate::error::LoanServicingError;
use crate::LoanServicingResult;

/// Add a number of months to a date, clamping the day to the month's max.
pub fn add_months(date: NaiveDate, months: u32) -> LoanServicingResult<NaiveDate> {
    let months = i32::try_from(months)
        .map_err(|_| LoanServicingError::DateError(format!("{months} months is out of range")))?;
    let total_months = date
        .year()
        .checked_mul(12)
        .and_then(|m| m.checked_add(date.month() as i32 - 1))
        .and_then(|m| m.checked_add(months))
        .ok_or_else(|| overflow(date, months))?;
    let new_year = total_months.div_euclid(12);
    let new_month = (total_months.rem_euclid(12) + 1) as u32;
    let day = date.day().min(days_in_month(new_year, new_month));
    NaiveDate::from_ymd_opt(new_year, new_month, day).ok_or_else(|| overflow(date, months))
}

fn overflow(date: NaiveDate, months: i32) -> LoanServicingError {
    LoanServicingError::DateError(format!("{date} + {months} months overflows the calendar"))
}

/// Number of days in a given month/year.
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

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// First day of the date's month.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the following month.
pub fn next_month_start(date: NaiveDate) -> LoanServicingResult<NaiveDate> {
    add_months(month_start(date), 1)
}

pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

/// Whole days from `as_of` until `date`; negative when `date` is in the past.
pub fn days_until(date: NaiveDate, as_of: NaiveDate) -> i64 {
    (date - as_of).num_days()
}

/// `as_of` moved back by `days`, saturating at the earliest representable date.
pub fn days_before(as_of: NaiveDate, days: i64) -> NaiveDate {
    as_of
        .checked_sub_signed(Duration::days(days))
        .unwrap_or(NaiveDate::MIN)
}

/// `date` moved forward by `days`, or `None` past the calendar's end.
pub fn days_after(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}
