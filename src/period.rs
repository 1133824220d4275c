//! Pay-period arithmetic.
//!
//! Hilan identifies a pay period by the month it ends in. With a start day of
//! 20, the "January 2026" period runs from 20/12/2025 to 19/01/2026, and the
//! calendar grid for it shows both months side by side.

use chrono::{Datelike, NaiveDate};

/// Resolve a calendar cell's day-of-month to a real date.
///
/// Days on or after `start_day` belong to the month before `target_month`.
/// Returns `None` when the day does not exist in the resolved month (a
/// trailing "30" shown next to February, for instance).
pub fn cell_to_date(day: u32, target_month: u32, target_year: i32, start_day: u32) -> Option<NaiveDate> {
    let (year, month) = if day >= start_day {
        previous_month(target_year, target_month)
    } else {
        (target_year, target_month)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The (year, month) pay period a date belongs to.
pub fn date_to_period(date: NaiveDate, start_day: u32) -> (i32, u32) {
    if date.day() >= start_day {
        next_month(date.year(), date.month())
    } else {
        (date.year(), date.month())
    }
}

/// First calendar day of a pay period.
pub fn period_start(year: i32, month: u32, start_day: u32) -> Option<NaiveDate> {
    let (prev_year, prev_month) = previous_month(year, month);
    NaiveDate::from_ymd_opt(prev_year, prev_month, start_day)
}

/// Month before (`year`, `month`), rolling back across January.
pub fn previous_month(year: i32, month: u32) -> (i32, u32) {
    if month <= 1 { (year - 1, 12) } else { (year, month - 1) }
}

/// Month after (`year`, `month`), rolling over across December.
pub fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month >= 12 { (year + 1, 1) } else { (year, month + 1) }
}
