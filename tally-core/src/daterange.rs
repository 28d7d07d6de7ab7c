//! Named date-range presets resolved against the ledger's date bounds.
//!
//! Pure calendar math: no clocks, no data access. `LastMonth` always ends
//! on the last day of the prior month, which is why it must not share the
//! `YearToDate` end date.

use anyhow::{Result, bail};
use chrono::{Datelike, Days, NaiveDate};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    LastMonth,
    /// Rolling window starting at the first day of the month N months back.
    LastMonths(u32),
    YearToDate,
    AllTime,
}

impl FromStr for RangePreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "last-month" => Ok(RangePreset::LastMonth),
            "last-3-months" => Ok(RangePreset::LastMonths(3)),
            "last-6-months" => Ok(RangePreset::LastMonths(6)),
            "last-12-months" => Ok(RangePreset::LastMonths(12)),
            "ytd" => Ok(RangePreset::YearToDate),
            "all" | "all-time" => Ok(RangePreset::AllTime),
            other => bail!(
                "unknown range preset '{other}' (expected last-month, last-3-months, \
                 last-6-months, last-12-months, ytd, or all)"
            ),
        }
    }
}

/// Resolve a preset into a concrete `(start, end)` interval, clamped into
/// `[min_date, max_date]` where the preset calls for it.
pub fn resolve(
    preset: RangePreset,
    today: NaiveDate,
    min_date: NaiveDate,
    max_date: NaiveDate,
) -> (NaiveDate, NaiveDate) {
    // Rolling windows end at today unless the data stops earlier.
    let effective_end = today.min(max_date);

    match preset {
        RangePreset::LastMonth => {
            let first_of_this_month = first_of_month(today.year(), today.month());
            let last_of_prev = first_of_this_month - Days::new(1);
            let first_of_prev = first_of_month(last_of_prev.year(), last_of_prev.month());
            (first_of_prev.max(min_date), last_of_prev.min(max_date))
        }
        RangePreset::LastMonths(n) => (months_back(today, n).max(min_date), effective_end),
        RangePreset::YearToDate => (first_of_month(today.year(), 1).max(min_date), effective_end),
        RangePreset::AllTime => (min_date, max_date),
    }
}

/// First day of the month `n` months before `d`'s month, correct across
/// year boundaries.
pub fn months_back(d: NaiveDate, n: u32) -> NaiveDate {
    let total = d.year() as i64 * 12 + d.month() as i64 - 1 - n as i64;
    let year = total.div_euclid(12) as i32;
    let month = (total.rem_euclid(12) + 1) as u32;
    first_of_month(year, month)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).expect("day 1 exists in every month")
}
