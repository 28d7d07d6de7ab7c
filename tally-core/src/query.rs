//! Reusable aggregate queries over a ledger slice.
//!
//! Everything here is a pure fold into a map; callers decide which slice
//! (record type, date range) to aggregate. Iteration order is only
//! meaningful for the `BTreeMap`-keyed period totals.

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

use crate::transaction::{RecordType, Transaction};

/// Calendar month key, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Transactions of one record type, cloned into a new ledger slice.
pub fn slice_by_type(ledger: &[Transaction], record_type: RecordType) -> Vec<Transaction> {
    ledger
        .iter()
        .filter(|t| t.record_type == record_type)
        .cloned()
        .collect()
}

/// Transactions within `[start, end]` inclusive.
pub fn filter_range(ledger: &[Transaction], start: NaiveDate, end: NaiveDate) -> Vec<Transaction> {
    ledger
        .iter()
        .filter(|t| t.date >= start && t.date <= end)
        .cloned()
        .collect()
}

/// Earliest and latest dates present, or None for an empty ledger.
pub fn date_bounds(ledger: &[Transaction]) -> Option<(NaiveDate, NaiveDate)> {
    let min = ledger.iter().map(|t| t.date).min()?;
    let max = ledger.iter().map(|t| t.date).max()?;
    Some((min, max))
}

/// Distinct calendar months present, in chronological order.
pub fn distinct_months(ledger: &[Transaction]) -> Vec<YearMonth> {
    let set: BTreeSet<YearMonth> = ledger.iter().map(|t| YearMonth::of(t.date)).collect();
    set.into_iter().collect()
}

/// Total amount per calendar month.
pub fn monthly_totals(ledger: &[Transaction]) -> BTreeMap<YearMonth, f64> {
    let mut totals = BTreeMap::new();
    for t in ledger {
        *totals.entry(YearMonth::of(t.date)).or_insert(0.0) += t.amount;
    }
    totals
}

/// Total amount per category.
pub fn totals_by_category(ledger: &[Transaction]) -> HashMap<String, f64> {
    let mut totals = HashMap::new();
    for t in ledger {
        *totals.entry(t.category.clone()).or_insert(0.0) += t.amount;
    }
    totals
}

/// Total amount per cleaned merchant name.
pub fn totals_by_merchant(ledger: &[Transaction]) -> HashMap<String, f64> {
    let mut totals = HashMap::new();
    for t in ledger {
        *totals.entry(t.description_clean.clone()).or_insert(0.0) += t.amount;
    }
    totals
}

pub fn total(ledger: &[Transaction]) -> f64 {
    ledger.iter().map(|t| t.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(date: (i32, u32, u32), desc: &str, cat: &str, amount: f64) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            desc,
            cat,
            amount,
            "Chase",
            RecordType::Expense,
        )
    }

    #[test]
    fn test_monthly_totals_groups_by_month() {
        let ledger = vec![
            txn((2026, 1, 5), "A", "Dining", 10.0),
            txn((2026, 1, 20), "B", "Dining", 15.0),
            txn((2026, 2, 1), "C", "Travel", 40.0),
        ];
        let totals = monthly_totals(&ledger);
        assert_eq!(totals[&YearMonth { year: 2026, month: 1 }], 25.0);
        assert_eq!(totals[&YearMonth { year: 2026, month: 2 }], 40.0);
    }

    #[test]
    fn test_totals_by_merchant_uses_clean_name() {
        let ledger = vec![
            txn((2026, 1, 5), "WHOLEFDS MKT #10432 TX", "Groceries", 10.0),
            txn((2026, 1, 12), "WHOLEFDS MKT #10998 TX", "Groceries", 20.0),
        ];
        let totals = totals_by_merchant(&ledger);
        assert_eq!(totals["Wholefds Mkt"], 30.0);
    }

    #[test]
    fn test_date_bounds_empty() {
        assert_eq!(date_bounds(&[]), None);
    }

    #[test]
    fn test_distinct_months_sorted() {
        let ledger = vec![
            txn((2026, 2, 5), "A", "Dining", 1.0),
            txn((2025, 12, 1), "B", "Dining", 1.0),
            txn((2026, 2, 9), "C", "Dining", 1.0),
        ];
        let months = distinct_months(&ledger);
        assert_eq!(
            months,
            vec![
                YearMonth { year: 2025, month: 12 },
                YearMonth { year: 2026, month: 2 },
            ]
        );
    }

    #[test]
    fn test_year_month_prev_wraps() {
        let jan = YearMonth { year: 2026, month: 1 };
        assert_eq!(jan.prev(), YearMonth { year: 2025, month: 12 });
    }
}
