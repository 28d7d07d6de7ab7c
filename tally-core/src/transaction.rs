//! Canonical transaction model shared by every stage of the pipeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::merchant::clean_merchant;

/// Category assigned to transfer rows at classification time.
pub const TRANSFER_CATEGORY: &str = "Transfer";
/// Category assigned to income rows at classification time.
pub const INCOME_CATEGORY: &str = "Income";
/// Category used when a source has no category column.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Direction of a transaction, assigned exactly once at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    #[serde(rename = "expense")]
    Expense,
    #[serde(rename = "income")]
    Income,
    #[serde(rename = "transfer")]
    Transfer,
}

/// A normalized ledger record.
///
/// `amount` is always the absolute magnitude; direction lives in
/// `record_type`. `description_clean` is derived from `description_raw`
/// at construction and used for merchant-level grouping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description_raw: String,
    pub description_clean: String,
    pub category: String,
    pub amount: f64,
    pub account: String,
    pub record_type: RecordType,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        description: impl Into<String>,
        category: impl Into<String>,
        amount: f64,
        account: impl Into<String>,
        record_type: RecordType,
    ) -> Self {
        let description_raw = description.into();
        let description_clean = clean_merchant(&description_raw);
        Self {
            date,
            description_raw,
            description_clean,
            category: category.into(),
            amount,
            account: account.into(),
            record_type,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.record_type == RecordType::Expense
    }

    pub fn is_income(&self) -> bool {
        self.record_type == RecordType::Income
    }

    pub fn is_transfer(&self) -> bool {
        self.record_type == RecordType::Transfer
    }

    /// Amount in integer cents, used wherever a hashable amount is needed.
    pub fn amount_cents(&self) -> i64 {
        (self.amount * 100.0).round() as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_cleans_description() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let t = Transaction::new(
            date,
            "WHOLEFDS MKT #10432 TX",
            "Groceries",
            54.10,
            "Chase",
            RecordType::Expense,
        );
        assert_eq!(t.description_raw, "WHOLEFDS MKT #10432 TX");
        assert_eq!(t.description_clean, "Wholefds Mkt");
        assert!(t.is_expense());
        assert_eq!(t.amount_cents(), 5410);
    }

    #[test]
    fn test_amount_cents_rounds() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let t = Transaction::new(date, "X", "C", 0.1 + 0.2, "A", RecordType::Expense);
        assert_eq!(t.amount_cents(), 30);
    }
}
