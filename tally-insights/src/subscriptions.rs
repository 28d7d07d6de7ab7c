//! Recurring-charge detection over an expense slice.
//!
//! A merchant qualifies when its charge dates fit one of four cadence
//! windows (mean gap plus a gap-consistency bound) and its charge amounts
//! are consistent (coefficient of variation <= 0.15). Variable spend at a
//! cadence-like merchant, e.g. weekly groceries, fails the amount check.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use tally_core::Transaction;

/// Minimum charges before a merchant is considered at all.
const MIN_OCCURRENCES: usize = 2;
/// Maximum charge-amount coefficient of variation (stdev / mean).
const MAX_AMOUNT_CV: f64 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Cadence {
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

impl Cadence {
    /// Estimated monthly cost given the mean charge.
    pub fn monthly_cost(self, mean_charge: f64) -> f64 {
        match self {
            // 52 weeks / 12 months.
            Cadence::Weekly => mean_charge * 4.33,
            Cadence::Monthly => mean_charge,
            Cadence::Quarterly => mean_charge / 3.0,
            Cadence::Annual => mean_charge / 12.0,
        }
    }
}

/// Gap windows in days: (cadence, min mean gap, max mean gap, max gap stdev).
const CADENCE_WINDOWS: &[(Cadence, f64, f64, f64)] = &[
    (Cadence::Weekly, 5.0, 9.0, 2.0),
    (Cadence::Monthly, 25.0, 35.0, 5.0),
    (Cadence::Quarterly, 85.0, 95.0, 7.0),
    (Cadence::Annual, 355.0, 375.0, 10.0),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionCandidate {
    pub merchant: String,
    pub cadence: Cadence,
    pub occurrences: usize,
    pub average_charge: f64,
    pub estimated_monthly_cost: f64,
    pub first_seen: NaiveDate,
    pub last_seen: NaiveDate,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; 0 for fewer than two values.
fn stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn classify_cadence(mean_gap: f64, gap_stdev: f64) -> Option<Cadence> {
    CADENCE_WINDOWS
        .iter()
        .find(|(_, lo, hi, max_sd)| mean_gap >= *lo && mean_gap <= *hi && gap_stdev <= *max_sd)
        .map(|(cadence, ..)| *cadence)
}

/// Detect subscriptions in an expense-only ledger slice, sorted by
/// estimated monthly cost, highest first.
pub fn detect_subscriptions(expenses: &[Transaction]) -> Vec<SubscriptionCandidate> {
    let mut by_merchant: HashMap<&str, Vec<(NaiveDate, f64)>> = HashMap::new();
    for t in expenses.iter().filter(|t| t.is_expense()) {
        by_merchant
            .entry(t.description_clean.as_str())
            .or_default()
            .push((t.date, t.amount));
    }

    let mut results = Vec::new();
    for (merchant, mut charges) in by_merchant {
        if charges.len() < MIN_OCCURRENCES {
            continue;
        }
        charges.sort_by_key(|(date, _)| *date);

        let gaps: Vec<f64> = charges
            .windows(2)
            .map(|w| (w[1].0 - w[0].0).num_days() as f64)
            .collect();
        let mean_gap = mean(&gaps);
        let gap_stdev = stdev(&gaps);

        let Some(cadence) = classify_cadence(mean_gap, gap_stdev) else {
            continue;
        };

        let amounts: Vec<f64> = charges.iter().map(|(_, a)| *a).collect();
        let mean_charge = mean(&amounts);
        let amount_cv = if mean_charge > 0.0 {
            stdev(&amounts) / mean_charge
        } else {
            // Degenerate all-zero charges: treat as inconsistent.
            1.0
        };
        if amount_cv > MAX_AMOUNT_CV {
            debug!(merchant, amount_cv, "cadence match rejected on amount variance");
            continue;
        }

        results.push(SubscriptionCandidate {
            merchant: merchant.to_string(),
            cadence,
            occurrences: charges.len(),
            average_charge: mean_charge,
            estimated_monthly_cost: cadence.monthly_cost(mean_charge),
            first_seen: charges[0].0,
            last_seen: charges[charges.len() - 1].0,
        });
    }

    results.sort_by(|a, b| {
        b.estimated_monthly_cost
            .total_cmp(&a.estimated_monthly_cost)
            .then_with(|| a.merchant.cmp(&b.merchant))
    });
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::RecordType;

    fn charge(date: (i32, u32, u32), merchant: &str, amount: f64) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            merchant,
            "Entertainment",
            amount,
            "Chase",
            RecordType::Expense,
        )
    }

    #[test]
    fn test_three_monthly_charges_detect_monthly() {
        let ledger = vec![
            charge((2025, 1, 15), "Netflix", 15.99),
            charge((2025, 2, 15), "Netflix", 15.99),
            charge((2025, 3, 15), "Netflix", 15.99),
        ];
        let subs = detect_subscriptions(&ledger);
        assert_eq!(subs.len(), 1);
        let s = &subs[0];
        assert_eq!(s.merchant, "Netflix");
        assert_eq!(s.cadence, Cadence::Monthly);
        assert_eq!(s.occurrences, 3);
        assert!((s.average_charge - 15.99).abs() < 1e-9);
        assert!((s.estimated_monthly_cost - 15.99).abs() < 1e-9);
        assert_eq!(s.first_seen, NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert_eq!(s.last_seen, NaiveDate::from_ymd_opt(2025, 3, 15).unwrap());
    }

    #[test]
    fn test_single_occurrence_is_not_a_subscription() {
        let ledger = vec![charge((2025, 1, 15), "One-Time Purchase", 50.0)];
        assert!(detect_subscriptions(&ledger).is_empty());
    }

    #[test]
    fn test_amount_variance_rejects_cadence_match() {
        let ledger = vec![
            charge((2025, 1, 15), "Irregular Co", 10.0),
            charge((2025, 2, 15), "Irregular Co", 95.0),
            charge((2025, 3, 15), "Irregular Co", 10.0),
        ];
        assert!(detect_subscriptions(&ledger).is_empty());
    }

    #[test]
    fn test_annual_subscription() {
        let ledger = vec![
            charge((2024, 1, 10), "Amazon Prime", 139.0),
            charge((2025, 1, 10), "Amazon Prime", 139.0),
        ];
        let subs = detect_subscriptions(&ledger);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].cadence, Cadence::Annual);
        assert!((subs[0].estimated_monthly_cost - 139.0 / 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_weekly_subscription() {
        let ledger = vec![
            charge((2025, 1, 6), "Gym Class", 20.0),
            charge((2025, 1, 13), "Gym Class", 20.0),
            charge((2025, 1, 20), "Gym Class", 20.0),
            charge((2025, 1, 27), "Gym Class", 20.0),
        ];
        let subs = detect_subscriptions(&ledger);
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].cadence, Cadence::Weekly);
        assert!((subs[0].estimated_monthly_cost - 20.0 * 4.33).abs() < 1e-9);
    }

    #[test]
    fn test_irregular_gaps_do_not_match() {
        let ledger = vec![
            charge((2025, 1, 1), "Random Shop", 30.0),
            charge((2025, 1, 4), "Random Shop", 30.0),
            charge((2025, 3, 20), "Random Shop", 30.0),
        ];
        assert!(detect_subscriptions(&ledger).is_empty());
    }

    #[test]
    fn test_sorted_by_monthly_cost_desc() {
        let mut ledger = Vec::new();
        for month in 1..=3 {
            ledger.push(charge((2025, month, 10), "Cheap Sub", 5.0));
            ledger.push(charge((2025, month, 12), "Pricey Sub", 50.0));
        }
        let subs = detect_subscriptions(&ledger);
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].merchant, "Pricey Sub");
        assert_eq!(subs[1].merchant, "Cheap Sub");
    }

    #[test]
    fn test_non_expense_rows_are_ignored() {
        let mut transfer = charge((2025, 1, 15), "Vanguard", 500.0);
        transfer.record_type = RecordType::Transfer;
        let mut transfer2 = charge((2025, 2, 15), "Vanguard", 500.0);
        transfer2.record_type = RecordType::Transfer;
        assert!(detect_subscriptions(&[transfer, transfer2]).is_empty());
    }

    #[test]
    fn test_empty_slice() {
        assert!(detect_subscriptions(&[]).is_empty());
    }
}
