//! Month-over-baseline spending anomalies.
//!
//! The current period is the most recent calendar month in the slice; the
//! baseline is the average of up to the three most recent complete months
//! before it. Categories moving at least 20% and at least $25 against the
//! baseline surface as spike/drop insights, plus one info card for the top
//! merchant of the current month.

use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use tally_core::{Transaction, YearMonth, query};

/// Minimum relative change against the baseline.
const MIN_PCT_DELTA: f64 = 0.20;
/// Absolute dollar floor that suppresses noise on small categories.
const MIN_DOLLAR_DELTA: f64 = 25.0;
/// Number of complete months averaged into the baseline.
const BASELINE_MONTHS: usize = 3;
/// Insights returned per query.
const MAX_INSIGHTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InsightKind {
    Category,
    Merchant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Indicator {
    Spike,
    Drop,
    Info,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub category: Option<String>,
    pub headline: String,
    /// Current-period dollar amount.
    pub amount: f64,
    /// Current minus baseline.
    pub delta: f64,
    pub pct_delta: f64,
    pub indicator: Indicator,
}

/// Compute up to five insights from an expense-only ledger slice.
///
/// Returns an empty list when fewer than two distinct months are present
/// (no baseline to compare against).
pub fn compute_insights(expenses: &[Transaction]) -> Vec<Insight> {
    let months = query::distinct_months(expenses);
    if months.len() < 2 {
        return Vec::new();
    }
    let current = months[months.len() - 1];
    let baseline_months: Vec<YearMonth> = months[..months.len() - 1]
        .iter()
        .rev()
        .take(BASELINE_MONTHS)
        .copied()
        .collect();
    if baseline_months.is_empty() {
        return Vec::new();
    }

    let current_slice: Vec<Transaction> = expenses
        .iter()
        .filter(|t| YearMonth::of(t.date) == current)
        .cloned()
        .collect();
    let baseline_slice: Vec<Transaction> = expenses
        .iter()
        .filter(|t| baseline_months.contains(&YearMonth::of(t.date)))
        .cloned()
        .collect();

    let current_by_cat = query::totals_by_category(&current_slice);
    let mut baseline_by_cat = query::totals_by_category(&baseline_slice);
    for total in baseline_by_cat.values_mut() {
        *total /= baseline_months.len() as f64;
    }

    let categories: HashSet<&String> =
        current_by_cat.keys().chain(baseline_by_cat.keys()).collect();

    let mut insights = Vec::new();
    for category in categories {
        let amount = current_by_cat.get(category).copied().unwrap_or(0.0);
        let baseline = baseline_by_cat.get(category).copied().unwrap_or(0.0);
        let delta = amount - baseline;
        let pct_delta = if baseline > 0.0 {
            delta / baseline
        } else if amount > 0.0 {
            1.0
        } else {
            0.0
        };

        if pct_delta.abs() < MIN_PCT_DELTA || delta.abs() < MIN_DOLLAR_DELTA {
            continue;
        }
        let indicator = if delta > 0.0 {
            Indicator::Spike
        } else {
            Indicator::Drop
        };
        let direction = if indicator == Indicator::Spike {
            "up"
        } else {
            "down"
        };
        insights.push(Insight {
            kind: InsightKind::Category,
            category: Some(category.clone()),
            headline: format!(
                "{category} {direction} {:.0}% vs avg",
                pct_delta.abs() * 100.0
            ),
            amount,
            delta,
            pct_delta,
            indicator,
        });
    }

    // Top merchant of the current month, always an info card.
    if !current_slice.is_empty() {
        let by_merchant = query::totals_by_merchant(&current_slice);
        if let Some((merchant, total)) = by_merchant
            .iter()
            .max_by(|a, b| a.1.total_cmp(b.1).then_with(|| b.0.cmp(a.0)))
        {
            insights.push(Insight {
                kind: InsightKind::Merchant,
                category: None,
                headline: format!("Top merchant: {merchant}"),
                amount: *total,
                delta: *total,
                pct_delta: 0.0,
                indicator: Indicator::Info,
            });
        }
    }

    insights.sort_by(|a, b| b.delta.abs().total_cmp(&a.delta.abs()));
    insights.truncate(MAX_INSIGHTS);
    debug!(count = insights.len(), "computed insights");
    insights
}
