//! Retirement/investment contribution entries and the savings-rate summary
//! derived from them plus a ledger slice.

use serde::{Deserialize, Serialize};

use crate::query;
use crate::transaction::{RecordType, Transaction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContributionKind {
    #[serde(rename = "pre-tax")]
    PreTax,
    #[serde(rename = "after-tax")]
    AfterTax,
    #[serde(rename = "employer-match")]
    EmployerMatch,
}

/// One configured contribution (401k, HSA, Roth IRA, ESPP, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub name: String,
    pub kind: ContributionKind,
    pub amount_per_year: f64,
    /// Employer annual match on top of `amount_per_year`, 0 when none.
    #[serde(default)]
    pub employer_match: f64,
}

/// Aggregates feeding the savings-rate readout.
#[derive(Debug, Clone, PartialEq)]
pub struct SavingsSummary {
    pub total_spend: f64,
    pub total_income: f64,
    /// Transfers to investment/brokerage accounts.
    pub total_invested: f64,
    pub pretax_contributions: f64,
    pub aftertax_contributions: f64,
    pub employer_match: f64,
    /// Transfers plus your own contributions (employer match included).
    pub total_saved: f64,
    /// Take-home income plus pre-tax deductions.
    pub gross_income_estimate: f64,
    /// `total_saved / gross_income_estimate`; None when no income data.
    pub savings_rate: Option<f64>,
}

/// Compute the savings summary for a ledger slice.
///
/// Contributions are annual figures, prorated by `months_tracked / 12` so a
/// partial year of data compares like with like.
pub fn savings_summary(
    ledger: &[Transaction],
    contributions: &[Contribution],
    months_tracked: u32,
) -> SavingsSummary {
    let total_spend = query::total(&query::slice_by_type(ledger, RecordType::Expense));
    let total_income = query::total(&query::slice_by_type(ledger, RecordType::Income));
    let total_invested = query::total(&query::slice_by_type(ledger, RecordType::Transfer));

    let proration = f64::from(months_tracked.min(12)) / 12.0;

    let mut pretax = 0.0;
    let mut aftertax = 0.0;
    let mut employer = 0.0;
    for c in contributions {
        let prorated = c.amount_per_year * proration;
        match c.kind {
            ContributionKind::PreTax => pretax += prorated,
            ContributionKind::AfterTax => aftertax += prorated,
            ContributionKind::EmployerMatch => employer += prorated,
        }
        employer += c.employer_match * proration;
    }

    let total_saved = total_invested + pretax + aftertax + employer;
    let gross_income_estimate = if total_income > 0.0 {
        total_income + pretax
    } else {
        0.0
    };
    let savings_rate = if gross_income_estimate > 0.0 {
        Some(total_saved / gross_income_estimate)
    } else {
        None
    };

    SavingsSummary {
        total_spend,
        total_income,
        total_invested,
        pretax_contributions: pretax,
        aftertax_contributions: aftertax,
        employer_match: employer,
        total_saved,
        gross_income_estimate,
        savings_rate,
    }
}
