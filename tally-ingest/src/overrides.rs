//! Manual corrections applied as a post-filter over the canonical ledger.
//!
//! An override is keyed on (date, raw description, original amount) and
//! either excludes the row, replaces its amount, or replaces its category.
//! Ingestion logic never sees overrides.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use tally_core::Transaction;

#[derive(Debug, Clone, PartialEq)]
pub enum OverrideAction {
    Exclude,
    Amount(f64),
    Recategorize(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub date: NaiveDate,
    pub description: String,
    pub original_amount: f64,
    pub action: OverrideAction,
    pub notes: String,
}

/// On-disk shape: one row per override, `Action` is one of
/// exclude / override / recategorize.
#[derive(Debug, Serialize, Deserialize)]
struct OverrideRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "OriginalAmount")]
    original_amount: f64,
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "NewAmount", default)]
    new_amount: Option<f64>,
    #[serde(rename = "NewCategory", default)]
    new_category: Option<String>,
    #[serde(rename = "Notes", default)]
    notes: String,
}

/// Load overrides from a CSV file; a missing file means no overrides.
pub fn load_overrides(path: &Path) -> Result<Vec<Override>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for result in rdr.deserialize::<OverrideRow>() {
        let row = result.with_context(|| format!("reading {}", path.display()))?;
        let action = match row.action.as_str() {
            "exclude" => OverrideAction::Exclude,
            "override" => OverrideAction::Amount(row.new_amount.with_context(|| {
                format!("override row for {:?} has no NewAmount", row.description)
            })?),
            "recategorize" => OverrideAction::Recategorize(row.new_category.with_context(
                || format!("recategorize row for {:?} has no NewCategory", row.description),
            )?),
            other => bail!("unknown override action {other:?} in {}", path.display()),
        };
        out.push(Override {
            date: row.date,
            description: row.description,
            original_amount: row.original_amount,
            action,
            notes: row.notes,
        });
    }
    Ok(out)
}

pub fn save_overrides(path: &Path, overrides: &[Override]) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("writing {}", path.display()))?;
    for o in overrides {
        let (action, new_amount, new_category) = match &o.action {
            OverrideAction::Exclude => ("exclude", None, None),
            OverrideAction::Amount(a) => ("override", Some(*a), None),
            OverrideAction::Recategorize(c) => ("recategorize", None, Some(c.clone())),
        };
        wtr.serialize(OverrideRow {
            date: o.date,
            description: o.description.clone(),
            original_amount: o.original_amount,
            action: action.to_string(),
            new_amount,
            new_category,
            notes: o.notes.clone(),
        })?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

fn cents(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Apply overrides to a ledger. Lookup is by (date, raw description,
/// amount in cents); unmatched overrides are ignored.
pub fn apply_overrides(ledger: Vec<Transaction>, overrides: &[Override]) -> Vec<Transaction> {
    if overrides.is_empty() {
        return ledger;
    }
    let by_key: HashMap<(NaiveDate, &str, i64), &OverrideAction> = overrides
        .iter()
        .map(|o| {
            (
                (o.date, o.description.as_str(), cents(o.original_amount)),
                &o.action,
            )
        })
        .collect();

    let mut out = Vec::with_capacity(ledger.len());
    for mut t in ledger {
        match by_key.get(&(t.date, t.description_raw.as_str(), t.amount_cents())) {
            Some(OverrideAction::Exclude) => continue,
            Some(OverrideAction::Amount(a)) => t.amount = *a,
            Some(OverrideAction::Recategorize(c)) => t.category = c.clone(),
            None => {}
        }
        out.push(t);
    }
    out
}
