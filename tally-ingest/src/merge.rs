//! Cross-file merge and deduplication, plus canonical ledger CSV I/O.
//!
//! Overlapping export windows make the same transaction appear in more than
//! one file. Each row gets a per-source sequence index (running count of
//! identical-looking rows within its own file), and rows are then deduped
//! on (row key, sequence index). Two genuinely distinct same-day,
//! same-amount charges in one file get indices 0 and 1 and never collide;
//! the same charge exported twice collapses to one row.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::info;

use tally_core::{RecordType, Transaction};

use crate::adapter::SourceBatch;

/// File name of the canonical merged ledger inside the data directory.
pub const LEDGER_FILE_NAME: &str = "merged.csv";

/// Hashable row identity. Amount is carried in integer cents; record_type
/// is part of the key so an income and an expense row with coincidentally
/// equal fields never collide.
type RowKey = (NaiveDate, String, i64, String, RecordType);

fn row_key(t: &Transaction) -> RowKey {
    (
        t.date,
        t.description_raw.clone(),
        t.amount_cents(),
        t.account.clone(),
        t.record_type,
    )
}

/// Merge per-source batches into one canonical, duplicate-free ledger
/// sorted by (account, date).
///
/// Idempotent: merging the output as a single batch returns it unchanged.
pub fn merge_sources(batches: Vec<SourceBatch>) -> Vec<Transaction> {
    let mut sequenced: Vec<(Transaction, usize)> = Vec::new();
    let mut running: HashMap<(String, RowKey), usize> = HashMap::new();
    for batch in batches {
        for t in batch.transactions {
            let counter = running
                .entry((batch.source.clone(), row_key(&t)))
                .or_insert(0);
            let seq = *counter;
            *counter += 1;
            sequenced.push((t, seq));
        }
    }

    let before = sequenced.len();
    let mut seen: HashSet<(RowKey, usize)> = HashSet::new();
    let mut merged: Vec<Transaction> = Vec::new();
    for (t, seq) in sequenced {
        if seen.insert((row_key(&t), seq)) {
            merged.push(t);
        }
    }
    info!(
        before,
        after = merged.len(),
        removed = before - merged.len(),
        "deduplicated sources"
    );

    merged.sort_by(|a, b| (a.account.as_str(), a.date).cmp(&(b.account.as_str(), b.date)));
    merged
}

/// Canonical ledger row as written to disk. The file stores the raw
/// description; the clean form is re-derived on read.
#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Category")]
    category: String,
    #[serde(rename = "Amount")]
    amount: f64,
    #[serde(rename = "Account")]
    account: String,
    // Older ledgers predate record types; missing means expense.
    #[serde(rename = "RecordType", default)]
    record_type: Option<RecordType>,
}

/// Write the canonical ledger file.
pub fn write_ledger(path: &Path, ledger: &[Transaction]) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("writing {}", path.display()))?;
    for t in ledger {
        wtr.serialize(LedgerRow {
            date: t.date,
            description: t.description_raw.clone(),
            category: t.category.clone(),
            amount: t.amount,
            account: t.account.clone(),
            record_type: Some(t.record_type),
        })?;
    }
    wtr.flush()
        .with_context(|| format!("flushing {}", path.display()))?;
    Ok(())
}

/// Read a canonical ledger file back into transactions.
pub fn read_ledger(path: &Path) -> Result<Vec<Transaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let mut out = Vec::new();
    for result in rdr.deserialize::<LedgerRow>() {
        let row = result.with_context(|| format!("reading {}", path.display()))?;
        out.push(Transaction::new(
            row.date,
            row.description,
            row.category,
            row.amount,
            row.account,
            row.record_type.unwrap_or(RecordType::Expense),
        ));
    }
    Ok(out)
}
