//! Parse one source CSV into normalized transactions using the format
//! registry.
//!
//! Non-checking rows become expenses with `amount = raw * sign`; rows that
//! do not come out strictly positive (refunds/credits on a credit-card
//! export) are dropped by design. Checking rows go through the classifier.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use csv::{StringRecord, Trim};
use std::path::{Path, PathBuf};
use tracing::debug;

use tally_core::{RecordType, Transaction, UNCATEGORIZED, title_case};

use crate::checking;
use crate::format::FormatRegistry;

/// The normalized rows of one source file, tagged with its identity for
/// the dedup pass.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: String,
    pub transactions: Vec<Transaction>,
}

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%m/%d/%y"];

fn parse_date(s: &str) -> Result<NaiveDate> {
    let s = s.trim();
    for format in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, format) {
            return Ok(d);
        }
    }
    bail!("unrecognized date value {s:?}")
}

fn parse_amount(s: &str) -> Result<f64> {
    let cleaned = s.trim().replace(['$', ','], "");
    cleaned
        .parse::<f64>()
        .with_context(|| format!("unparseable amount {s:?}"))
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

fn required_column(headers: &StringRecord, name: &str, path: &Path) -> Result<usize> {
    column_index(headers, name)
        .with_context(|| format!("column {name:?} missing in {}", path.display()))
}

/// Parse a single export file into normalized transactions.
///
/// Malformed dates are fatal for the whole file: every downstream
/// periodization depends on them. A missing category column is recovered
/// as "Uncategorized".
pub fn ingest_file(
    path: &Path,
    registry: &FormatRegistry,
    extra_transfer_keywords: &[String],
) -> Result<Vec<Transaction>> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .with_context(|| format!("bad file name {}", path.display()))?;
    let format = registry.resolve(&stem.to_lowercase());
    let account = title_case(stem);

    let mut rdr = csv::ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;

    let headers = rdr
        .headers()
        .with_context(|| format!("reading headers of {}", path.display()))?
        .clone();

    let date_idx = required_column(&headers, &format.date_column, path)?;
    let desc_idx = required_column(&headers, &format.description_column, path)?;
    let amount_idx = required_column(&headers, &format.amount_column, path)?;
    // Missing category column falls back to "Uncategorized", not an error.
    let category_idx = format
        .category_column
        .as_deref()
        .and_then(|name| column_index(&headers, name));
    let details_idx = format
        .details_column
        .as_deref()
        .and_then(|name| column_index(&headers, name));

    let mut out = Vec::new();
    for (row_no, result) in rdr.records().enumerate() {
        let record = result.with_context(|| format!("reading {}", path.display()))?;
        let date = parse_date(record.get(date_idx).unwrap_or(""))
            .with_context(|| format!("row {} of {}", row_no + 2, path.display()))?;
        let description = record.get(desc_idx).unwrap_or("").trim().to_string();
        let raw_amount = parse_amount(record.get(amount_idx).unwrap_or(""))
            .with_context(|| format!("row {} of {}", row_no + 2, path.display()))?;

        if format.is_checking_style {
            let details = details_idx.and_then(|i| record.get(i)).unwrap_or("");
            let Some((record_type, category)) =
                checking::classify(details, raw_amount, &description, extra_transfer_keywords)
            else {
                continue;
            };
            out.push(Transaction::new(
                date,
                description,
                category,
                raw_amount.abs(),
                account.clone(),
                record_type,
            ));
        } else {
            let amount = raw_amount * format.amount_sign;
            if amount <= 0.0 {
                continue;
            }
            let category = category_idx
                .and_then(|i| record.get(i))
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(UNCATEGORIZED);
            out.push(Transaction::new(
                date,
                description,
                category,
                amount,
                account.clone(),
                RecordType::Expense,
            ));
        }
    }

    debug!(file = %path.display(), rows = out.len(), "ingested source");
    Ok(out)
}

/// All source CSVs in a directory, sorted by name, excluding the canonical
/// merged ledger. An empty or missing directory yields an empty list.
pub fn list_sources(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let lower = name.to_lowercase();
        if lower.ends_with(".csv") && lower != crate::merge::LEDGER_FILE_NAME {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Ingest every source file in a directory, one batch per file.
pub fn ingest_dir(
    dir: &Path,
    registry: &FormatRegistry,
    extra_transfer_keywords: &[String],
) -> Result<Vec<SourceBatch>> {
    let mut batches = Vec::new();
    for path in list_sources(dir)? {
        let transactions = ingest_file(&path, registry, extra_transfer_keywords)?;
        let source = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();
        batches.push(SourceBatch {
            source,
            transactions,
        });
    }
    Ok(batches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_credit_card_rows_flip_sign_and_drop_refunds() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "sapphire.csv",
            "Transaction Date,Description,Category,Amount\n\
             01/15/2025,NETFLIX.COM,Entertainment,-15.99\n\
             01/18/2025,REFUND AMAZON,Shopping,42.00\n",
        );
        let txns = ingest_file(&path, &FormatRegistry::builtin(), &[]).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, 15.99);
        assert_eq!(txns[0].record_type, RecordType::Expense);
        assert_eq!(txns[0].account, "Sapphire");
        assert_eq!(txns[0].category, "Entertainment");
    }

    #[test]
    fn test_missing_category_column_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "nocat.csv",
            "Transaction Date,Description,Amount\n01/15/2025,COFFEE,-4.50\n",
        );
        let txns = ingest_file(&path, &FormatRegistry::builtin(), &[]).unwrap();
        assert_eq!(txns[0].category, UNCATEGORIZED);
    }

    #[test]
    fn test_checking_file_classifies_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "chase_checking.csv",
            "Details,Posting Date,Description,Amount\n\
             Credit,01/10/2025,PAYROLL ACME,3000.00\n\
             Debit,01/15/2025,COFFEE SHOP,-12.50\n\
             Debit,01/20/2025,AUTOPAY CHASE CARD,-1100.00\n\
             Debit,01/22/2025,SCHWAB MONEYLINK,-500.00\n",
        );
        let txns = ingest_file(&path, &FormatRegistry::builtin(), &[]).unwrap();
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].record_type, RecordType::Income);
        assert_eq!(txns[0].amount, 3000.0);
        assert_eq!(txns[1].record_type, RecordType::Expense);
        assert_eq!(txns[1].amount, 12.50);
        assert_eq!(txns[2].record_type, RecordType::Transfer);
        assert_eq!(txns[2].category, "Transfer");
        assert!(txns.iter().all(|t| t.amount >= 0.0));
    }

    #[test]
    fn test_bad_date_error_names_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "broken.csv",
            "Transaction Date,Description,Category,Amount\nnot-a-date,X,C,-1.00\n",
        );
        let err = ingest_file(&path, &FormatRegistry::builtin(), &[]).unwrap_err();
        let chain = format!("{err:#}");
        assert!(chain.contains("broken.csv"), "error was: {chain}");
    }

    #[test]
    fn test_empty_checking_file_yields_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "checking.csv",
            "Details,Posting Date,Description,Amount\n",
        );
        let txns = ingest_file(&path, &FormatRegistry::builtin(), &[]).unwrap();
        assert!(txns.is_empty());
    }

    #[test]
    fn test_list_sources_skips_merged_and_sorts() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "b.csv", "x\n");
        write_file(&dir, "a.CSV", "x\n");
        write_file(&dir, "merged.csv", "x\n");
        write_file(&dir, "notes.txt", "x\n");
        let sources = list_sources(dir.path()).unwrap();
        let names: Vec<_> = sources
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, vec!["a.CSV", "b.csv"]);
    }

    #[test]
    fn test_missing_dir_is_empty_not_error() {
        let sources = list_sources(Path::new("/nonexistent/tally-data")).unwrap();
        assert!(sources.is_empty());
    }
}
