//! Content-addressed memo of the ingest+merge result.
//!
//! The key is a sha256 digest over the sorted (file name, file bytes) set
//! of source files, so edits, renames, additions, and removals all miss the
//! cache. Invalidation is explicit only; there is no time-based expiry.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::debug;

use tally_core::Transaction;

use crate::adapter;
use crate::format::FormatRegistry;
use crate::merge;

/// Digest identifying a set of source files by name and content.
pub fn fingerprint(paths: &[PathBuf]) -> Result<String> {
    let mut sorted: Vec<&PathBuf> = paths.iter().collect();
    sorted.sort();

    let mut hasher = Sha256::new();
    for path in sorted {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        let bytes =
            std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update((bytes.len() as u64).to_le_bytes());
        hasher.update(&bytes);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Memoized ingest result for one data directory.
#[derive(Debug, Default)]
pub struct IngestCache {
    entry: Option<(String, Vec<Transaction>)>,
}

impl IngestCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the merged ledger for the directory, reusing the memoized
    /// result while the source fingerprint is unchanged.
    pub fn get_or_ingest(
        &mut self,
        dir: &Path,
        registry: &FormatRegistry,
        extra_transfer_keywords: &[String],
    ) -> Result<Vec<Transaction>> {
        let sources = adapter::list_sources(dir)?;
        let key = fingerprint(&sources)?;

        if let Some((cached_key, ledger)) = &self.entry {
            if *cached_key == key {
                debug!(key = %key, "ingest cache hit");
                return Ok(ledger.clone());
            }
        }

        debug!(key = %key, files = sources.len(), "ingest cache miss");
        let batches = adapter::ingest_dir(dir, registry, extra_transfer_keywords)?;
        let ledger = merge::merge_sources(batches);
        self.entry = Some((key, ledger.clone()));
        Ok(ledger)
    }

    /// Drop the memoized result; the next call re-ingests unconditionally.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, contents: &str) {
        let mut f = std::fs::File::create(dir.path().join(name)).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
    }

    const CSV: &str = "Transaction Date,Description,Category,Amount\n\
                       01/15/2025,NETFLIX.COM,Entertainment,-15.99\n";

    #[test]
    fn test_fingerprint_changes_with_content() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.csv", CSV);
        let paths = adapter::list_sources(dir.path()).unwrap();
        let before = fingerprint(&paths).unwrap();

        write_file(&dir, "a.csv", "Transaction Date,Description,Category,Amount\n");
        let after = fingerprint(&paths).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_fingerprint_is_order_independent() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "a.csv", CSV);
        write_file(&dir, "b.csv", CSV);
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        assert_eq!(
            fingerprint(&[a.clone(), b.clone()]).unwrap(),
            fingerprint(&[b, a]).unwrap()
        );
    }

    #[test]
    fn test_cache_hits_until_sources_change() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "card.csv", CSV);
        let registry = FormatRegistry::builtin();
        let mut cache = IngestCache::new();

        let first = cache.get_or_ingest(dir.path(), &registry, &[]).unwrap();
        assert_eq!(first.len(), 1);
        let second = cache.get_or_ingest(dir.path(), &registry, &[]).unwrap();
        assert_eq!(first, second);

        // New file changes the fingerprint and the result.
        write_file(
            &dir,
            "card2.csv",
            "Transaction Date,Description,Category,Amount\n\
             02/15/2025,SPOTIFY,Entertainment,-9.99\n",
        );
        let third = cache.get_or_ingest(dir.path(), &registry, &[]).unwrap();
        assert_eq!(third.len(), 2);
    }

    #[test]
    fn test_invalidate_forces_reingest() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "card.csv", CSV);
        let registry = FormatRegistry::builtin();
        let mut cache = IngestCache::new();
        let first = cache.get_or_ingest(dir.path(), &registry, &[]).unwrap();
        cache.invalidate();
        let second = cache.get_or_ingest(dir.path(), &registry, &[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_dir_yields_empty_ledger() {
        let dir = TempDir::new().unwrap();
        let mut cache = IngestCache::new();
        let ledger = cache
            .get_or_ingest(dir.path(), &FormatRegistry::builtin(), &[])
            .unwrap();
        assert!(ledger.is_empty());
    }
}
