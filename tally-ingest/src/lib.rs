//! tally-ingest: source-file schemas, CSV ingestion, checking
//! classification, cross-file deduplication, and the canonical ledger file.

pub mod adapter;
pub mod cache;
pub mod checking;
pub mod format;
pub mod merge;
pub mod overrides;

pub use adapter::{SourceBatch, ingest_dir, ingest_file, list_sources};
pub use cache::{IngestCache, fingerprint};
pub use checking::{CARD_PAYMENT_KEYWORDS, TRANSFER_KEYWORDS};
pub use format::{AccountFormat, FormatRegistry};
pub use merge::{LEDGER_FILE_NAME, merge_sources, read_ledger, write_ledger};
pub use overrides::{Override, OverrideAction, apply_overrides, load_overrides, save_overrides};
