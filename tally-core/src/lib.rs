//! tally-core: canonical transaction model, merchant cleanup, date-range
//! presets, and reusable ledger aggregates.

pub mod contrib;
pub mod daterange;
pub mod merchant;
pub mod query;
pub mod transaction;

pub use contrib::{Contribution, ContributionKind, SavingsSummary, savings_summary};
pub use daterange::{RangePreset, months_back, resolve};
pub use merchant::{clean_merchant, title_case};
pub use query::YearMonth;
pub use transaction::{
    INCOME_CATEGORY, RecordType, TRANSFER_CATEGORY, Transaction, UNCATEGORIZED,
};
