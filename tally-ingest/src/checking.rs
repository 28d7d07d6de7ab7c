//! Classifier for checking-style sources: income vs expense vs transfer,
//! with card-payment debits suppressed entirely.

use tally_core::{INCOME_CATEGORY, RecordType, TRANSFER_CATEGORY, UNCATEGORIZED};

/// Debits matching these are credit-card payments already itemized in the
/// paired credit-card export, so the row is dropped.
pub const CARD_PAYMENT_KEYWORDS: &[&str] = &["autopay", "payment thank you", "online payment"];

/// Movements to/from investment or brokerage accounts: neither income nor
/// expense.
pub const TRANSFER_KEYWORDS: &[&str] = &[
    "schwab",
    "moneylink",
    "fidelity",
    "vanguard",
    "tdameritrade",
    "e*trade",
    "etrade",
    "robinhood",
    "coinbase",
    "wealthfront",
    "betterment",
    "acorns",
    "stash invest",
];

/// Classify one checking row. Returns None when the row should be
/// suppressed (card-payment debit); otherwise the record type and the
/// category to store with it.
///
/// `extra_transfer_keywords` is unioned with the built-in transfer set.
pub fn classify(
    details: &str,
    raw_amount: f64,
    description: &str,
    extra_transfer_keywords: &[String],
) -> Option<(RecordType, &'static str)> {
    let is_credit = details.trim().eq_ignore_ascii_case("credit") || raw_amount > 0.0;
    let desc_lower = description.to_lowercase();

    if !is_credit
        && CARD_PAYMENT_KEYWORDS
            .iter()
            .any(|kw| desc_lower.contains(kw))
    {
        return None;
    }

    let is_transfer = TRANSFER_KEYWORDS.iter().any(|kw| desc_lower.contains(kw))
        || extra_transfer_keywords
            .iter()
            .any(|kw| desc_lower.contains(&kw.to_lowercase()));

    if is_transfer {
        Some((RecordType::Transfer, TRANSFER_CATEGORY))
    } else if is_credit {
        Some((RecordType::Income, INCOME_CATEGORY))
    } else {
        Some((RecordType::Expense, UNCATEGORIZED))
    }
}
