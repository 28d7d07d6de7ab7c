//! Per-account source schemas and the resolver that picks one for a file.
//!
//! Resolution is deliberately permissive: an unrecognized account falls back
//! to the default credit-card schema so new exports still ingest. The cost
//! is possible misclassification until a format is registered.

#[derive(Debug, Clone, PartialEq)]
pub struct AccountFormat {
    pub date_column: String,
    pub description_column: String,
    /// None when the source carries no category information.
    pub category_column: Option<String>,
    pub amount_column: String,
    /// Multiplier turning the raw amount into "positive = expense".
    pub amount_sign: f64,
    pub is_checking_style: bool,
    /// Credit/debit marker column for checking-style sources.
    pub details_column: Option<String>,
}

impl AccountFormat {
    /// Standard credit-card export: negative amounts are expenses.
    pub fn credit_card_default() -> Self {
        Self {
            date_column: "Transaction Date".into(),
            description_column: "Description".into(),
            category_column: Some("Category".into()),
            amount_column: "Amount".into(),
            amount_sign: -1.0,
            is_checking_style: false,
            details_column: None,
        }
    }

    /// Checking export: signed amounts plus a Credit/Debit details column,
    /// no category column.
    pub fn checking() -> Self {
        Self {
            date_column: "Posting Date".into(),
            description_column: "Description".into(),
            category_column: None,
            amount_column: "Amount".into(),
            amount_sign: 1.0,
            is_checking_style: true,
            details_column: Some("Details".into()),
        }
    }
}

/// Maps an account identifier (file stem, lowercased) to a schema.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    default: AccountFormat,
    named: Vec<(String, AccountFormat)>,
}

impl FormatRegistry {
    /// Registry with the built-in credit-card default and a "checking"
    /// entry matched by substring.
    pub fn builtin() -> Self {
        Self {
            default: AccountFormat::credit_card_default(),
            named: vec![("checking".to_string(), AccountFormat::checking())],
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, format: AccountFormat) {
        self.named.push((key.into().to_lowercase(), format));
    }

    /// Resolve an account identifier: exact key match, then substring match
    /// against non-default keys, then the default schema.
    pub fn resolve(&self, account_key: &str) -> &AccountFormat {
        let key = account_key.to_lowercase();
        if key == "default" {
            return &self.default;
        }
        if let Some((_, format)) = self.named.iter().find(|(k, _)| *k == key) {
            return format;
        }
        if let Some((_, format)) = self.named.iter().find(|(k, _)| key.contains(k.as_str())) {
            return format;
        }
        &self.default
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
