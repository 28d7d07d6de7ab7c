//! Merchant name cleanup: strips statement noise so the same merchant
//! groups together across charges.
//!
//! The transform is idempotent: cleaning an already-clean name is a no-op.

use regex::Regex;
use std::sync::OnceLock;

fn location_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*#\d+").expect("valid pattern"))
}

fn trailing_store_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 4+ digits only: shorter runs ("ROUTE 66") are part of the name.
    RE.get_or_init(|| Regex::new(r"\s+\d{4,}$").expect("valid pattern"))
}

fn trailing_state_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+[A-Z]{2}$").expect("valid pattern"))
}

/// Strip `#NNNN` location codes, trailing store numbers, and trailing
/// two-letter state codes from a merchant description, then title-case
/// the result when the original was entirely uppercase.
pub fn clean_merchant(name: &str) -> String {
    let was_all_caps = is_all_caps(name);

    // Stripping a state code can expose a new trailing store number, so run
    // the passes to a fixpoint to keep the whole transform idempotent.
    let mut s = name.to_string();
    loop {
        let pass = location_code_re().replace_all(&s, "");
        let pass = trailing_store_number_re().replace(&pass, "");
        let pass = trailing_state_code_re().replace(&pass, "").into_owned();
        if pass == s {
            break;
        }
        s = pass;
    }
    let s = s.trim();

    if was_all_caps {
        title_case(s)
    } else {
        s.to_string()
    }
}

/// True when the string has at least one cased character and none of them
/// are lowercase.
fn is_all_caps(s: &str) -> bool {
    let mut has_cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_alphabetic() {
            has_cased = true;
        }
    }
    has_cased
}

/// Uppercase every letter that follows a non-letter, lowercase the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}
