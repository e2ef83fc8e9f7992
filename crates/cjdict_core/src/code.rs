//! Alphabetic input codes: canonical form, validation, secondary derivation.

use crate::consts::CODE_MAX_LEN;
use crate::errors::{DictError, Result};

/// Trim, drop inner whitespace, uppercase. Does not validate.
pub fn canonical_code(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// `^[A-Z]{1,5}$`
pub fn is_valid_code(code: &str) -> bool {
    (1..=CODE_MAX_LEN).contains(&code.len()) && code.bytes().all(|b| b.is_ascii_uppercase())
}

/// Secondary code implied by a primary code: codes of up to two letters are
/// kept as-is, longer ones collapse to first + last letter.
pub fn derive_secondary(primary: &str) -> String {
    let mut chars = primary.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return primary.to_string();
    };
    if chars.next().is_none() {
        return primary.to_string();
    }
    let mut out = String::with_capacity(2);
    out.push(first);
    out.push(last);
    out
}

/// Source-row character field: surrounding whitespace ignored, exactly one
/// scalar value required.
pub fn canonical_char(raw: &str) -> Option<char> {
    single_char(raw.trim())
}

/// Lookup query: exactly one scalar value, taken verbatim.
pub fn query_codepoint(query: &str) -> Result<u32> {
    single_char(query).map(u32::from).ok_or(DictError::InvalidLookupInput)
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
