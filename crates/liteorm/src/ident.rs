//! Safe SQL identifier handling.
//!
//! Every table or column name supplied to the builder as a bare identifier
//! passes through [`validate`] before it is quoted and embedded in generated
//! SQL. Raw condition fragments (`where_raw`, `having_raw`, join ON
//! expressions) are embedded verbatim and are the caller's responsibility.
//!
//! Validation rules:
//! - non-empty, at most 128 characters
//! - matches `[A-Za-z_][A-Za-z0-9_]*`
//! - not a reserved SQL keyword (case-insensitive)

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::error::{Error, Result};

/// Maximum accepted identifier length.
const MAX_LENGTH: usize = 128;

/// Reserved keyword set, loaded once from the embedded keyword list.
static KEYWORDS: Lazy<HashSet<String>> = Lazy::new(|| {
    let words: Vec<String> = serde_json::from_str(include_str!("sql_keywords.json"))
        .expect("embedded keyword list is valid JSON");
    words.into_iter().map(|w| w.to_ascii_uppercase()).collect()
});

/// Validate a table or column name.
pub fn validate(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::identifier("identifier is required"));
    }

    if name.len() > MAX_LENGTH {
        return Err(Error::identifier(format!(
            "identifier exceeds maximum length: {name}"
        )));
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => {
            return Err(Error::identifier(format!(
                "identifier must start with a letter or underscore: {name}"
            )));
        }
    }
    for c in chars {
        if c != '_' && !c.is_ascii_alphanumeric() {
            return Err(Error::identifier(format!(
                "identifier contains invalid character '{c}': {name}"
            )));
        }
    }

    if KEYWORDS.contains(&name.to_ascii_uppercase()) {
        return Err(Error::identifier(format!(
            "reserved word cannot be used as identifier: {name}"
        )));
    }

    Ok(())
}

/// Quote a validated identifier for embedding in SQL.
pub fn quote(name: &str) -> String {
    format!("\"{name}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_simple_names() {
        for name in ["users", "user_id", "_private", "a", "Table1"] {
            assert!(validate(name).is_ok(), "{name} should validate");
        }
    }

    #[test]
    fn rejects_empty() {
        assert!(validate("").is_err());
    }

    #[test]
    fn rejects_over_length() {
        let name = "a".repeat(129);
        assert!(validate(&name).is_err());
        let name = "a".repeat(128);
        assert!(validate(&name).is_ok());
    }

    #[test]
    fn rejects_leading_digit() {
        assert!(validate("1col").is_err());
    }

    #[test]
    fn rejects_invalid_characters() {
        for name in ["bad-name", "a b", "semi;colon", "quote\"d", "dot.ted"] {
            assert!(validate(name).is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn rejects_reserved_words_case_insensitive() {
        for name in ["select", "SELECT", "Order", "table", "where"] {
            assert!(validate(name).is_err(), "{name} should be rejected");
        }
    }

    #[test]
    fn quote_wraps_in_double_quotes() {
        assert_eq!(quote("users"), "\"users\"");
    }
}
