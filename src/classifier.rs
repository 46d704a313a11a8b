//! Intent Classifier
//!
//! Maps transcribed query text to one of five intents using an ordered list
//! of keyword/pattern rules. First matching rule wins; rule order is part of
//! the routing contract (e.g. "filing" outranks "portfolio").

use crate::models::Intent;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PRICE_OF_RE: Regex = Regex::new(r"price of [a-z]").unwrap();
}

/// Keyword rules evaluated after the price rule, in priority order.
const KEYWORD_RULES: &[(&[&str], Intent)] = &[
    (&["filing", "sec", "news"], Intent::Filings),
    (
        &["historical", "last quarter", "past", "p/e", "ratio"],
        Intent::Historical,
    ),
    (
        &["risk exposure", "allocation", "portfolio"],
        Intent::Portfolio,
    ),
];

/// Classify query text into an intent. Total and deterministic: every input
/// maps to exactly one intent, case-insensitively.
pub fn classify(text: &str) -> Intent {
    let q = text.to_lowercase();

    if q.contains("stock price") || PRICE_OF_RE.is_match(&q) {
        return Intent::Price;
    }

    for (keywords, intent) in KEYWORD_RULES {
        if keywords.iter().any(|kw| q.contains(kw)) {
            return *intent;
        }
    }

    Intent::Qa
}
