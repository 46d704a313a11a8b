//! Ticker Resolver
//!
//! Maps free text to a stock ticker symbol. Resolution strategies run in a
//! fixed order and stop at the first success: static company table, `$SYM`
//! pattern, "price of <phrase>" lookup, then proper-noun phrase lookup.
//! Symbol-search failures are swallowed and treated as "no match".

use crate::collaborators::CollaboratorGateway;
use crate::models::QuoteCandidate;
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, warn};

/// Known company names in priority order; the first matching entry wins.
const COMPANY_TICKERS: &[(&str, &str)] = &[
    ("APPLE", "AAPL"),
    ("TESLA", "TSLA"),
    ("MICROSOFT", "MSFT"),
    ("GOOGLE", "GOOGL"),
    ("META", "META"),
    ("NETFLIX", "NFLX"),
    ("AMAZON", "AMZN"),
    ("NVIDIA", "NVDA"),
    ("TSMC", "TSM"),
];

lazy_static! {
    static ref DOLLAR_SYMBOL_RE: Regex = Regex::new(r"\$([A-Z]{1,5})\b").unwrap();
    static ref PRICE_OF_RE: Regex = Regex::new(r"(?i)price of ([A-Za-z&. ]+)").unwrap();
    static ref PROPER_NOUN_RE: Regex =
        Regex::new(r"\b([A-Z][a-z]+(?: [A-Z][a-z]+)*)\b").unwrap();
}

pub struct TickerResolver {
    gateway: Arc<dyn CollaboratorGateway>,
}

impl TickerResolver {
    pub fn new(gateway: Arc<dyn CollaboratorGateway>) -> Self {
        Self { gateway }
    }

    /// Resolve query text to a ticker symbol, or `None` when every strategy
    /// comes up empty.
    pub async fn resolve(&self, text: &str) -> Option<String> {
        let upper = text.to_uppercase();

        for (company, ticker) in COMPANY_TICKERS {
            if upper.contains(company) {
                debug!(company, ticker, "Ticker resolved from company table");
                return Some((*ticker).to_string());
            }
        }

        if let Some(captures) = DOLLAR_SYMBOL_RE.captures(&upper) {
            let symbol = captures[1].to_string();
            debug!(%symbol, "Ticker resolved from $-symbol pattern");
            return Some(symbol);
        }

        if let Some(captures) = PRICE_OF_RE.captures(text) {
            let phrase = captures[1].trim();
            if let Some(symbol) = self.lookup(phrase).await {
                return Some(symbol);
            }
        }

        for captures in PROPER_NOUN_RE.captures_iter(text) {
            let phrase = &captures[1];
            if let Some(symbol) = self.lookup(phrase).await {
                return Some(symbol);
            }
        }

        None
    }

    /// Query the symbol-search collaborator for a phrase, accepting the
    /// first alphabetic candidate of length ≤ 5. Errors are not fatal.
    async fn lookup(&self, phrase: &str) -> Option<String> {
        match self.gateway.symbol_search(phrase).await {
            Ok(candidates) => candidates.iter().find_map(accept_candidate),
            Err(e) => {
                warn!(phrase, error = %e, "Symbol lookup failed, continuing");
                None
            }
        }
    }
}

fn accept_candidate(candidate: &QuoteCandidate) -> Option<String> {
    let symbol = candidate.symbol.as_deref()?;
    if !symbol.is_empty()
        && symbol.len() <= 5
        && symbol.chars().all(|c| c.is_ascii_alphabetic())
    {
        Some(symbol.to_uppercase())
    } else {
        None
    }
}
