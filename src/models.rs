//! Core data models for the query orchestration engine

use serde::{Deserialize, Serialize};
use std::fmt;

//
// ================= Query =================
//

/// A transcribed user query. Rebuilt from scratch for every audio upload;
/// `attempts` counts consecutive clarification rounds in the calling client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    #[serde(default)]
    pub attempts: u32,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attempts: 0,
        }
    }
}

//
// ================= Intent =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Price,
    Filings,
    Historical,
    Portfolio,
    Qa,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::Price => "price",
            Intent::Filings => "filings",
            Intent::Historical => "historical",
            Intent::Portfolio => "portfolio",
            Intent::Qa => "qa",
        };
        write!(f, "{}", s)
    }
}

//
// ================= Response Envelope =================
//

/// The outward-facing result of one orchestrator invocation.
///
/// Exactly one case is active per request; the untagged serialization
/// produces the three wire shapes `{response}`, `{clarify, clarify_prompt}`
/// and `{error}` without optional keys.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Answer { response: String },
    Clarify { clarify: bool, clarify_prompt: String },
    Failure { error: String },
}

impl ResponseEnvelope {
    pub fn answer(text: impl Into<String>) -> Self {
        Self::Answer {
            response: text.into(),
        }
    }

    pub fn clarify(prompt: impl Into<String>) -> Self {
        Self::Clarify {
            clarify: true,
            clarify_prompt: prompt.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Failure {
            error: message.into(),
        }
    }

    pub fn is_clarify(&self) -> bool {
        matches!(self, Self::Clarify { .. })
    }
}

//
// ================= Collaborator DTOs =================
//

/// Market snapshot for one ticker. Collaborator errors arrive as an
/// `error` field instead of data, so everything else stays optional.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MarketData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_close: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_pct: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FilingsData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    #[serde(default)]
    pub filings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One candidate from the symbol-search collaborator. The upstream search
/// returns loosely shaped quote objects; `symbol` is frequently missing.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QuoteCandidate {
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RetrievalData {
    #[serde(default)]
    pub results: Vec<serde_json::Value>,
    #[serde(default)]
    pub confidence: f64,
}
