//! Collaborator gateway
//!
//! Every downstream analytic service (STT, market data, filings, symbol
//! search, retrieval, analysis, language generation, portfolio allocation)
//! is reachable only through this trait. The HTTP implementation carries a
//! fixed per-class timeout on every outbound call; the mock implementation
//! keeps tests independent of live services.

use crate::error::OrchestratorError;
use crate::models::{FilingsData, MarketData, QuoteCandidate, RetrievalData};
use crate::Result;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeouts per collaborator class, in seconds.
const LOOKUP_TIMEOUT_SECS: u64 = 5;
const SNAPSHOT_TIMEOUT_SECS: u64 = 10;
const STT_TIMEOUT_SECS: u64 = 15;
const DATA_TIMEOUT_SECS: u64 = 20;
const PIPELINE_TIMEOUT_SECS: u64 = 20;

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Base URLs for every collaborator, read once at startup.
///
/// The default-path endpoint chain is deliberately configuration rather than
/// a hardcoded list: deployed variants disagree on whether unmatched queries
/// go straight to language generation or through retrieval first.
#[derive(Debug, Clone)]
pub struct CollaboratorConfig {
    pub stt_url: String,
    pub market_data_url: String,
    pub filings_url: String,
    pub symbol_search_url: String,
    pub retrieve_url: String,
    pub analyze_url: String,
    pub generate_url: String,
    pub portfolio_url: String,
    /// Endpoint chain for queries with no specific intent match.
    pub default_chain: Vec<String>,
    /// Whether plain QA queries take the retrieval-gated historical path.
    pub route_qa_through_retrieval: bool,
}

impl CollaboratorConfig {
    pub fn from_env() -> Self {
        let generate_url = env_or(
            "LANGUAGE_AGENT_URL",
            "http://language-agent:8006/generate",
        );

        let default_chain = env::var("DEFAULT_CHAIN")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec![generate_url.clone()]);

        Self {
            stt_url: env_or("VOICE_AGENT_URL", "http://voice-agent:8001/stt"),
            market_data_url: env_or("API_AGENT_URL", "http://api-agent:8002/market-data"),
            filings_url: env_or("SCRAPING_AGENT_URL", "http://scraping-agent:8003/filings"),
            symbol_search_url: env_or(
                "SYMBOL_SEARCH_URL",
                "https://query1.finance.yahoo.com/v1/finance/search",
            ),
            retrieve_url: env_or("RETRIEVER_AGENT_URL", "http://retriever-agent:8004/retrieve"),
            analyze_url: env_or("ANALYSIS_AGENT_URL", "http://analysis-agent:8005/analyze"),
            generate_url,
            portfolio_url: env_or(
                "PORTFOLIO_AGENT_URL",
                "http://portfolio-agent:8007/portfolio-allocation",
            ),
            default_chain,
            route_qa_through_retrieval: env::var("ROUTE_QA_THROUGH_RETRIEVAL")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true),
        }
    }

    /// The analyze → generate chain shared by the historical and portfolio plans.
    pub fn analysis_chain(&self) -> Vec<String> {
        vec![self.analyze_url.clone(), self.generate_url.clone()]
    }
}

/// Gateway to all downstream collaborators.
#[async_trait::async_trait]
pub trait CollaboratorGateway: Send + Sync {
    /// Transcribe an audio payload into query text.
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String>;

    /// Market snapshot for one ticker.
    async fn market_data(&self, ticker: &str) -> Result<MarketData>;

    /// Recent filings; `None` asks for the general snapshot.
    async fn filings(&self, ticker: Option<&str>) -> Result<FilingsData>;

    /// Full-text company search returning loosely shaped quote candidates.
    async fn symbol_search(&self, query: &str) -> Result<Vec<QuoteCandidate>>;

    /// Semantic retrieval over the document index.
    async fn retrieve(&self, query: &str) -> Result<RetrievalData>;

    /// Current portfolio allocation mapping (values may be null).
    async fn portfolio_allocation(&self) -> Result<Value>;

    /// One pipeline hop: post the payload to an endpoint, return its JSON.
    async fn post_step(&self, endpoint: &str, payload: &Value) -> Result<Value>;
}

/// HTTP-backed gateway using a long-lived pooled client.
pub struct HttpCollaborators {
    client: Client,
    config: CollaboratorConfig,
}

impl HttpCollaborators {
    pub fn new(config: CollaboratorConfig) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CollaboratorConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl CollaboratorGateway for HttpCollaborators {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String> {
        let part = reqwest::multipart::Part::bytes(audio).file_name("query.wav");
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.config.stt_url)
            .multipart(form)
            .timeout(Duration::from_secs(STT_TIMEOUT_SECS))
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        if let Some(message) = body.get("error").and_then(Value::as_str) {
            return Err(OrchestratorError::TranscriptionError(message.to_string()));
        }

        let text = body
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        debug!(chars = text.len(), "Transcription received");
        Ok(text)
    }

    async fn market_data(&self, ticker: &str) -> Result<MarketData> {
        let data = self
            .client
            .get(&self.config.market_data_url)
            .query(&[("ticker", ticker)])
            .timeout(Duration::from_secs(DATA_TIMEOUT_SECS))
            .send()
            .await?
            .json::<MarketData>()
            .await?;

        Ok(data)
    }

    async fn filings(&self, ticker: Option<&str>) -> Result<FilingsData> {
        let mut request = self.client.get(&self.config.filings_url);
        let timeout = match ticker {
            Some(t) => {
                request = request.query(&[("ticker", t)]);
                Duration::from_secs(DATA_TIMEOUT_SECS)
            }
            None => Duration::from_secs(SNAPSHOT_TIMEOUT_SECS),
        };

        let data = request
            .timeout(timeout)
            .send()
            .await?
            .json::<FilingsData>()
            .await?;

        Ok(data)
    }

    async fn symbol_search(&self, query: &str) -> Result<Vec<QuoteCandidate>> {
        let body: Value = self
            .client
            .get(&self.config.symbol_search_url)
            .query(&[("q", query)])
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        // The search service has been observed returning either a bare list
        // of quote objects or a wrapper with a "quotes" key.
        let raw = match &body {
            Value::Array(items) => items.clone(),
            _ => body
                .get("quotes")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
        };

        Ok(raw
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect())
    }

    async fn retrieve(&self, query: &str) -> Result<RetrievalData> {
        let data = self
            .client
            .post(&self.config.retrieve_url)
            .json(&serde_json::json!({ "query": query }))
            .timeout(Duration::from_secs(DATA_TIMEOUT_SECS))
            .send()
            .await?
            .error_for_status()?
            .json::<RetrievalData>()
            .await?;

        Ok(data)
    }

    async fn portfolio_allocation(&self) -> Result<Value> {
        let body = self
            .client
            .get(&self.config.portfolio_url)
            .timeout(Duration::from_secs(DATA_TIMEOUT_SECS))
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;

        Ok(body)
    }

    async fn post_step(&self, endpoint: &str, payload: &Value) -> Result<Value> {
        let response = self
            .client
            .post(endpoint)
            .json(payload)
            .timeout(Duration::from_secs(PIPELINE_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| {
                OrchestratorError::PipelineError(format!("request to {} failed: {}", endpoint, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(OrchestratorError::PipelineError(format!(
                "{} returned {}",
                endpoint, status
            )));
        }

        response.json::<Value>().await.map_err(|e| {
            OrchestratorError::PipelineError(format!("invalid JSON from {}: {}", endpoint, e))
        })
    }
}

//
// ================= Mock Gateway =================
//

enum StepBehavior {
    Respond(Value),
    Fail(String),
}

/// Mock collaborator gateway for development & testing.
/// Keeps the orchestrator functional without any live services and records
/// which endpoints were hit, in order.
#[derive(Default)]
pub struct MockGateway {
    transcript: Option<String>,
    market: HashMap<String, MarketData>,
    filings: HashMap<String, FilingsData>,
    general_filings: Option<FilingsData>,
    quotes: HashMap<String, Vec<QuoteCandidate>>,
    lookup_fails: bool,
    retrieval: Option<RetrievalData>,
    allocation: Option<Value>,
    steps: HashMap<String, StepBehavior>,
    calls: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(mut self, text: &str) -> Self {
        self.transcript = Some(text.to_string());
        self
    }

    pub fn with_market(mut self, ticker: &str, data: MarketData) -> Self {
        self.market.insert(ticker.to_string(), data);
        self
    }

    pub fn with_filings(mut self, ticker: &str, data: FilingsData) -> Self {
        self.filings.insert(ticker.to_string(), data);
        self
    }

    pub fn with_general_filings(mut self, data: FilingsData) -> Self {
        self.general_filings = Some(data);
        self
    }

    pub fn with_quotes(mut self, query: &str, candidates: Vec<QuoteCandidate>) -> Self {
        self.quotes.insert(query.to_string(), candidates);
        self
    }

    /// Make every symbol-search call fail, to exercise the resolver's
    /// swallow-and-continue policy.
    pub fn with_lookup_failure(mut self) -> Self {
        self.lookup_fails = true;
        self
    }

    pub fn with_retrieval(mut self, data: RetrievalData) -> Self {
        self.retrieval = Some(data);
        self
    }

    pub fn with_allocation(mut self, allocation: Value) -> Self {
        self.allocation = Some(allocation);
        self
    }

    pub fn with_step(mut self, endpoint: &str, response: Value) -> Self {
        self.steps
            .insert(endpoint.to_string(), StepBehavior::Respond(response));
        self
    }

    pub fn with_failing_step(mut self, endpoint: &str, message: &str) -> Self {
        self.steps
            .insert(endpoint.to_string(), StepBehavior::Fail(message.to_string()));
        self
    }

    /// Every collaborator call made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait::async_trait]
impl CollaboratorGateway for MockGateway {
    async fn transcribe(&self, _audio: Vec<u8>) -> Result<String> {
        self.record("stt".to_string());
        self.transcript.clone().ok_or_else(|| {
            OrchestratorError::TranscriptionError("no transcript configured".to_string())
        })
    }

    async fn market_data(&self, ticker: &str) -> Result<MarketData> {
        self.record(format!("market-data:{}", ticker));
        Ok(self.market.get(ticker).cloned().unwrap_or_else(|| MarketData {
            error: Some("No data found. Try a different ticker.".to_string()),
            ..Default::default()
        }))
    }

    async fn filings(&self, ticker: Option<&str>) -> Result<FilingsData> {
        match ticker {
            Some(t) => {
                self.record(format!("filings:{}", t));
                Ok(self.filings.get(t).cloned().unwrap_or_default())
            }
            None => {
                self.record("filings".to_string());
                Ok(self.general_filings.clone().unwrap_or_default())
            }
        }
    }

    async fn symbol_search(&self, query: &str) -> Result<Vec<QuoteCandidate>> {
        self.record(format!("symbol-search:{}", query));
        if self.lookup_fails {
            return Err(OrchestratorError::CollaboratorError(
                "symbol search unavailable".to_string(),
            ));
        }
        Ok(self.quotes.get(query).cloned().unwrap_or_default())
    }

    async fn retrieve(&self, query: &str) -> Result<RetrievalData> {
        self.record(format!("retrieve:{}", query));
        Ok(self.retrieval.clone().unwrap_or_default())
    }

    async fn portfolio_allocation(&self) -> Result<Value> {
        self.record("portfolio-allocation".to_string());
        Ok(self.allocation.clone().unwrap_or(Value::Null))
    }

    async fn post_step(&self, endpoint: &str, payload: &Value) -> Result<Value> {
        self.record(format!("step:{}", endpoint));
        let _ = payload;
        match self.steps.get(endpoint) {
            Some(StepBehavior::Respond(value)) => Ok(value.clone()),
            Some(StepBehavior::Fail(message)) => {
                warn!(endpoint, "Mock step configured to fail");
                Err(OrchestratorError::PipelineError(message.clone()))
            }
            None => Err(OrchestratorError::PipelineError(format!(
                "no mock response for {}",
                endpoint
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chain_falls_back_to_generate() {
        std::env::remove_var("DEFAULT_CHAIN");
        let config = CollaboratorConfig::from_env();
        assert_eq!(config.default_chain, vec![config.generate_url.clone()]);
    }

    #[tokio::test]
    async fn test_mock_records_calls_in_order() {
        let gateway = MockGateway::new()
            .with_market("AAPL", MarketData::default())
            .with_retrieval(RetrievalData::default());

        gateway.market_data("AAPL").await.unwrap();
        gateway.retrieve("q").await.unwrap();

        assert_eq!(gateway.calls(), vec!["market-data:AAPL", "retrieve:q"]);
    }
}
