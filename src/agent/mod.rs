//! Main orchestrator
//!
//! Classify → route into an intent-specific plan → respond with exactly one
//! envelope shape. Stateless per invocation: routing is a pure function of
//! the current query plus that call's collaborator responses, so instances
//! can scale horizontally with no coordination.

use crate::clarify::should_clarify;
use crate::classifier;
use crate::collaborators::{CollaboratorConfig, CollaboratorGateway};
use crate::error::OrchestratorError;
use crate::models::{Intent, ResponseEnvelope};
use crate::pipeline::PipelineExecutor;
use crate::ticker::TickerResolver;
use crate::Result;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub struct Orchestrator {
    gateway: Arc<dyn CollaboratorGateway>,
    resolver: TickerResolver,
    pipeline: PipelineExecutor,
    config: CollaboratorConfig,
}

impl Orchestrator {
    pub fn new(gateway: Arc<dyn CollaboratorGateway>, config: CollaboratorConfig) -> Self {
        Self {
            resolver: TickerResolver::new(gateway.clone()),
            pipeline: PipelineExecutor::new(gateway.clone()),
            gateway,
            config,
        }
    }

    /// Full inbound flow: transcribe the audio upload, then route the text.
    pub async fn handle_audio(&self, audio: Vec<u8>) -> ResponseEnvelope {
        let text = match self.gateway.transcribe(audio).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Transcription failed");
                return ResponseEnvelope::error(e.to_string());
            }
        };

        self.handle_query(&text).await
    }

    /// Route one transcribed query. Every failure inside a plan collapses to
    /// an error envelope; no plan partially commits.
    pub async fn handle_query(&self, text: &str) -> ResponseEnvelope {
        let intent = classifier::classify(text);
        info!(%intent, query = %text, "Routing query");

        let result = match intent {
            Intent::Price => self.price_plan(text).await,
            Intent::Filings => self.filings_plan(text).await,
            Intent::Historical => self.historical_plan(text).await,
            Intent::Portfolio => self.portfolio_plan().await,
            Intent::Qa => {
                if self.config.route_qa_through_retrieval {
                    self.historical_plan(text).await
                } else {
                    Ok(self.default_plan(text).await)
                }
            }
        };

        match result {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(%intent, error = %e, "Plan failed");
                ResponseEnvelope::error(e.to_string())
            }
        }
    }

    async fn price_plan(&self, text: &str) -> Result<ResponseEnvelope> {
        let Some(ticker) = self.resolver.resolve(text).await else {
            return Ok(ResponseEnvelope::clarify(
                "I couldn't detect which stock you meant. Could you rephrase?",
            ));
        };

        let market = self.gateway.market_data(&ticker).await?;
        if market.error.is_some() {
            return Ok(ResponseEnvelope::clarify(format!(
                "Error fetching data for {}. Could you try another ticker?",
                ticker
            )));
        }

        let latest_close = market.latest_close.ok_or_else(|| {
            OrchestratorError::MalformedResponse("market data missing latest_close".to_string())
        })?;
        let change_pct = market.change_pct.ok_or_else(|| {
            OrchestratorError::MalformedResponse("market data missing change_pct".to_string())
        })?;

        Ok(ResponseEnvelope::answer(format!(
            "{}: ${:.2}, {:+.2}%",
            ticker, latest_close, change_pct
        )))
    }

    async fn filings_plan(&self, text: &str) -> Result<ResponseEnvelope> {
        let Some(ticker) = self.resolver.resolve(text).await else {
            return Ok(ResponseEnvelope::clarify(
                "I couldn't detect which company's filings you want. Could you rephrase?",
            ));
        };

        let filings = self.gateway.filings(Some(&ticker)).await?;
        if filings.filings.is_empty() {
            return Ok(ResponseEnvelope::clarify(format!(
                "No filings found for {}. Could you clarify your request?",
                ticker
            )));
        }

        let summary = filings
            .filings
            .iter()
            .take(3)
            .map(|f| format!("- {}", f))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ResponseEnvelope::answer(format!(
            "Latest for {}:\n{}",
            ticker, summary
        )))
    }

    /// Historical and QA queries: retrieval with a confidence gate, then the
    /// analyze → generate chain over the retrieved documents.
    async fn historical_plan(&self, text: &str) -> Result<ResponseEnvelope> {
        let retrieval = self.gateway.retrieve(text).await?;

        if should_clarify(retrieval.confidence, &retrieval.results) {
            info!(
                confidence = retrieval.confidence,
                results = retrieval.results.len(),
                "Retrieval below confidence gate"
            );
            return Ok(ResponseEnvelope::clarify(
                "I didn't catch that confidently or couldn't find relevant info. \
                 Could you please rephrase or provide more detail?",
            ));
        }

        let payload = json!({ "data": retrieval.results });
        Ok(self
            .pipeline
            .execute(payload, &self.config.analysis_chain())
            .await)
    }

    async fn portfolio_plan(&self) -> Result<ResponseEnvelope> {
        let allocations = self.gateway.portfolio_allocation().await?;

        let well_formed = allocations
            .as_object()
            .map(|map| map.values().all(|v| !v.is_null()))
            .unwrap_or(false);

        if !well_formed {
            return Ok(ResponseEnvelope::clarify(
                "I couldn't determine your portfolio details. \
                 Could you please rephrase or provide more detail on your portfolio?",
            ));
        }

        // Fixed-ticker market snapshot plus a general filings snapshot feed
        // the same analyze → generate chain as the historical path.
        let market = self.gateway.market_data("TSMC").await?;
        let filings = self.gateway.filings(None).await?;

        let payload = json!({
            "data": [serde_json::to_value(market)?, serde_json::to_value(filings)?]
        });
        Ok(self
            .pipeline
            .execute(payload, &self.config.analysis_chain())
            .await)
    }

    /// No specific intent matched: run the raw query through the configured
    /// default chain.
    async fn default_plan(&self, text: &str) -> ResponseEnvelope {
        self.pipeline
            .execute(json!({ "query": text }), &self.config.default_chain)
            .await
    }
}
