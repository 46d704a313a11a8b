//! Pipeline Executor
//!
//! Chains collaborator endpoints sequentially: each endpoint's JSON response
//! fully replaces the payload for the next hop. Any transport, status, or
//! JSON failure aborts the chain at that hop; no retries, no partial results.

use crate::collaborators::CollaboratorGateway;
use crate::models::ResponseEnvelope;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct PipelineExecutor {
    gateway: Arc<dyn CollaboratorGateway>,
}

impl PipelineExecutor {
    pub fn new(gateway: Arc<dyn CollaboratorGateway>) -> Self {
        Self { gateway }
    }

    /// Run the payload through each endpoint in order and extract the
    /// terminal `text` field.
    pub async fn execute(&self, initial_payload: Value, endpoints: &[String]) -> ResponseEnvelope {
        let mut payload = initial_payload;

        for endpoint in endpoints {
            debug!(endpoint = %endpoint, "Pipeline hop");
            match self.gateway.post_step(endpoint, &payload).await {
                Ok(next) => payload = next,
                Err(e) => return ResponseEnvelope::error(e.to_string()),
            }
        }

        match payload.get("text").and_then(Value::as_str) {
            Some(text) if !text.is_empty() => ResponseEnvelope::answer(text),
            _ => ResponseEnvelope::error("No output"),
        }
    }
}
