//! Clarification Controller
//!
//! Confidence gate for the retrieval path, plus the client-side session
//! bookkeeping that bounds how many consecutive clarification rounds a user
//! gets before the conversation is declared exhausted. The orchestrator
//! itself stays stateless; sessions live entirely in the calling client.

use crate::models::ResponseEnvelope;

/// Retrieval results below this confidence trigger a clarification request.
pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

/// Consecutive clarification rounds allowed before the session gives up.
pub const MAX_CLARIFY_ATTEMPTS: u32 = 3;

pub const EXHAUSTED_MESSAGE: &str =
    "Too many ambiguous attempts. Please start over with a more specific question.";

/// Whether a retrieval result is too weak to analyze.
pub fn should_clarify(confidence: f64, results: &[serde_json::Value]) -> bool {
    confidence < CONFIDENCE_THRESHOLD || results.is_empty()
}

/// Outcome of feeding one orchestrator envelope into the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// Pass the envelope through to the user unchanged.
    Deliver(ResponseEnvelope),
    /// The clarify round limit was hit; show the terminal message instead
    /// of another prompt. The session has already been reset.
    Exhausted(&'static str),
}

/// Per-session clarification state, carried by the calling client across
/// repeated orchestrator invocations.
#[derive(Debug, Default)]
pub struct ClarifySession {
    outstanding_prompt: Option<String>,
    attempts: u32,
}

impl ClarifySession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn outstanding_prompt(&self) -> Option<&str> {
        self.outstanding_prompt.as_deref()
    }

    /// Track one envelope. Clarify envelopes increment the round counter;
    /// anything else resolves the session. Exceeding the bound yields the
    /// distinct terminal outcome and resets the counter and prior prompt.
    pub fn observe(&mut self, envelope: ResponseEnvelope) -> SessionOutcome {
        match &envelope {
            ResponseEnvelope::Clarify { clarify_prompt, .. } => {
                self.attempts += 1;
                if self.attempts > MAX_CLARIFY_ATTEMPTS {
                    self.reset();
                    return SessionOutcome::Exhausted(EXHAUSTED_MESSAGE);
                }
                self.outstanding_prompt = Some(clarify_prompt.clone());
                SessionOutcome::Deliver(envelope)
            }
            _ => {
                self.reset();
                SessionOutcome::Deliver(envelope)
            }
        }
    }

    pub fn reset(&mut self) {
        self.outstanding_prompt = None;
        self.attempts = 0;
    }
}
