//! Voice Finance Orchestrator
//!
//! Query orchestration engine for a voice-driven finance assistant:
//! - Classifies transcribed queries into a fixed set of intents
//! - Extracts ticker symbols from free text
//! - Chains collaborator services into sequential analysis pipelines
//! - Falls back to clarification requests when confidence is low
//!
//! FLOW: audio → (STT collaborator) → text → classify → plan → envelope

pub mod agent;
pub mod api;
pub mod clarify;
pub mod classifier;
pub mod collaborators;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod ticker;

pub use error::Result;

// Re-export common types
pub use models::{Intent, Query, ResponseEnvelope};
