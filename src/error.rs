//! Error types for the voice finance orchestrator

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

#[derive(Error, Debug)]
pub enum OrchestratorError {

    // =============================
    // Core Pipeline Errors
    // =============================

    #[error("Transcription error: {0}")]
    TranscriptionError(String),

    #[error("Collaborator error: {0}")]
    CollaboratorError(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),

    #[error("Malformed collaborator response: {0}")]
    MalformedResponse(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
