//! REST API Server for the Query Orchestrator
//!
//! Single inbound surface: an audio upload endpoint returning one of the
//! three envelope shapes as JSON, plus a health probe. Session clarification
//! state lives in the caller, so the server holds nothing between requests.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::agent::Orchestrator;
use crate::models::ResponseEnvelope;

#[derive(Clone)]
pub struct ApiState {
    pub orchestrator: Arc<Orchestrator>,
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Accepts a multipart audio upload and runs the full transcribe → route flow.
async fn handle_query(
    State(state): State<ApiState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<ResponseEnvelope>) {
    let request_id = Uuid::new_v4();

    let mut audio: Option<Vec<u8>> = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            match field.bytes().await {
                Ok(bytes) => audio = Some(bytes.to_vec()),
                Err(e) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ResponseEnvelope::error(format!("Invalid upload: {}", e))),
                    );
                }
            }
            break;
        }
    }

    let Some(audio) = audio else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ResponseEnvelope::error("Missing 'file' field in upload")),
        );
    };

    info!(%request_id, bytes = audio.len(), "Received audio query");

    let envelope = state.orchestrator.handle_audio(audio).await;
    info!(%request_id, clarify = envelope.is_clarify(), "Query handled");

    (StatusCode::OK, Json(envelope))
}

pub fn create_router(orchestrator: Arc<Orchestrator>) -> Router {
    let state = ApiState { orchestrator };

    Router::new()
        .route("/health", get(health))
        .route("/query", post(handle_query))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn start_server(
    orchestrator: Arc<Orchestrator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(orchestrator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
