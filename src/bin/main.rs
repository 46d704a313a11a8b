//! Interactive text-mode client.
//!
//! Types queries straight into the orchestrator (skipping the STT hop) and
//! carries the session clarification state the way a UI client would:
//! bounded clarify rounds, a terminal message on exhaustion, reset on any
//! final answer.

use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::info;
use voice_finance_orchestrator::{
    agent::Orchestrator,
    clarify::{ClarifySession, SessionOutcome},
    collaborators::{CollaboratorConfig, HttpCollaborators},
    models::{Query, ResponseEnvelope},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    dotenv::dotenv().ok();

    let config = CollaboratorConfig::from_env();
    let gateway = Arc::new(HttpCollaborators::new(config.clone())?);
    let orchestrator = Orchestrator::new(gateway, config);
    let mut session = ClarifySession::new();

    info!("Interactive assistant ready");
    println!("Finance assistant. Type a question, or \"quit\" to exit.");

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if text.eq_ignore_ascii_case("quit") || text.eq_ignore_ascii_case("exit") {
            break;
        }

        // The query carries the session's attempt counter; the orchestrator
        // itself never sees state from previous rounds.
        let query = Query {
            text: text.to_string(),
            attempts: session.attempts(),
        };

        let envelope = orchestrator.handle_query(&query.text).await;

        match session.observe(envelope) {
            SessionOutcome::Deliver(ResponseEnvelope::Answer { response }) => {
                println!("{}", response);
            }
            SessionOutcome::Deliver(ResponseEnvelope::Clarify { clarify_prompt, .. }) => {
                println!("{} (attempt {})", clarify_prompt, session.attempts());
            }
            SessionOutcome::Deliver(ResponseEnvelope::Failure { error }) => {
                println!("Error: {}", error);
            }
            SessionOutcome::Exhausted(message) => {
                println!("{}", message);
            }
        }
    }

    Ok(())
}
