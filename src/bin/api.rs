use std::sync::Arc;
use tracing::info;
use voice_finance_orchestrator::{
    agent::Orchestrator,
    api::start_server,
    collaborators::{CollaboratorConfig, HttpCollaborators},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    dotenv::dotenv().ok();

    let port: u16 = std::env::var("PORT")
        .or_else(|_| std::env::var("API_PORT"))
        .unwrap_or_else(|_| "8000".to_string())
        .parse()?;

    info!("Voice Finance Orchestrator - API Server");
    info!("Port: {}", port);

    let config = CollaboratorConfig::from_env();
    let gateway = Arc::new(HttpCollaborators::new(config.clone())?);
    let orchestrator = Arc::new(Orchestrator::new(gateway, config));

    info!("Orchestrator initialized");

    start_server(orchestrator, port).await?;

    Ok(())
}
