//! Concierge server entry point.
//!
//! Startup order matters: configuration is loaded and validated, the
//! assistant persona is provisioned with the backend, and only then does
//! the listener bind. A provisioning failure is fatal; the service never
//! accepts chat traffic without an assistant handle.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use concierge::adapters::http::{app_router, ChatAppState};
use concierge::adapters::{InMemorySessionStore, OpenAIAssistantsBackend, OpenAIAssistantsConfig};
use concierge::application::{PollConfig, SessionDirectory, TurnOrchestrator};
use concierge::config::{AppConfig, ValidationError};
use concierge::ports::{AssistantBackend, AssistantSpec};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.log_level))
        .init();

    config.validate()?;

    let api_key = config
        .assistant
        .openai_api_key
        .clone()
        .ok_or(ValidationError::MissingRequired("OPENAI_API_KEY"))?;
    let vector_store_id = config
        .assistant
        .vector_store_id
        .clone()
        .ok_or(ValidationError::MissingRequired("VECTOR_STORE_ID"))?;

    let backend_config = OpenAIAssistantsConfig::new(api_key)
        .with_base_url(config.assistant.base_url.clone())
        .with_timeout(config.assistant.request_timeout());
    let backend: Arc<dyn AssistantBackend> = Arc::new(OpenAIAssistantsBackend::new(backend_config)?);

    // One-time, blocking provisioning. Failure here aborts startup.
    tracing::info!(name = %config.assistant.name, model = %config.assistant.model, "provisioning assistant");
    let spec = AssistantSpec::customer_support(
        config.assistant.name.clone(),
        config.assistant.instructions.clone(),
        config.assistant.model.clone(),
        vector_store_id,
    );
    let assistant_id = backend.create_assistant(&spec).await.map_err(|e| {
        tracing::error!(error = %e, "assistant provisioning failed");
        e
    })?;
    tracing::info!(assistant = %assistant_id, "assistant ready");

    let directory = Arc::new(SessionDirectory::new(
        Arc::new(InMemorySessionStore::new()),
        backend.clone(),
    ));
    let orchestrator = Arc::new(TurnOrchestrator::new(
        directory,
        backend,
        assistant_id,
        PollConfig {
            interval: config.assistant.poll_interval(),
            attempts: config.assistant.poll_attempts,
        },
    ));

    let app = app_router(ChatAppState::new(orchestrator), &config.server);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
