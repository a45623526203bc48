pub mod ai; // Clinical summary and Q&A completions
pub mod api; // HTTP surface
pub mod archive; // Patient history store
pub mod config;
pub mod intake; // Summary → archive → report pipeline
pub mod qa; // Question answering with illustrations
pub mod report; // PDF clinical report

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::ai::{AiError, LlmClient, OpenAiClient};
use crate::api::ApiContext;
use crate::config::{AppConfig, ConfigError};

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("AI client error: {0}")]
    Ai(#[from] AiError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// Start the application and serve until Ctrl+C.
pub fn run() -> Result<(), StartupError> {
    // A missing .env file is fine; the process environment still applies.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    if !config.has_api_key() {
        tracing::warn!(
            var = config::API_KEY_VAR,
            "No API key configured, summaries will report a configuration error"
        );
    }

    // The blocking HTTP client owns its own runtime; build and drop it
    // outside the async runtime below.
    let client = Arc::new(OpenAiClient::from_config(&config)?);
    let ctx = ApiContext::from_config(&config, client.clone() as Arc<dyn LlmClient>);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(serve(ctx, SocketAddr::new(config.bind_ip, config.port)));
    drop(runtime);
    drop(client);
    result
}

async fn serve(ctx: ApiContext, addr: SocketAddr) -> Result<(), StartupError> {
    let mut server = api::start_server_on(ctx, addr)
        .await
        .map_err(StartupError::Server)?;

    tracing::info!(addr = %server.session.server_addr, "Listening");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Cannot listen for shutdown signal: {e}");
    }

    server.shutdown();
    server.stopped().await;
    Ok(())
}
