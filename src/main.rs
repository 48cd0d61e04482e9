//! API orchestrator — chat service entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger (ORCHESTRATOR_LOG_LEVEL > RUST_LOG > config)
//!   4. Build the orchestrator (LLM provider, registry, prompts)
//!   5. Spawn Ctrl-C → shutdown watcher
//!   6. Serve `/chat` until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use api_orchestrator::config::{self, API_KEY_ENV};
use api_orchestrator::error::AppError;
use api_orchestrator::logger;
use api_orchestrator::orchestrator::Orchestrator;
use api_orchestrator::server;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;

    let force_level = std::env::var_os("ORCHESTRATOR_LOG_LEVEL").is_some();
    logger::init(&config.log_level, force_level)?;

    info!(
        bind = %config.server.bind,
        provider = %config.llm.provider,
        model = %config.llm.openai.model,
        apis = config.apis.len(),
        log_level = %config.log_level,
        "config loaded"
    );
    if config.llm.provider != "dummy" && config.llm_api_key.is_none() {
        warn!("{API_KEY_ENV} is not set — LLM calls will likely fail");
    }

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);

    let shutdown = CancellationToken::new();
    server::spawn_ctrl_c(shutdown.clone());

    server::serve("chat", server::router(orchestrator), &config.server.bind, shutdown).await
}
