//! Mock downstream APIs — serves the fixed `/order`, `/payment`, `/patient`
//! and `/lab` payloads on `[mock] bind` (default `127.0.0.1:8001`).

use tokio_util::sync::CancellationToken;
use tracing::info;

use api_orchestrator::config;
use api_orchestrator::error::AppError;
use api_orchestrator::{logger, mock, server};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level, false)?;

    info!(bind = %config.mock.bind, "starting mock backend");

    let shutdown = CancellationToken::new();
    server::spawn_ctrl_c(shutdown.clone());

    server::serve("mock", mock::router(), &config.mock.bind, shutdown).await
}
