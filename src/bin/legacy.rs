use std::sync::Arc;

use burrow::config::LegacyConfig;
use burrow::legacy::{self, LegacyState, MemoryKv};
use burrow::llm::OpenRouterClient;
use burrow::shutdown::shutdown_signal;
use burrow::telemetry;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = LegacyConfig::from_env()?;
    let provider = OpenRouterClient::new(config.openrouter)?;
    let state = LegacyState::new(Arc::new(MemoryKv::new()), Arc::new(provider));
    let routes = legacy::configure_routes(state);

    info!(address = %config.bind, "Starting legacy server");
    warp::serve(routes)
        .bind(config.bind)
        .await
        .graceful(shutdown_signal())
        .run()
        .await;

    info!("Server shutdown complete");
    Ok(())
}
