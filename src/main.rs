use burrow::config::Config;
use burrow::routes::configure_routes;
use burrow::shutdown::shutdown_signal;
use burrow::{store, telemetry};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    telemetry::init();

    let config = Config::from_env()?;
    let store = store::connect(&config.app_id, &config.backend).await?;
    let routes = configure_routes(store.clone());

    info!(address = %config.bind, app_id = %config.app_id, "Starting server");
    warp::serve(routes)
        .bind(config.bind)
        .await
        .graceful(shutdown_signal())
        .run()
        .await;

    store.close().await;
    info!("Server shutdown complete");
    Ok(())
}
