use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};

use zanalyx_backend::app;
use zanalyx_backend::config::AppConfig;
use zanalyx_backend::external::binance::BinanceClient;
use zanalyx_backend::external::inference::InferenceBackend;
use zanalyx_backend::external::ollama::OllamaClient;
use zanalyx_backend::logging::{init_logging, LoggingConfig};
use zanalyx_backend::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    let exchange = Arc::new(BinanceClient::new(&config.exchange)?);
    info!("📊 Exchange data from {}", config.exchange.base_url);

    let inference = Arc::new(OllamaClient::new(&config.inference)?);
    if inference.is_ready().await {
        info!("🤖 Inference backend ready at {} (model: {})", config.inference.base_url, config.inference.model);
    } else {
        warn!(
            "Inference backend at {} is not ready; chat requests will fail until it is",
            config.inference.base_url
        );
    }

    let addr = config.bind_addr;
    let state = AppState::new(config, exchange, inference);
    let app = app::create_app(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("🚀 Zanalyx backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
