use std::sync::Arc;

use crate::config::AppConfig;
use crate::external::exchange::ExchangeClient;
use crate::external::inference::InferenceBackend;

/// Per-process handles shared by all requests. Nothing in here is mutated
/// after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub exchange: Arc<dyn ExchangeClient>,
    pub inference: Arc<dyn InferenceBackend>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        exchange: Arc<dyn ExchangeClient>,
        inference: Arc<dyn InferenceBackend>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            exchange,
            inference,
        }
    }
}
