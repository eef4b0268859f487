pub mod aligner;
pub mod indicators;
pub mod market_data_service;
pub mod metrics_service;
pub mod relay_service;
