pub mod binance;
pub mod exchange;
pub mod inference;
pub mod ollama;
