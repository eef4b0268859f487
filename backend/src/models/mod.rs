mod asset;
mod candle;
mod chat;
mod series;

pub use asset::Asset;
pub use candle::{Candle, Interval};
pub use chat::{ChatMessage, ChatRequest, ChatRole};
pub use series::{AlignedSeries, HistoricalData, MetricsPayload, SeriesPoint};
