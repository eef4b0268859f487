use axum::response::IntoResponse;
use axum::Json;
use reqwest::StatusCode;
use thiserror::Error;

use crate::external::exchange::ExchangeError;
use crate::external::inference::InferenceError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported cryptocurrency: {0}")]
    UnsupportedAsset(String),
    #[error("Invalid time range: start_time {start} must be before end_time {end}")]
    InvalidRange { start: i64, end: i64 },
    #[error("No price data available")]
    NoPriceData,
    #[error("Failed to fetch data from our sources (upstream status {status})")]
    UpstreamFetchFailed { status: u16 },
    #[error("External error: {0}")]
    External(String),
    #[error(
        "Calculation error: array length mismatch (prices {expected}, ma_short {ma_short}, ma_long {ma_long}, volatility {volatility})"
    )]
    LengthMismatch {
        expected: usize,
        ma_short: usize,
        ma_long: usize,
        volatility: usize,
    },
    #[error("Error communicating with LLM: {0}")]
    InferenceBackendUnavailable(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedAsset(_) | AppError::InvalidRange { .. } | AppError::NoPriceData => {
                StatusCode::BAD_REQUEST
            }
            AppError::UpstreamFetchFailed { status } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::External(_) => StatusCode::BAD_GATEWAY,
            AppError::LengthMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InferenceBackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(serde_json::json!({ "detail": self.to_string() }));
        (self.status_code(), body).into_response()
    }
}

impl From<ExchangeError> for AppError {
    fn from(value: ExchangeError) -> Self {
        match value {
            ExchangeError::Status(status) => AppError::UpstreamFetchFailed { status },
            other => AppError::External(other.to_string()),
        }
    }
}

impl From<InferenceError> for AppError {
    fn from(value: InferenceError) -> Self {
        AppError::InferenceBackendUnavailable(value.to_string())
    }
}
