use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, info};

use crate::errors::AppError;
use crate::models::{Asset, HistoricalData, MetricsPayload};
use crate::services::{market_data_service, metrics_service};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/historical/:symbol", get(get_historical))
        .route("/advanced-metrics/:symbol", get(get_advanced_metrics))
        .route("/prices", get(get_current_prices))
}

/// Optional Unix-millisecond bounds. Omitted bounds fall back to the configured lookback.
#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    start_time: Option<i64>,
    end_time: Option<i64>,
}

/// GET /crypto/historical/:symbol?start_time&end_time
/// Close prices and volumes as `[timestamp, value]` pairs
pub async fn get_historical(
    Path(symbol): Path<String>,
    Query(range): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<HistoricalData>, AppError> {
    info!("GET /crypto/historical/{} - start: {:?}, end: {:?}", symbol, range.start_time, range.end_time);
    let asset: Asset = symbol.parse()?;

    let data = market_data_service::get_historical(
        state.exchange.as_ref(),
        &state.config.exchange,
        asset,
        range.start_time,
        range.end_time,
    )
    .await?;

    Ok(Json(data))
}

/// GET /crypto/advanced-metrics/:symbol?start_time&end_time
/// Moving averages, rolling volatility and volumes
pub async fn get_advanced_metrics(
    Path(symbol): Path<String>,
    Query(range): Query<RangeQuery>,
    State(state): State<AppState>,
) -> Result<Json<MetricsPayload>, AppError> {
    info!("GET /crypto/advanced-metrics/{} - start: {:?}, end: {:?}", symbol, range.start_time, range.end_time);
    let asset: Asset = symbol.parse()?;

    let payload = metrics_service::get_advanced_metrics(
        state.exchange.as_ref(),
        &state.config.exchange,
        &state.config.indicators,
        asset,
        range.start_time,
        range.end_time,
    )
    .await
    .map_err(|e| {
        error!("Failed to compute advanced metrics for {}: {}", asset, e);
        e
    })?;

    Ok(Json(payload))
}

/// GET /crypto/prices
/// Spot price of every supported asset
pub async fn get_current_prices(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<String, f64>>, AppError> {
    info!("GET /crypto/prices - Getting spot prices");
    let prices =
        market_data_service::get_current_prices(state.exchange.as_ref(), &state.config.exchange).await?;
    Ok(Json(prices))
}
