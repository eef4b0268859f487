use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ExchangeConfig;
use crate::external::exchange::{ExchangeClient, ExchangeError};
use crate::models::{Candle, Interval};

/// Public (unsigned) Binance spot market-data endpoints.
pub struct BinanceClient {
    client: reqwest::Client,
    base_url: String,
}

impl BinanceClient {
    pub fn new(config: &ExchangeConfig) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

/// Parses the klines array-of-arrays body.
///
/// Row layout: `[0]` open time, `[1]` open, `[2]` high, `[3]` low, `[4]` close,
/// `[5]` volume, `[6]` close time, ... Decimal fields arrive as strings.
fn parse_klines(body: &serde_json::Value) -> Result<Vec<Candle>, ExchangeError> {
    let rows = body
        .as_array()
        .ok_or_else(|| ExchangeError::Parse("klines response is not an array".into()))?;

    rows.iter()
        .map(|row| {
            let fields = row
                .as_array()
                .ok_or_else(|| ExchangeError::Parse("kline entry is not an array".into()))?;
            if fields.len() < 6 {
                return Err(ExchangeError::Parse(format!(
                    "kline entry has {} fields, expected at least 6",
                    fields.len()
                )));
            }

            let open_time = fields[0]
                .as_i64()
                .ok_or_else(|| ExchangeError::Parse("kline open time is not an integer".into()))?;
            let close = decimal_field(&fields[4], "close")?;
            let volume = decimal_field(&fields[5], "volume")?;

            Ok(Candle::new(open_time, close, volume))
        })
        .collect()
}

fn decimal_field(value: &serde_json::Value, name: &str) -> Result<f64, ExchangeError> {
    match value {
        serde_json::Value::String(s) => s
            .parse::<f64>()
            .map_err(|e| ExchangeError::Parse(format!("kline {}: {}", name, e))),
        serde_json::Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| ExchangeError::Parse(format!("kline {} out of range", name))),
        _ => Err(ExchangeError::Parse(format!("kline {} has unexpected type", name))),
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, ExchangeError> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let start = start_ms.to_string();
        let end = end_ms.to_string();
        let limit = limit.to_string();

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", interval.as_str()),
                ("startTime", start.as_str()),
                ("endTime", end.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Binance GET /api/v3/klines for {} returned {}", symbol, status);
            return Err(ExchangeError::Status(status.as_u16()));
        }

        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| ExchangeError::Parse(e.to_string()))?;

        let candles = parse_klines(&body)?;
        debug!(symbol, interval = interval.as_str(), count = candles.len(), "klines fetched");
        Ok(candles)
    }

    async fn fetch_spot_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("symbol", symbol)])
            .send()
            .await
            .map_err(|e| ExchangeError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("Binance GET /api/v3/ticker/price for {} returned {}", symbol, status);
            return Err(ExchangeError::Status(status.as_u16()));
        }

        let ticker: TickerPrice = resp
            .json()
            .await
            .map_err(|e| ExchangeError::Parse(e.to_string()))?;

        ticker
            .price
            .parse::<f64>()
            .map_err(|e| ExchangeError::Parse(format!("ticker price: {}", e)))
    }
}
