#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use axum::Router;
use futures::stream::{self, StreamExt};
use tower::ServiceExt;

use zanalyx_backend::app::create_app;
use zanalyx_backend::config::AppConfig;
use zanalyx_backend::external::exchange::{ExchangeClient, ExchangeError};
use zanalyx_backend::external::inference::{ChunkStream, InferenceBackend, InferenceError};
use zanalyx_backend::models::{Candle, ChatMessage, Interval};
use zanalyx_backend::state::AppState;

pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq)]
pub struct KlineCall {
    pub symbol: String,
    pub interval: Interval,
    pub start_ms: i64,
    pub end_ms: i64,
    pub limit: u32,
}

/// Exchange double that serves canned candles and records every call.
#[derive(Default)]
pub struct FakeExchange {
    pub candles: Vec<Candle>,
    pub fail_with_status: Option<u16>,
    pub spot_prices: Vec<(String, f64)>,
    pub kline_calls: Mutex<Vec<KlineCall>>,
    pub spot_calls: AtomicUsize,
}

impl FakeExchange {
    pub fn with_candles(candles: Vec<Candle>) -> Self {
        Self { candles, ..Self::default() }
    }

    pub fn failing(status: u16) -> Self {
        Self { fail_with_status: Some(status), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<KlineCall> {
        self.kline_calls.lock().unwrap().clone()
    }

    pub fn total_calls(&self) -> usize {
        self.calls().len() + self.spot_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExchangeClient for FakeExchange {
    async fn fetch_klines(
        &self,
        symbol: &str,
        interval: Interval,
        start_ms: i64,
        end_ms: i64,
        limit: u32,
    ) -> Result<Vec<Candle>, ExchangeError> {
        self.kline_calls.lock().unwrap().push(KlineCall {
            symbol: symbol.to_string(),
            interval,
            start_ms,
            end_ms,
            limit,
        });
        match self.fail_with_status {
            Some(status) => Err(ExchangeError::Status(status)),
            None => Ok(self.candles.clone()),
        }
    }

    async fn fetch_spot_price(&self, symbol: &str) -> Result<f64, ExchangeError> {
        self.spot_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_with_status {
            return Err(ExchangeError::Status(status));
        }
        self.spot_prices
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, price)| *price)
            .ok_or_else(|| ExchangeError::Parse(format!("no price for {}", symbol)))
    }
}

/// What the fake inference backend does when a chat is opened.
pub enum Script {
    Lines(Vec<&'static str>),
    LinesThenDisconnect(Vec<&'static str>),
    Refuse,
}

pub struct FakeInference {
    pub script: Script,
    pub ready: bool,
    pub received: Mutex<Vec<ChatMessage>>,
}

impl FakeInference {
    pub fn new(script: Script) -> Self {
        Self { script, ready: true, received: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl InferenceBackend for FakeInference {
    async fn open_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream, InferenceError> {
        *self.received.lock().unwrap() = messages.to_vec();

        let (lines, disconnect) = match &self.script {
            Script::Refuse => return Err(InferenceError::Unavailable("connection refused".into())),
            Script::Lines(lines) => (lines.clone(), false),
            Script::LinesThenDisconnect(lines) => (lines.clone(), true),
        };

        let chunks = stream::iter(
            lines
                .into_iter()
                .map(|l| Ok::<_, InferenceError>(Bytes::from_static(l.as_bytes()))),
        );
        if disconnect {
            let failure = stream::once(async { Err(InferenceError::Stream("connection reset".into())) });
            Ok(chunks.chain(failure).boxed())
        } else {
            Ok(chunks.boxed())
        }
    }

    async fn is_ready(&self) -> bool {
        self.ready
    }
}

pub fn app_with(exchange: Arc<FakeExchange>, inference: Arc<FakeInference>) -> Router {
    create_app(AppState::new(AppConfig::default(), exchange, inference))
}

pub fn idle_inference() -> Arc<FakeInference> {
    Arc::new(FakeInference::new(Script::Lines(vec![])))
}

/// Daily candles starting at `start_ms`, closes taken from `closes`.
pub fn daily_candles(start_ms: i64, closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Candle::new(start_ms + i as i64 * DAY_MS, close, 1_000.0 + i as f64))
        .collect()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
