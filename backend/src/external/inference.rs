use async_trait::async_trait;
use axum::body::Bytes;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::models::ChatMessage;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference backend unreachable: {0}")]
    Unavailable(String),

    #[error("inference backend returned status {0}")]
    Status(u16),

    #[error("inference stream failed: {0}")]
    Stream(String),
}

/// Raw response body of a streaming chat call, chunked however the network delivered it.
pub type ChunkStream = BoxStream<'static, Result<Bytes, InferenceError>>;

/// A chat-capable inference server.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Starts a streaming chat completion for the whole conversation.
    ///
    /// Returns once the backend has accepted the request; the body is read lazily
    /// from the returned stream. Dropping the stream abandons the upstream request.
    async fn open_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream, InferenceError>;

    /// Whether the backend answers its readiness probe.
    async fn is_ready(&self) -> bool;
}
