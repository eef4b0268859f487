use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::InferenceConfig;
use crate::external::inference::{ChunkStream, InferenceBackend, InferenceError};
use crate::models::ChatMessage;

/// Body the Ollama server prints on its root path when it is up.
const READY_BANNER: &str = "Ollama is running";

#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Client for a local Ollama server's `/api/chat` endpoint.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaClient {
    /// Generation can run for minutes, so only connecting is bounded by a timeout.
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            client,
        })
    }
}

#[async_trait]
impl InferenceBackend for OllamaClient {
    async fn open_chat(&self, messages: &[ChatMessage]) -> Result<ChunkStream, InferenceError> {
        info!("Opening chat stream (model: {}, messages: {})", self.model, messages.len());

        let request = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status.as_u16()));
        }

        Ok(response
            .bytes_stream()
            .map_err(|e| InferenceError::Stream(e.to_string()))
            .boxed())
    }

    async fn is_ready(&self) -> bool {
        let response = match self.client.get(&self.base_url).send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("Inference readiness probe failed: {}", e);
                return false;
            }
        };

        match response.text().await {
            Ok(body) => body.trim() == READY_BANNER,
            Err(e) => {
                debug!("Inference readiness probe returned unreadable body: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChatRole;

    #[test]
    fn test_chat_request_body_shape() {
        let messages = vec![ChatMessage {
            role: ChatRole::User,
            content: "hello".to_string(),
        }];
        let request = OllamaChatRequest {
            model: "zanalyx",
            messages: &messages,
            stream: true,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "zanalyx",
                "messages": [{"role": "user", "content": "hello"}],
                "stream": true
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_not_ready() {
        let config = InferenceConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            ..InferenceConfig::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert!(!client.is_ready().await);
    }
}
