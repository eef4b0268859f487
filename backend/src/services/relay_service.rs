use std::collections::VecDeque;

use axum::body::Bytes;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, error, info, warn};

use crate::errors::AppError;
use crate::external::inference::{ChunkStream, InferenceBackend, InferenceError};
use crate::models::ChatMessage;

/// Backend output re-framed as one newline-terminated line per item.
pub type RelayStream = BoxStream<'static, Result<Bytes, InferenceError>>;

/// Opens a chat on the inference backend and returns its output as a lazy
/// line stream.
///
/// Failing to open the chat is an error here. Once the stream is returned,
/// an upstream failure ends it with one `Err` item and no further lines.
/// Dropping the stream drops the upstream response.
pub async fn relay_chat(
    backend: &dyn InferenceBackend,
    conversation: &[ChatMessage],
) -> Result<RelayStream, AppError> {
    let upstream = backend.open_chat(conversation).await.map_err(|e| {
        error!("Failed to open chat with inference backend: {}", e);
        AppError::from(e)
    })?;

    info!("Relaying chat stream ({} messages)", conversation.len());
    Ok(split_lines(upstream))
}

/// Longest line accepted from the backend before the relay gives up.
pub const MAX_LINE_BYTES: usize = 1 << 20;

struct LineSplitter {
    upstream: ChunkStream,
    partial: Vec<u8>,
    /// Prefix of `partial` already known to hold no `\n`.
    scanned: usize,
    ready: VecDeque<Bytes>,
    failure: Option<InferenceError>,
    finished: bool,
    relayed: usize,
}

impl LineSplitter {
    fn new(upstream: ChunkStream) -> Self {
        Self {
            upstream,
            partial: Vec::new(),
            scanned: 0,
            ready: VecDeque::new(),
            failure: None,
            finished: false,
            relayed: 0,
        }
    }

    fn push_chunk(&mut self, chunk: &[u8]) -> Result<(), InferenceError> {
        self.partial.extend_from_slice(chunk);
        while let Some(offset) = self.partial[self.scanned..].iter().position(|&b| b == b'\n') {
            let pos = self.scanned + offset;
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            self.scanned = 0;
            self.push_line(&line[..pos]);
        }
        self.scanned = self.partial.len();

        if self.partial.len() > MAX_LINE_BYTES {
            return Err(InferenceError::Stream(format!(
                "line exceeds {} bytes without a newline",
                MAX_LINE_BYTES
            )));
        }
        Ok(())
    }

    /// Queues `line` with a `\n` terminator unless it is empty.
    fn push_line(&mut self, line: &[u8]) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        if line.is_empty() {
            return;
        }
        let mut framed = Vec::with_capacity(line.len() + 1);
        framed.extend_from_slice(line);
        framed.push(b'\n');
        self.ready.push_back(Bytes::from(framed));
    }

    /// Upstream ended cleanly: the unterminated tail is a complete last line.
    fn flush_tail(&mut self) {
        let tail = std::mem::take(&mut self.partial);
        self.scanned = 0;
        self.push_line(&tail);
    }

    /// Lines already queued are still relayed; the error follows them and ends the stream.
    fn fail(&mut self, e: InferenceError) {
        warn!(
            "Inference stream failed after {} lines; closing relay: {}",
            self.relayed + self.ready.len(),
            e
        );
        self.finished = true;
        self.partial.clear();
        self.scanned = 0;
        self.failure = Some(e);
    }
}

/// Re-frames a raw chunk stream into lines. Empty lines are dropped, and a
/// line longer than `MAX_LINE_BYTES` ends the stream with an error.
pub fn split_lines(upstream: ChunkStream) -> RelayStream {
    stream::unfold(LineSplitter::new(upstream), |mut splitter| async move {
        loop {
            if let Some(line) = splitter.ready.pop_front() {
                splitter.relayed += 1;
                return Some((Ok(line), splitter));
            }
            if let Some(e) = splitter.failure.take() {
                return Some((Err(e), splitter));
            }
            if splitter.finished {
                return None;
            }

            match splitter.upstream.next().await {
                Some(Ok(chunk)) => {
                    if let Err(e) = splitter.push_chunk(&chunk) {
                        splitter.fail(e);
                    }
                }
                Some(Err(e)) => splitter.fail(e),
                None => {
                    splitter.finished = true;
                    splitter.flush_tail();
                    debug!("Inference stream completed ({} lines before tail)", splitter.relayed);
                }
            }
        }
    })
    .boxed()
}
