//! Runs one provider exchange on a background task.
//!
//! The task forwards every chunk into a channel owned by the caller. Provider
//! failures, both before and during streaming, arrive as
//! [`ChunkKind::Error`](crate::chunk::ChunkKind::Error) chunks and never end
//! the exchange early. The channel closing is the only completion signal.

use futures_util::StreamExt;
use futures_util::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;

use crate::chunk::StreamChunk;
use crate::providers::{ChunkStream, ProviderResult};

/// Result of a non-blocking poll.
#[derive(Debug, PartialEq, Eq)]
pub enum ExchangePoll {
    Chunk(StreamChunk),
    /// Nothing buffered right now.
    Pending,
    /// The producer finished; no more chunks will arrive.
    Closed,
}

/// Handle to an in-flight exchange.
pub struct Exchange {
    rx: mpsc::UnboundedReceiver<StreamChunk>,
    task: JoinHandle<()>,
}

impl Exchange {
    /// Spawns the producer task. Must be called inside a tokio runtime.
    pub fn start(request: BoxFuture<'static, ProviderResult<ChunkStream>>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(pump(request, tx));
        Self { rx, task }
    }

    /// Returns the next buffered chunk without waiting.
    pub fn try_next(&mut self) -> ExchangePoll {
        match self.rx.try_recv() {
            Ok(chunk) => ExchangePoll::Chunk(chunk),
            Err(TryRecvError::Empty) => ExchangePoll::Pending,
            Err(TryRecvError::Disconnected) => ExchangePoll::Closed,
        }
    }

    /// Waits for the next chunk; `None` once the exchange is closed.
    pub async fn next(&mut self) -> Option<StreamChunk> {
        self.rx.recv().await
    }
}

impl Drop for Exchange {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn pump(
    request: BoxFuture<'static, ProviderResult<ChunkStream>>,
    tx: mpsc::UnboundedSender<StreamChunk>,
) {
    let mut stream = match request.await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::warn!(kind = %e.kind, error = %e, "exchange request failed");
            let _ = tx.send(StreamChunk::error(e.to_string()));
            return;
        }
    };

    let mut forwarded = 0usize;
    while let Some(item) = stream.next().await {
        let chunk = item.unwrap_or_else(|e| {
            tracing::warn!(kind = %e.kind, error = %e, "exchange stream error");
            StreamChunk::error(e.to_string())
        });
        if tx.send(chunk).is_err() {
            tracing::debug!("exchange receiver dropped");
            return;
        }
        forwarded += 1;
    }
    tracing::debug!(chunks = forwarded, "exchange stream closed");
}

#[cfg(test)]
mod tests {
    use futures_util::stream;

    use super::*;
    use crate::chunk::ChunkKind;
    use crate::providers::ProviderError;

    fn scripted(
        items: Vec<ProviderResult<StreamChunk>>,
    ) -> BoxFuture<'static, ProviderResult<ChunkStream>> {
        Box::pin(async move { Ok(stream::iter(items).boxed()) })
    }

    async fn drain(mut exchange: Exchange) -> Vec<StreamChunk> {
        let mut chunks = Vec::new();
        while let Some(chunk) = exchange.next().await {
            chunks.push(chunk);
        }
        chunks
    }

    #[tokio::test]
    async fn test_forwards_chunks_in_order_then_closes() {
        let exchange = Exchange::start(scripted(vec![
            Ok(StreamChunk::reasoning("thinking...")),
            Ok(StreamChunk::response("Hi")),
            Ok(StreamChunk::response(" there")),
        ]));

        let chunks = drain(exchange).await;
        assert_eq!(
            chunks,
            vec![
                StreamChunk::reasoning("thinking..."),
                StreamChunk::response("Hi"),
                StreamChunk::response(" there"),
            ]
        );
    }

    #[tokio::test]
    async fn test_stream_error_becomes_chunk_and_draining_continues() {
        let exchange = Exchange::start(scripted(vec![
            Ok(StreamChunk::response("partial")),
            Err(ProviderError::parse("bad frame")),
            Ok(StreamChunk::response(" more")),
        ]));

        let chunks = drain(exchange).await;
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], StreamChunk::error("bad frame"));
        assert_eq!(chunks[2].kind, ChunkKind::Response);
    }

    #[tokio::test]
    async fn test_request_failure_yields_single_error_chunk() {
        let request: BoxFuture<'static, ProviderResult<ChunkStream>> =
            Box::pin(async { Err(ProviderError::http_status(429, "")) });

        let chunks = drain(Exchange::start(request)).await;
        assert_eq!(chunks, vec![StreamChunk::error("HTTP 429")]);
    }

    #[tokio::test]
    async fn test_try_next_reports_closed_after_drain() {
        let mut exchange = Exchange::start(scripted(vec![Ok(StreamChunk::response("x"))]));

        let mut seen = Vec::new();
        loop {
            match exchange.try_next() {
                ExchangePoll::Chunk(chunk) => seen.push(chunk),
                ExchangePoll::Pending => tokio::task::yield_now().await,
                ExchangePoll::Closed => break,
            }
        }
        assert_eq!(seen, vec![StreamChunk::response("x")]);
    }
}
