//! Output sinks for stream subscribers.
//!
//! A sink accepts framed events. Only sinks that also expose [`Flushable`]
//! can carry a live stream, and the registry rejects the others at
//! registration time.

use crate::error::{Result, SystemError};
use async_trait::async_trait;
use axum::body::Bytes;
use std::convert::Infallible;
use std::sync::Mutex;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// A write destination for one subscriber's transport.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Buffer one framed event.
    async fn write(&self, frame: &[u8]) -> Result<()>;

    /// Flush capability, if the transport supports incremental delivery.
    fn as_flushable(&self) -> Option<&dyn Flushable> {
        None
    }
}

/// Pushes buffered output to the transport immediately.
#[async_trait]
pub trait Flushable: Send + Sync {
    async fn flush(&self) -> Result<()>;
}

/// Body stream type fed by a [`ChannelSink`].
pub type SinkStream = ReceiverStream<std::result::Result<Bytes, Infallible>>;

/// Sink backed by a bounded channel whose receiver is an HTTP response body.
///
/// Writes accumulate in a pending buffer; a flush hands the buffer to the
/// body as one chunk. Once the body is dropped the sink reports closed.
pub struct ChannelSink {
    tx: mpsc::Sender<std::result::Result<Bytes, Infallible>>,
    pending: Mutex<Vec<u8>>,
}

impl ChannelSink {
    /// Create a sink and the body stream it feeds.
    pub fn channel(capacity: usize) -> (Self, SinkStream) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let sink = Self {
            tx,
            pending: Mutex::new(Vec::new()),
        };
        (sink, ReceiverStream::new(rx))
    }

    /// Whether the receiving side has gone away.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the receiving side has gone away.
    pub async fn closed(&self) {
        self.tx.closed().await
    }

    fn take_pending(&self) -> Vec<u8> {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        std::mem::take(&mut *pending)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn write(&self, frame: &[u8]) -> Result<()> {
        if self.is_closed() {
            return Err(SystemError::transport_error("connection closed"));
        }
        self.pending
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .extend_from_slice(frame);
        Ok(())
    }

    fn as_flushable(&self) -> Option<&dyn Flushable> {
        Some(self)
    }
}

#[async_trait]
impl Flushable for ChannelSink {
    async fn flush(&self) -> Result<()> {
        let chunk = self.take_pending();
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx
            .send(Ok(Bytes::from(chunk)))
            .await
            .map_err(|_| SystemError::transport_error("connection closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_write_is_held_until_flush() {
        let (sink, mut stream) = ChannelSink::channel(4);
        sink.write(b"data: 1\n\n").await.unwrap();
        sink.write(b"data: 2\n\n").await.unwrap();

        sink.as_flushable().unwrap().flush().await.unwrap();

        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(&chunk[..], b"data: 1\n\ndata: 2\n\n");
    }

    #[tokio::test]
    async fn test_dropped_receiver_fails_write() {
        let (sink, stream) = ChannelSink::channel(4);
        drop(stream);

        assert!(sink.is_closed());
        assert!(sink.write(b"data: x\n\n").await.is_err());
        sink.closed().await;
    }

    #[tokio::test]
    async fn test_empty_flush_sends_nothing() {
        let (sink, mut stream) = ChannelSink::channel(1);
        sink.flush().await.unwrap();
        drop(sink);
        assert!(stream.next().await.is_none());
    }
}
