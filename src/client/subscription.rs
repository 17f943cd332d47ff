//! Consumer side of the output channel.
//!
//! The session owns one bounded channel for its whole lifetime. Every reader
//! it ever spawns writes into the same sender, so reconnects and restarts are
//! invisible here: a consumer sees, at most, a pause between two records.
//!
//! # Types
//!
//! - **Records**: cloneable handle with async `recv()`
//! - **RecordStream**: implements `Stream` for use with `StreamExt`
//!
//! # Examples
//!
//! ```ignore
//! use futures::StreamExt;
//!
//! let mut stream = client.records().into_stream();
//! while let Some(envelope) = stream.next().await {
//!     println!("{}", envelope.record().id());
//! }
//! ```

use crate::types::Envelope;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, watch, Mutex};

/// Handle to the session's output channel.
///
/// Clones share the same receiver; concurrent consumers take turns and each
/// envelope is delivered to exactly one of them.
#[derive(Debug, Clone)]
pub struct Records {
    receiver: Arc<Mutex<mpsc::Receiver<Envelope>>>,
    closing: Arc<watch::Sender<bool>>,
}

impl Records {
    pub(crate) fn new(receiver: mpsc::Receiver<Envelope>) -> Self {
        let (closing, _rx) = watch::channel(false);
        Records {
            receiver: Arc::new(Mutex::new(receiver)),
            closing: Arc::new(closing),
        }
    }

    /// Receive the next envelope.
    ///
    /// Returns `None` only after the channel has been closed and drained.
    pub async fn recv(&self) -> Option<Envelope> {
        let mut closing = self.closing.subscribe();
        let mut receiver = self.receiver.lock().await;
        tokio::select! {
            biased;
            envelope = receiver.recv() => return envelope,
            // the sender lives in `self`, so this only returns once closing
            _ = closing.wait_for(|closing| *closing) => {}
        }
        receiver.close();
        receiver.recv().await
    }

    /// Take an envelope if one is buffered and no other consumer holds the
    /// receiver.
    pub fn try_recv(&self) -> Option<Envelope> {
        self.receiver.try_lock().ok()?.try_recv().ok()
    }

    /// Whether both handles refer to the same channel.
    pub fn same_channel(&self, other: &Records) -> bool {
        Arc::ptr_eq(&self.receiver, &other.receiver)
    }

    /// Stop accepting new envelopes; buffered ones stay readable.
    ///
    /// A consumer parked in `recv()` closes the receiver itself and hands
    /// the lock back, so this never waits on an empty channel.
    pub(crate) async fn close(&self) {
        self.closing.send_replace(true);
        self.receiver.lock().await.close();
    }

    /// Adapt into a `Stream`.
    pub fn into_stream(self) -> RecordStream {
        RecordStream {
            inner: stream::unfold(self, |records| async move {
                let envelope = records.recv().await?;
                Some((envelope, records))
            })
            .boxed(),
        }
    }
}

/// `Stream` of envelopes from the output channel.
pub struct RecordStream {
    inner: BoxStream<'static, Envelope>,
}

impl Stream for RecordStream {
    type Item = Envelope;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Record;

    fn envelope(id: &str) -> Envelope {
        Envelope::new(format!(r#"{{"id":"{}"}}"#, id), Record::new(id))
    }

    #[tokio::test]
    async fn test_records_receive_in_order() {
        let (tx, rx) = mpsc::channel(10);
        let records = Records::new(rx);

        tx.send(envelope("1")).await.unwrap();
        tx.send(envelope("2")).await.unwrap();

        assert_eq!(records.recv().await.unwrap().record().id(), "1");
        assert_eq!(records.clone().recv().await.unwrap().record().id(), "2");
        assert!(records.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_close_keeps_buffered_envelopes() {
        let (tx, rx) = mpsc::channel(10);
        let records = Records::new(rx);

        tx.send(envelope("1")).await.unwrap();
        records.close().await;

        assert!(tx.send(envelope("2")).await.is_err());
        assert_eq!(records.recv().await.unwrap().record().id(), "1");
        assert!(records.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_close_wakes_waiting_consumer() {
        let (tx, rx) = mpsc::channel(10);
        let records = Records::new(rx);

        let consumer = tokio::spawn({
            let records = records.clone();
            async move { records.recv().await }
        });
        tokio::task::yield_now().await;

        tokio::time::timeout(std::time::Duration::from_secs(2), records.close())
            .await
            .expect("close waited on a parked consumer");
        let received = tokio::time::timeout(std::time::Duration::from_secs(2), consumer)
            .await
            .unwrap()
            .unwrap();
        assert!(received.is_none());
        assert!(tx.send(envelope("late")).await.is_err());
    }

    #[tokio::test]
    async fn test_into_stream() {
        let (tx, rx) = mpsc::channel(10);
        let records = Records::new(rx);
        let other = records.clone();

        tx.send(envelope("a")).await.unwrap();
        tx.send(envelope("b")).await.unwrap();
        drop(tx);

        let ids: Vec<String> = records
            .into_stream()
            .map(|e| e.record().id().to_string())
            .collect()
            .await;
        assert_eq!(ids, vec!["a", "b"]);
        assert!(other.try_recv().is_none());
    }

    #[test]
    fn test_same_channel() {
        let (_tx1, rx1) = mpsc::channel(1);
        let (_tx2, rx2) = mpsc::channel(1);
        let a = Records::new(rx1);
        let b = Records::new(rx2);
        assert!(a.same_channel(&a.clone()));
        assert!(!a.same_channel(&b));
    }
}
