//! The dispatch queue shared by every connection.
//!
//! Many connection tasks send into one bounded tokio channel; consumers read
//! through [`Reader`] handles that all share the same receiver. Closing the
//! queue is a cancellation token rather than dropping the receiver, so a
//! send never observes a torn-down channel:
//!
//! - a producer's send races the token and gives up once it fires;
//! - a reader checks the token before handing out anything, so nothing sent
//!   (or buffered) after the close is ever delivered.

use std::sync::Arc;

use futures_util::Stream;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Creates the queue. `closed` is the token that ends it.
pub(crate) fn channel<E>(capacity: usize, closed: CancellationToken) -> (Dispatcher<E>, Reader<E>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        Dispatcher {
            tx,
            closed: closed.clone(),
        },
        Reader {
            rx: Arc::new(Mutex::new(rx)),
            closed,
        },
    )
}

/// Producer side, one clone per connection task.
pub(crate) struct Dispatcher<E> {
    tx: mpsc::Sender<E>,
    closed: CancellationToken,
}

impl<E> Clone for Dispatcher<E> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl<E> Dispatcher<E> {
    /// Hands an event to the queue, waiting for room.
    ///
    /// Returns `false` if the queue was closed first (or every reader is
    /// gone); the event is dropped in that case.
    pub(crate) async fn send(&self, event: E) -> bool {
        tokio::select! {
            biased;
            _ = self.closed.cancelled() => false,
            result = self.tx.send(event) => result.is_ok(),
        }
    }
}

/// Consumer handle to the dispatch queue.
///
/// Cloning gives another handle to the same queue; each event is delivered
/// to exactly one handle. Once the endpoint stops, every handle reports
/// end-of-stream.
pub struct Reader<E> {
    rx: Arc<Mutex<mpsc::Receiver<E>>>,
    closed: CancellationToken,
}

impl<E> Clone for Reader<E> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
            closed: self.closed.clone(),
        }
    }
}

impl<E> std::fmt::Debug for Reader<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reader")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl<E> Reader<E> {
    /// Waits for the next event. `None` means the queue is closed.
    pub async fn recv(&self) -> Option<E> {
        if self.closed.is_cancelled() {
            return None;
        }

        let mut rx = tokio::select! {
            biased;
            _ = self.closed.cancelled() => return None,
            guard = self.rx.lock() => guard,
        };

        tokio::select! {
            biased;
            _ = self.closed.cancelled() => None,
            event = rx.recv() => event,
        }
    }

    /// Takes an event if one is ready without waiting.
    ///
    /// Also returns `None` while another handle is inside [`recv`](Self::recv).
    pub fn try_recv(&self) -> Option<E> {
        if self.closed.is_cancelled() {
            return None;
        }
        self.rx.try_lock().ok()?.try_recv().ok()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Returns `true` if both handles read from the same queue.
    pub fn same_queue(&self, other: &Reader<E>) -> bool {
        Arc::ptr_eq(&self.rx, &other.rx)
    }

    /// Adapts the handle into a [`Stream`] that ends when the queue closes.
    pub fn into_stream(self) -> impl Stream<Item = E> {
        futures_util::stream::unfold(self, |reader| async move {
            let event = reader.recv().await?;
            Some((event, reader))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;

    use super::*;

    #[tokio::test]
    async fn events_delivered_in_send_order() {
        let closed = CancellationToken::new();
        let (tx, rx) = channel(4, closed);

        for i in 0..4 {
            assert!(tx.send(i).await);
        }
        for i in 0..4 {
            assert_eq!(rx.recv().await, Some(i));
        }
    }

    #[tokio::test]
    async fn zero_capacity_is_clamped() {
        let (tx, rx) = channel(0, CancellationToken::new());
        assert!(tx.send("a").await);
        assert_eq!(rx.try_recv(), Some("a"));
    }

    #[tokio::test]
    async fn close_wakes_waiting_reader() {
        let closed = CancellationToken::new();
        let (_tx, rx) = channel::<u32>(1, closed.clone());

        let waiter = tokio::spawn(async move { rx.recv().await });
        tokio::task::yield_now().await;
        closed.cancel();

        let got = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("reader not woken")
            .unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn close_releases_blocked_sender() {
        let closed = CancellationToken::new();
        let (tx, _rx) = channel(1, closed.clone());
        assert!(tx.send(1).await);

        // Queue is full; this send blocks until the close.
        let sender = tokio::spawn(async move { tx.send(2).await });
        tokio::task::yield_now().await;
        closed.cancel();

        let sent = tokio::time::timeout(Duration::from_secs(1), sender)
            .await
            .expect("sender not released")
            .unwrap();
        assert!(!sent);
    }

    #[tokio::test]
    async fn buffered_events_not_delivered_after_close() {
        let closed = CancellationToken::new();
        let (tx, rx) = channel(4, closed.clone());
        assert!(tx.send(1).await);
        closed.cancel();

        assert_eq!(rx.recv().await, None);
        assert_eq!(rx.try_recv(), None);
        assert!(rx.is_closed());
    }

    #[tokio::test]
    async fn clones_share_one_queue() {
        let (tx, rx) = channel(4, CancellationToken::new());
        let other = rx.clone();
        assert!(rx.same_queue(&other));

        assert!(tx.send(7).await);
        assert_eq!(other.recv().await, Some(7));
        assert_eq!(rx.try_recv(), None);
    }

    #[tokio::test]
    async fn stream_ends_on_close() {
        let closed = CancellationToken::new();
        let (tx, rx) = channel(4, closed.clone());
        assert!(tx.send(1).await);
        assert!(tx.send(2).await);

        let mut stream = Box::pin(rx.into_stream());
        assert_eq!(stream.next().await, Some(1));
        assert_eq!(stream.next().await, Some(2));
        closed.cancel();
        assert_eq!(stream.next().await, None);
    }
}
