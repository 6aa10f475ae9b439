//! One-shot shutdown controller.
//!
//! Holds two cancellation tokens: `signal` stops the accept loop and every
//! connection task, `queue_closed` ends the consumer-facing queue. Both are
//! fired together, exactly once, by whichever caller wins [`Shutdown::trigger`].
//!
//! A third token, `listener_closed`, is fired by the accept task itself once
//! the listening socket has been dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    signal: CancellationToken,
    queue_closed: CancellationToken,
    listener_closed: CancellationToken,
    fired: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token observed by the accept loop and connection tasks.
    pub fn signal(&self) -> CancellationToken {
        self.signal.clone()
    }

    /// Token that marks the dispatch queue as closed.
    pub fn queue_closed(&self) -> CancellationToken {
        self.queue_closed.clone()
    }

    /// Token fired once the accept task has released the listening socket.
    pub fn listener_closed(&self) -> CancellationToken {
        self.listener_closed.clone()
    }

    /// Fires the shutdown sequence.
    ///
    /// Returns `true` only for the single call that actually performed it;
    /// every other call, concurrent or later, is a no-op returning `false`.
    pub fn trigger(&self) -> bool {
        if self.fired.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.signal.cancel();
        self.queue_closed.cancel();
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}
