use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::watch;

/// Ticket identifying one in-flight request against a [`StateCell`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Seq(u64);

/// Wholesale-replace state container with stale-response protection.
///
/// Callers take a sequence ticket with [`begin`](StateCell::begin) before
/// issuing a request and commit the response with it. A commit whose ticket
/// is older than the last committed one is rejected, so a response that
/// lost the race to a newer snapshot can never roll the store back. There is
/// no partial update: the committed value is always replaced whole.
#[derive(Debug)]
pub struct StateCell<T> {
    next: AtomicU64,
    committed: Mutex<(u64, T)>,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        Self {
            next: AtomicU64::new(0),
            committed: Mutex::new((0, initial)),
        }
    }

    /// Takes the next sequence ticket. Call before issuing the request the
    /// response of which will be committed under this ticket.
    pub fn begin(&self) -> Seq {
        Seq(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Commits `value` if `seq` is newer than the last committed sequence.
    /// Returns false (and drops the value) otherwise.
    pub fn commit(&self, seq: Seq, value: T) -> bool {
        let mut guard = self.committed.lock().expect("state cell lock poisoned");
        if seq.0 <= guard.0 {
            return false;
        }
        *guard = (seq.0, value);
        true
    }

    /// Unconditional replacement for local-only transitions (leave group,
    /// clear cart). Internally takes a fresh ticket so it still moves the
    /// committed sequence forward.
    pub fn replace(&self, value: T) {
        let seq = self.begin();
        self.commit(seq, value);
    }

    pub fn get(&self) -> T {
        self.committed
            .lock()
            .expect("state cell lock poisoned")
            .1
            .clone()
    }
}

/// Handle owned by whatever drives a view's lifetime. Dropping or cancelling
/// it tells every async flow started for that view to stop committing.
#[derive(Debug)]
pub struct Liveness {
    tx: watch::Sender<bool>,
}

impl Liveness {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> LivenessToken {
        LivenessToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Liveness {
    fn drop(&mut self) {
        let _ = self.tx.send(true);
    }
}

/// Cloneable cancellation token carried by in-flight operations.
#[derive(Debug, Clone)]
pub struct LivenessToken {
    rx: watch::Receiver<bool>,
}

impl LivenessToken {
    pub fn is_live(&self) -> bool {
        !*self.rx.borrow()
    }

    /// Resolves once the owning [`Liveness`] is cancelled or dropped.
    pub async fn cancelled(&mut self) {
        // a closed channel means the owner is gone, same as cancelled
        let _ = self.rx.wait_for(|cancelled| *cancelled).await;
    }
}
