use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use shadow_core::Snapshot;

use crate::{Cancelled, CancellationToken};

/// FIFO hand-off between capture contexts (many producers) and the persistence
/// worker (one consumer).
///
/// `ready` counts items whose enqueue is complete; the consumer only removes an
/// item after taking one unit of readiness.
#[derive(Clone, Default)]
pub struct SnapshotQueue {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    available: Condvar,
}

#[derive(Default)]
struct State {
    items: VecDeque<Snapshot>,
    ready: usize,
}

impl SnapshotQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `snapshot` and signal readiness once. Returns the pending count
    /// after the append.
    pub fn enqueue(&self, snapshot: Snapshot) -> usize {
        let pending = {
            let mut state = self.shared.state.lock();
            state.items.push_back(snapshot);
            state.ready += 1;
            state.ready
        };
        self.shared.available.notify_one();
        pending
    }

    /// Block until an item is ready or `token` is cancelled.
    ///
    /// Ready items win over cancellation, so a cancelled consumer still drains
    /// whatever was enqueued before it stopped.
    pub fn wait_and_dequeue(&self, token: &CancellationToken) -> Result<Snapshot, Cancelled> {
        let shared = self.shared.clone();
        let _guard = token.on_cancel(move || {
            // taking the lock orders this wake-up after the consumer's check
            let _state = shared.state.lock();
            shared.available.notify_all();
        });

        let mut state = self.shared.state.lock();
        loop {
            if state.ready > 0 {
                if let Some(snapshot) = state.items.pop_front() {
                    state.ready -= 1;
                    return Ok(snapshot);
                }
            }
            if token.is_cancelled() {
                return Err(Cancelled);
            }
            self.shared.available.wait(&mut state);
        }
    }

    /// Non-blocking variant of [`wait_and_dequeue`](Self::wait_and_dequeue).
    pub fn try_dequeue(&self) -> Option<Snapshot> {
        let mut state = self.shared.state.lock();
        if state.ready == 0 {
            return None;
        }
        let snapshot = state.items.pop_front()?;
        state.ready -= 1;
        Some(snapshot)
    }

    pub fn pending(&self) -> usize {
        self.shared.state.lock().ready
    }

    pub fn is_empty(&self) -> bool {
        self.pending() == 0
    }
}
