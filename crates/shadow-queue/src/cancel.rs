use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use thiserror::Error;

/// Returned by blocking waits that were interrupted by cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

type Listener = Arc<dyn Fn() + Send + Sync>;

/// One-shot, process-wide stop signal.
///
/// Clones share the same state. Blocking primitives register a listener so that
/// `cancel` can wake them under their own lock.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    cvar: Condvar,
}

#[derive(Default)]
struct State {
    cancelled: bool,
    next_id: u64,
    listeners: HashMap<u64, Listener>,
}

/// Unregisters its listener when dropped.
pub struct ListenerGuard {
    inner: Arc<Inner>,
    id: u64,
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.inner.state.lock().listeners.remove(&self.id);
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal. Later calls are no-ops.
    pub fn cancel(&self) {
        let listeners: Vec<Listener> = {
            let mut state = self.inner.state.lock();
            if state.cancelled {
                return;
            }
            state.cancelled = true;
            self.inner.cvar.notify_all();
            state.listeners.values().cloned().collect()
        };
        // run outside our lock; listeners take their own
        for listener in listeners {
            listener();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.state.lock().cancelled
    }

    /// Block the calling thread until `cancel` has been called.
    pub fn wait(&self) {
        let mut state = self.inner.state.lock();
        while !state.cancelled {
            self.inner.cvar.wait(&mut state);
        }
    }

    /// Run `f` on cancellation for as long as the returned guard lives.
    /// If the token is already cancelled, `f` runs immediately.
    pub fn on_cancel<F>(&self, f: F) -> ListenerGuard
    where
        F: Fn() + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(f);
        let (id, already) = {
            let mut state = self.inner.state.lock();
            let id = state.next_id;
            state.next_id += 1;
            if !state.cancelled {
                state.listeners.insert(id, listener.clone());
            }
            (id, state.cancelled)
        };
        if already {
            listener();
        }
        ListenerGuard { inner: self.inner.clone(), id }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn wait_returns_after_cancel() {
        let token = CancellationToken::new();
        let t = token.clone();
        let h = thread::spawn(move || t.wait());
        thread::sleep(Duration::from_millis(20));
        assert!(!token.is_cancelled());
        token.cancel();
        h.join().unwrap();
        assert!(token.is_cancelled());
    }

    #[test]
    fn listeners_fire_once() {
        let token = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _guard = token.on_cancel(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        token.cancel();
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn dropped_guard_unregisters() {
        let token = CancellationToken::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        drop(token.on_cancel(move || {
            h.fetch_add(1, Ordering::SeqCst);
        }));
        token.cancel();
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn late_listener_runs_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let _guard = token.on_cancel(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
