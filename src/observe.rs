//! Single-slot observable values.
//!
//! A `Source` holds the latest value; every `Live` handle sees the current
//! value and can await changes. Derived handles (`map`) run a forwarding
//! task that is aborted when the last handle is dropped, so emissions to a
//! torn-down observer are no-ops. This is the explicit
//! cancellation-on-teardown contract the screens rely on.

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Writer half of an observable value.
pub struct Source<T> {
    tx: watch::Sender<T>,
}

impl<T> Source<T> {
    pub fn new(initial: T) -> Self {
        Self {
            tx: watch::Sender::new(initial),
        }
    }

    /// New handle observing this source.
    pub fn live(&self) -> Live<T> {
        Live {
            rx: self.tx.subscribe(),
            guards: Vec::new(),
        }
    }

    /// Publish a value. Succeeds whether or not anyone is observing.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }
}

struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Reader half of an observable value.
pub struct Live<T> {
    rx: watch::Receiver<T>,
    guards: Vec<Arc<TaskGuard>>,
}

impl<T> Clone for Live<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
            guards: self.guards.clone(),
        }
    }
}

impl<T: Clone> Live<T> {
    /// Snapshot of the current value.
    pub fn current(&self) -> T {
        self.rx.borrow().clone()
    }

    /// Waits for the next emission. `None` once the source is gone.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Waits until the value satisfies `pred`, checking the current value
    /// first. `None` if the source is dropped before that happens.
    pub async fn wait_for(&mut self, pred: impl FnMut(&T) -> bool) -> Option<T> {
        self.rx.wait_for(pred).await.ok().map(|v| v.clone())
    }

    /// Whether an emission has occurred that `changed` has not yet seen.
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

impl<T: Clone + Send + Sync + 'static> Live<T> {
    /// Derived observable applying `f` to every emission. The forwarding
    /// task stops when either end goes away.
    pub fn map<U, F>(&self, f: F) -> Live<U>
    where
        U: Send + Sync + 'static,
        F: Fn(&T) -> U + Send + 'static,
    {
        let mut rx = self.rx.clone();
        let seed = f(&rx.borrow_and_update());
        let (tx, out) = watch::channel(seed);
        let handle = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let next = f(&rx.borrow_and_update());
                tx.send_replace(next);
            }
        });
        let mut guards = self.guards.clone();
        guards.push(Arc::new(TaskGuard(handle)));
        Live { rx: out, guards }
    }
}

impl<T: Clone> Live<Option<T>> {
    /// Resolves a single-request observable: the present value once one
    /// arrives, or `None` when the source finishes without one.
    pub async fn settled(&mut self) -> Option<T> {
        if let Ok(value) = self.rx.wait_for(|v| v.is_some()).await {
            return value.clone();
        }
        // Source gone; whatever was last published stands.
        self.rx.borrow().clone()
    }
}
