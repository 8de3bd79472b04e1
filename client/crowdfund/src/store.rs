//! Observable state slice shared by every resource store.
//!
//! A [`Store`] owns one `Snapshot { data, loading, error }` behind a
//! [`tokio::sync::watch`] channel. Requests run through [`Store::run`], which
//! flips `loading` on dispatch and applies the outcome in a single atomic
//! swap once the request settles. Observers either poll [`Store::snapshot`]
//! or hold a [`Subscription`].
//!
//! ## Cancellation
//!
//! Every in-flight request is bound to the store's current cancellation
//! scope. Dropping the last [`Subscription`] (or calling
//! [`Store::cancel_in_flight`]) cancels that scope: pending requests are
//! abandoned with [`ClientError::Cancelled`] and never touch the slice.

use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{ClientError, Result};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot<S> {
    pub data: S,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct Store<S> {
    inner: Arc<Inner<S>>,
}

struct Inner<S> {
    name: &'static str,
    tx: watch::Sender<Snapshot<S>>,
    flight: Mutex<Flight>,
}

struct Flight {
    scope: CancellationToken,
    pending: usize,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> Store<S> {
    /// Abandon every request currently in flight and clear `loading`.
    pub fn cancel_in_flight(&self) {
        let mut flight = self.inner.flight.lock();
        if flight.pending == 0 {
            return;
        }
        debug!(store = self.inner.name, pending = flight.pending, "cancelling in-flight requests");
        flight.scope.cancel();
        flight.scope = CancellationToken::new();
        flight.pending = 0;
        self.inner.tx.send_modify(|snap| snap.loading = false);
    }

    /// Number of requests dispatched and not yet settled.
    pub fn pending(&self) -> usize {
        self.inner.flight.lock().pending
    }
}

impl<S: Clone + Default> Store<S> {
    pub fn new(name: &'static str) -> Self {
        let (tx, _) = watch::channel(Snapshot::default());
        Self {
            inner: Arc::new(Inner {
                name,
                tx,
                flight: Mutex::new(Flight {
                    scope: CancellationToken::new(),
                    pending: 0,
                }),
            }),
        }
    }

    pub fn snapshot(&self) -> Snapshot<S> {
        self.inner.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> Subscription<S> {
        Subscription {
            rx: self.inner.tx.subscribe(),
            store: self.clone(),
        }
    }

    /// Run `request` against this slice.
    ///
    /// `loading` is set and `error` cleared before the request is polled.
    /// When it settles, success is handed to `apply` and failure is written
    /// to `error`; data is left untouched on failure. The request's own
    /// result is returned either way.
    pub async fn run<T, Fut, A>(&self, op: &'static str, request: Fut, apply: A) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
        A: FnOnce(&mut S, &T),
    {
        let scope = self.begin(op);

        let outcome = tokio::select! {
            _ = scope.cancelled() => return Err(ClientError::Cancelled),
            outcome = request => outcome,
        };

        let mut flight = self.inner.flight.lock();
        if scope.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        flight.pending = flight.pending.saturating_sub(1);
        let still_loading = flight.pending > 0;

        self.inner.tx.send_modify(|snap| {
            snap.loading = still_loading;
            match &outcome {
                Ok(value) => apply(&mut snap.data, value),
                Err(e) => snap.error = Some(e.to_string()),
            }
        });
        drop(flight);

        if let Err(e) = &outcome {
            warn!(store = self.inner.name, op, "request failed: {e}");
        }
        outcome
    }

    /// Record a failure raised before any request was sent.
    pub fn reject<T>(&self, op: &'static str, err: ClientError) -> Result<T> {
        debug!(store = self.inner.name, op, "rejected: {err}");
        let message = err.to_string();
        self.inner.tx.send_modify(|snap| snap.error = Some(message));
        Err(err)
    }

    /// Pass `result` through, recording an error first if it is one.
    pub fn check<T>(&self, op: &'static str, result: Result<T>) -> Result<T> {
        result.or_else(|e| self.reject(op, e))
    }

    /// Replace the data slice outside of any request (e.g. on logout).
    pub fn reset(&self) {
        self.cancel_in_flight();
        self.inner.tx.send_replace(Snapshot::default());
    }

    fn begin(&self, op: &'static str) -> CancellationToken {
        let mut flight = self.inner.flight.lock();
        flight.pending += 1;
        debug!(store = self.inner.name, op, "request started");
        self.inner.tx.send_modify(|snap| {
            snap.loading = true;
            snap.error = None;
        });
        flight.scope.clone()
    }
}

/// A live view of a store. The last subscription to go away takes the
/// store's in-flight requests with it.
pub struct Subscription<S> {
    rx: watch::Receiver<Snapshot<S>>,
    store: Store<S>,
}

impl<S: Clone> Subscription<S> {
    pub fn current(&self) -> Snapshot<S> {
        self.rx.borrow().clone()
    }

    /// Wait for the next state change. `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<Snapshot<S>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

impl<S> Drop for Subscription<S> {
    fn drop(&mut self) {
        // Our own receiver is still counted here.
        if self.store.inner.tx.receiver_count() <= 1 {
            self.store.cancel_in_flight();
        }
    }
}
