//! Request/response over the page window with a bounded wait.
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use applies_core::{FetchOutcome, FetchRequest, PageEvent};
use applies_logging::{applies_debug, applies_warn, ExecContext};
use tokio::sync::{broadcast, oneshot};
use tokio_util::sync::CancellationToken;

use crate::bus::WindowEvents;

pub const DEFAULT_OUTCOME_TIMEOUT: Duration = Duration::from_secs(12);

/// Completion guard: the first `complete` wins, later ones are no-ops.
pub struct OneShot<T> {
    slot: Mutex<Option<oneshot::Sender<T>>>,
}

impl<T> OneShot<T> {
    pub fn new() -> (Self, oneshot::Receiver<T>) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                slot: Mutex::new(Some(tx)),
            },
            rx,
        )
    }

    /// `true` only for the call that actually delivered.
    pub fn complete(&self, value: T) -> bool {
        let sender = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

/// One-shot listeners for outcomes, keyed by request id.
#[derive(Default)]
pub struct OutcomeRouter {
    listeners: Mutex<HashMap<u64, OneShot<FetchOutcome>>>,
    next_id: AtomicU64,
}

impl OutcomeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self) -> (u64, oneshot::Receiver<FetchOutcome>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (listener, rx) = OneShot::new();
        self.lock().insert(id, listener);
        (id, rx)
    }

    /// Hand `outcome` to the listener for `id` and remove it.
    /// Returns `false` when nobody is waiting (duplicate, late, or unknown).
    pub fn deliver(&self, id: u64, outcome: FetchOutcome) -> bool {
        let listener = self.lock().remove(&id);
        match listener {
            Some(listener) => listener.complete(outcome),
            None => {
                applies_debug!(ctx = ExecContext::Content; "dropping outcome for request {} with no listener", id);
                false
            }
        }
    }

    pub fn cancel(&self, id: u64) -> bool {
        self.lock().remove(&id).is_some()
    }

    pub fn pending(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, OneShot<FetchOutcome>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Dispatch `request` on the window and wait for its outcome.
///
/// The listener is registered before dispatch. Resolves exactly once: with
/// the delivered outcome, or with [`FetchOutcome::timeout`] after `timeout`,
/// in which case the listener is removed and a late outcome is ignored.
pub async fn request_with_timeout(
    router: &OutcomeRouter,
    window: &WindowEvents,
    request: FetchRequest,
    timeout: Duration,
) -> FetchOutcome {
    let (id, rx) = router.register();
    let reached = window.dispatch(PageEvent::DirectFetch { id, detail: request });
    if reached == 0 {
        applies_debug!(ctx = ExecContext::Content; "request {} dispatched with no page listener", id);
    }

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(_)) | Err(_) => {
            router.cancel(id);
            applies_warn!(ctx = ExecContext::Content; "timeout waiting for outcome of request {}", id);
            FetchOutcome::timeout()
        }
    }
}

/// Feed outcomes seen on the window into `router` until `shutdown` fires.
pub async fn route_outcomes(
    mut events: broadcast::Receiver<PageEvent>,
    router: std::sync::Arc<OutcomeRouter>,
    shutdown: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            _ = shutdown.cancelled() => break,
            event = events.recv() => event,
        };
        match event {
            Ok(PageEvent::DirectResult { id, detail }) => {
                router.deliver(id, detail);
            }
            Ok(PageEvent::DirectFetch { .. }) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                applies_warn!(ctx = ExecContext::Content; "outcome router lagged, {} event(s) skipped", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
