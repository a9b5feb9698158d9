//! Consumer of captured exchanges: extract, key by subject, remember.
use std::sync::{Arc, Mutex, PoisonError};

use applies_core::{
    cache_key, extract_count, subject_from_api_url, subject_from_cache_key, AppliesBoard,
    CacheEntry, CapturedExchange, MatchSource, SubjectId,
};
use applies_logging::{applies_debug, applies_error, applies_info, applies_warn, ExecContext};
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;

use crate::relay::PageSnapshot;
use crate::store::CacheStore;

/// Epoch milliseconds.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp_millis())
}

/// Holds the only mutable shared state: subject id to last seen value.
#[derive(Clone)]
pub struct AppliesTracker {
    board: Arc<Mutex<AppliesBoard>>,
    store: Arc<dyn CacheStore>,
    page: watch::Receiver<PageSnapshot>,
    clock: Clock,
}

impl AppliesTracker {
    pub fn new(store: Arc<dyn CacheStore>, page: watch::Receiver<PageSnapshot>, clock: Clock) -> Self {
        Self {
            board: Arc::new(Mutex::new(AppliesBoard::new())),
            store,
            page,
            clock,
        }
    }

    /// Seeds the board from the store. Keys that do not name a posting are
    /// skipped. Returns how many subjects were restored.
    pub fn restore(&self) -> usize {
        let mut board = self.board.lock().unwrap_or_else(PoisonError::into_inner);
        let mut restored = 0;
        for (key, entry) in self.store.entries() {
            match subject_from_cache_key(&key) {
                Some(subject) => {
                    board.record(subject, entry);
                    restored += 1;
                }
                None => applies_debug!(ctx = ExecContext::Content; "skipping cache key {}", key),
            }
        }
        restored
    }

    /// Records the extracted count, if any. A miss leaves every previously
    /// recorded value untouched.
    ///
    /// Without a posting id in the URL the value is attributed to the page's
    /// subject, but only when a count key matched; an unkeyed number from an
    /// arbitrary endpoint is not evidence about the posting on screen.
    pub fn observe(&self, exchange: &CapturedExchange) -> Option<(SubjectId, CacheEntry)> {
        let result = extract_count(&exchange.body);
        let applies = result.value?;

        let subject = match subject_from_api_url(&exchange.url) {
            Some(subject) => Some(subject),
            None if result.source == Some(MatchSource::Fallback) => {
                applies_debug!(
                    ctx = ExecContext::Content;
                    "unkeyed {} at {:?} from {} ignored",
                    applies,
                    result.source_key_hint,
                    exchange.url
                );
                return None;
            }
            None => self.page.borrow().subject(),
        };
        let Some(subject) = subject else {
            applies_warn!(ctx = ExecContext::Content; "count {} from {} has no subject, dropped", applies, exchange.url);
            return None;
        };

        let entry = CacheEntry {
            applies,
            at: (self.clock)(),
            url: exchange.url.clone(),
        };
        applies_debug!(
            ctx = ExecContext::Content;
            "posting {}: {} applies via {:?}",
            subject,
            applies,
            result.source_key_hint
        );
        self.board
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record(subject.clone(), entry.clone());
        self.store.put(&cache_key(&subject), &entry);
        Some((subject, entry))
    }

    pub fn latest(&self, subject: &SubjectId) -> Option<CacheEntry> {
        self.board
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(subject)
            .cloned()
    }

    pub fn tracked(&self) -> usize {
        self.board.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Consume the bus until `shutdown` fires or the bus closes.
    pub async fn run(self, mut exchanges: broadcast::Receiver<CapturedExchange>, shutdown: CancellationToken) {
        applies_info!(ctx = ExecContext::Content; "applies tracker listening");
        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = exchanges.recv() => next,
            };
            match next {
                Ok(exchange) => {
                    // The store may touch the disk. One exchange at a time keeps
                    // last-write-wins ordering.
                    let tracker = self.clone();
                    let observed = tokio::task::spawn_blocking(move || {
                        tracker.observe(&exchange);
                    });
                    if let Err(err) = observed.await {
                        applies_error!(ctx = ExecContext::Content; "observing exchange failed: {}", err);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    applies_warn!(ctx = ExecContext::Content; "tracker lagged, {} exchange(s) skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}
