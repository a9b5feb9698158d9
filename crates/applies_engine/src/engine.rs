use std::sync::Arc;

use applies_core::{InterestFilter, UiQuery, UiResponse};
use applies_logging::{applies_info, ExecContext};
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::bridge::{route_outcomes, OutcomeRouter};
use crate::bus::{ExchangeBus, WindowEvents};
use crate::config::EngineConfig;
use crate::page_fetch::{JobPostingClient, PageFetchService};
use crate::primitives::{EventRequestObject, FetchPrimitive, ReqwestFetch};
use crate::relay::{ContentRelay, PageSnapshot, RelayHandle};
use crate::store::{CacheStore, MemoryStore, RonFileStore};
use crate::tap::{PageContext, TapError};
use crate::tracker::{system_clock, AppliesTracker, Clock};
use crate::FetchError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("fetch setup failed: {0}")]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Tap(#[from] TapError),
}

/// One attached page with all contexts wired up: tapped page context,
/// posting fetcher, relay and applies tracker.
///
/// Must be started from within a tokio runtime. Dropping the handle stops
/// the background tasks.
pub struct EngineHandle {
    page: Arc<PageContext>,
    relay: RelayHandle,
    tracker: AppliesTracker,
    bus: ExchangeBus,
    window: WindowEvents,
    navigator: watch::Sender<PageSnapshot>,
    store: Arc<dyn CacheStore>,
    shutdown: CancellationToken,
}

impl EngineHandle {
    pub fn start(config: EngineConfig) -> Result<Self, EngineError> {
        let fetch = Arc::new(ReqwestFetch::new(config.fetch_settings(), &config.origin())?);
        let store: Arc<dyn CacheStore> = match &config.cache_dir {
            Some(dir) => Arc::new(RonFileStore::new(dir.clone())),
            None => Arc::new(MemoryStore::new()),
        };
        Self::start_with(config, fetch, store, system_clock())
    }

    /// Like [`EngineHandle::start`] with the page primitive, store and clock injected.
    pub fn start_with(
        config: EngineConfig,
        fetch: Arc<dyn FetchPrimitive>,
        store: Arc<dyn CacheStore>,
        clock: Clock,
    ) -> Result<Self, EngineError> {
        let runtime = Handle::try_current().map_err(|_| TapError::NoRuntime)?;
        let origin = config.origin();
        let shutdown = CancellationToken::new();

        let request_object = Arc::new(EventRequestObject::new(fetch.clone(), runtime));
        let page = Arc::new(PageContext::new(origin.clone(), fetch, request_object));

        let bus = ExchangeBus::default();
        let window = WindowEvents::default();
        page.install_tap(InterestFilter::new(config.filter.clone(), &origin), bus.clone())?;

        let (navigator, snapshots) = watch::channel(PageSnapshot::new(config.page_url.clone()));

        let tracker = AppliesTracker::new(store.clone(), snapshots.clone(), clock);
        let restored = tracker.restore();
        if restored > 0 {
            applies_info!(ctx = ExecContext::Content; "restored {} cached count(s)", restored);
        }
        tokio::spawn(tracker.clone().run(bus.subscribe(), shutdown.child_token()));

        let client = JobPostingClient::new(config.cookie.clone(), config.locale.clone());
        let service = PageFetchService::new(page.clone(), client, window.clone());
        tokio::spawn(service.serve(shutdown.child_token()));

        let router = Arc::new(OutcomeRouter::new());
        tokio::spawn(route_outcomes(window.subscribe(), router.clone(), shutdown.child_token()));

        let relay = ContentRelay::new(
            snapshots,
            router,
            window.clone(),
            config.outcome_timeout(),
            config.top_param,
        )
        .spawn(shutdown.child_token());

        applies_info!(ctx = ExecContext::Ui; "engine attached to {}", config.page_url);
        Ok(Self {
            page,
            relay,
            tracker,
            bus,
            window,
            navigator,
            store,
            shutdown,
        })
    }

    /// The page context page-level code issues its requests through.
    pub fn page(&self) -> &Arc<PageContext> {
        &self.page
    }

    pub fn relay(&self) -> RelayHandle {
        self.relay.clone()
    }

    pub async fn query(&self, query: UiQuery) -> UiResponse {
        self.relay.query(query).await
    }

    /// In-page navigation: the URL (and markup) the relay resolves against.
    pub fn navigate(&self, snapshot: PageSnapshot) {
        self.navigator.send_replace(snapshot);
    }

    pub fn tracker(&self) -> &AppliesTracker {
        &self.tracker
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    pub fn exchanges(&self) -> &ExchangeBus {
        &self.bus
    }

    pub fn window(&self) -> &WindowEvents {
        &self.window
    }

    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
