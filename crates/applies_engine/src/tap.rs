//! Network tap: observation-only wrappers around the page's primitives.
//!
//! The caller always gets exactly what the underlying primitive produced.
//! Filtering, body parsing and the broadcast run in a spawned task, so a
//! failure there can neither delay nor break the page's own request.
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use applies_core::{CapturedExchange, InterestFilter};
use applies_logging::{applies_debug, applies_info, applies_trace, ExecContext};
use thiserror::Error;
use tokio::runtime::Handle;

use crate::bus::ExchangeBus;
use crate::primitives::{CompletionCallback, FetchPrimitive, RequestObject};
use crate::{FetchError, HttpRequest, HttpResponse};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TapError {
    #[error("no async runtime to run observations on")]
    NoRuntime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapInstall {
    Installed,
    AlreadyInstalled,
}

/// One page's execution context: its origin and its network primitives.
///
/// Page code reaches the network only through [`PageContext::fetch`] and
/// [`PageContext::send`], so whatever sits in the slots sees every call.
pub struct PageContext {
    origin: String,
    fetch: RwLock<Arc<dyn FetchPrimitive>>,
    request_object: RwLock<Arc<dyn RequestObject>>,
    tap_marker: OnceLock<()>,
}

impl PageContext {
    pub fn new(
        origin: impl Into<String>,
        fetch: Arc<dyn FetchPrimitive>,
        request_object: Arc<dyn RequestObject>,
    ) -> Self {
        Self {
            origin: origin.into(),
            fetch: RwLock::new(fetch),
            request_object: RwLock::new(request_object),
            tap_marker: OnceLock::new(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_tapped(&self) -> bool {
        self.tap_marker.get().is_some()
    }

    /// Promise-style call, as page code would issue it.
    pub async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let primitive = self.fetch.read().unwrap_or_else(PoisonError::into_inner).clone();
        primitive.fetch(request).await
    }

    /// Event-style call, as page code would issue it.
    pub fn send(&self, request: HttpRequest, on_complete: CompletionCallback) {
        let primitive = self
            .request_object
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        primitive.send(request, on_complete);
    }

    /// Wrap both primitives, once per page lifetime.
    ///
    /// Later calls are no-ops reporting [`TapInstall::AlreadyInstalled`].
    /// Observations run on the runtime current at install time.
    pub fn install_tap(&self, filter: InterestFilter, bus: ExchangeBus) -> Result<TapInstall, TapError> {
        let runtime = Handle::try_current().map_err(|_| TapError::NoRuntime)?;
        if self.tap_marker.set(()).is_err() {
            applies_debug!(ctx = ExecContext::Page; "tap already installed for {}", self.origin);
            return Ok(TapInstall::AlreadyInstalled);
        }

        let observer = Arc::new(Observer {
            filter,
            bus,
            runtime,
        });

        {
            let mut slot = self.fetch.write().unwrap_or_else(PoisonError::into_inner);
            let inner = slot.clone();
            *slot = Arc::new(TappedFetch {
                inner,
                observer: observer.clone(),
            });
        }
        {
            let mut slot = self
                .request_object
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let inner = slot.clone();
            *slot = Arc::new(TappedRequestObject { inner, observer });
        }

        applies_info!(ctx = ExecContext::Page; "network tap installed for {}", self.origin);
        Ok(TapInstall::Installed)
    }
}

struct Observer {
    filter: InterestFilter,
    bus: ExchangeBus,
    runtime: Handle,
}

impl Observer {
    fn observe(self: &Arc<Self>, request_url: &str, result: &Result<HttpResponse, FetchError>) {
        let response = match result {
            Ok(response) => response.clone(),
            Err(err) => {
                applies_trace!(ctx = ExecContext::Page; "transport failure for {}: {}", request_url, err);
                return;
            }
        };
        let url = if response.url.is_empty() {
            request_url.to_string()
        } else {
            response.url.clone()
        };
        let observer = self.clone();
        self.runtime.spawn(async move {
            if !observer
                .filter
                .accepts(&url, response.content_type.as_deref())
            {
                return;
            }
            if let Some(exchange) = capture(url, response) {
                let reached = observer.bus.broadcast(exchange);
                applies_trace!(ctx = ExecContext::Page; "captured exchange reached {} listener(s)", reached);
            }
        });
    }
}

/// `None` when the body is not valid JSON.
fn capture(url: String, response: HttpResponse) -> Option<CapturedExchange> {
    match serde_json::from_slice(&response.body) {
        Ok(body) => Some(CapturedExchange {
            ok: response.ok(),
            status: response.status,
            content_type: response.content_type.unwrap_or_default(),
            url,
            body,
        }),
        Err(err) => {
            applies_debug!(ctx = ExecContext::Page; "skipping unparseable body from {}: {}", url, err);
            None
        }
    }
}

struct TappedFetch {
    inner: Arc<dyn FetchPrimitive>,
    observer: Arc<Observer>,
}

#[async_trait::async_trait]
impl FetchPrimitive for TappedFetch {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = request.url.clone();
        let result = self.inner.fetch(request).await;
        self.observer.observe(&url, &result);
        result
    }
}

struct TappedRequestObject {
    inner: Arc<dyn RequestObject>,
    observer: Arc<Observer>,
}

impl RequestObject for TappedRequestObject {
    fn send(&self, request: HttpRequest, on_complete: CompletionCallback) {
        let url = request.url.clone();
        let observer = self.observer.clone();
        self.inner.send(
            request,
            Box::new(move |result| {
                observer.observe(&url, &result);
                on_complete(result);
            }),
        );
    }
}
