//! The page's network primitives: a promise-style fetch and an event-style
//! request object. Page code uses either; the tap wraps both.
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, COOKIE};
use tokio::runtime::Handle;
use url::Url;

use crate::{FailureKind, FetchError, HttpRequest, HttpResponse};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    /// Sent as the `cookie` header unless the request sets one.
    pub cookie: Option<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 5 * 1024 * 1024,
            cookie: None,
        }
    }
}

/// Promise-style primitive: the caller awaits the response.
#[async_trait::async_trait]
pub trait FetchPrimitive: Send + Sync {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

pub type CompletionCallback = Box<dyn FnOnce(Result<HttpResponse, FetchError>) + Send + 'static>;

/// Event-style primitive: completion is signalled through a callback.
pub trait RequestObject: Send + Sync {
    fn send(&self, request: HttpRequest, on_complete: CompletionCallback);
}

#[derive(Debug, Clone)]
pub struct ReqwestFetch {
    settings: FetchSettings,
    client: reqwest::Client,
    base: Option<Url>,
}

impl ReqwestFetch {
    /// `base` resolves relative request URLs, as the page origin would.
    pub fn new(settings: FetchSettings, base: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self {
            settings,
            client,
            base: Url::parse(base).ok(),
        })
    }

    fn resolve(&self, raw: &str) -> Result<Url, FetchError> {
        match Url::parse(raw) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base
                .as_ref()
                .ok_or_else(|| FetchError::new(FailureKind::InvalidUrl, "relative url without page origin"))?
                .join(raw)
                .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string())),
            Err(err) => Err(FetchError::new(FailureKind::InvalidUrl, err.to_string())),
        }
    }
}

#[async_trait::async_trait]
impl FetchPrimitive for ReqwestFetch {
    async fn fetch(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let url = self.resolve(&request.url)?;
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookie) = self.settings.cookie.as_deref() {
            if request.header_value(COOKIE.as_str()).is_none() {
                builder = builder.header(COOKIE, cookie);
            }
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = body.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(HttpResponse {
            url: final_url,
            status,
            content_type,
            body: body.into(),
        })
    }
}

/// Event-style request object driving any [`FetchPrimitive`] on a runtime.
pub struct EventRequestObject {
    inner: Arc<dyn FetchPrimitive>,
    runtime: Handle,
}

impl EventRequestObject {
    pub fn new(inner: Arc<dyn FetchPrimitive>, runtime: Handle) -> Self {
        Self { inner, runtime }
    }
}

impl RequestObject for EventRequestObject {
    fn send(&self, request: HttpRequest, on_complete: CompletionCallback) {
        let inner = self.inner.clone();
        self.runtime.spawn(async move {
            let result = inner.fetch(request).await;
            on_complete(result);
        });
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}
