//! Applies engine: network tap, transport and IO around the core logic.
mod bridge;
mod bus;
mod config;
mod dom;
mod engine;
mod page_fetch;
mod primitives;
mod relay;
mod store;
mod tap;
mod tracker;
mod types;

pub use bridge::{request_with_timeout, route_outcomes, OneShot, OutcomeRouter, DEFAULT_OUTCOME_TIMEOUT};
pub use bus::{ExchangeBus, WindowEvents, DEFAULT_BUS_CAPACITY};
pub use config::{EngineConfig, DEFAULT_PAGE_URL};
pub use dom::subject_from_dom;
pub use engine::{EngineError, EngineHandle};
pub use page_fetch::{
    csrf_token_from_cookie, JobPostingClient, PageFetchService, DEFAULT_LOCALE_HEADER,
    POSTING_ENDPOINT, SESSION_COOKIE,
};
pub use primitives::{
    CompletionCallback, EventRequestObject, FetchPrimitive, FetchSettings, RequestObject,
    ReqwestFetch,
};
pub use relay::{ContentRelay, PageSnapshot, RelayError, RelayHandle, NO_RESPONSE_ERROR};
pub use store::{ensure_cache_dir, CacheStore, MemoryStore, PersistError, RonFileStore, CACHE_FILENAME};
pub use tap::{PageContext, TapError, TapInstall};
pub use tracker::{system_clock, AppliesTracker, Clock};
pub use types::{FailureKind, FetchError, HttpRequest, HttpResponse};
