use applies_core::{CapturedExchange, PageEvent};
use tokio::sync::broadcast;

pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Fire-and-forget broadcast of captured exchanges across the page boundary.
///
/// Not addressed to anyone: whoever is subscribed at send time receives it,
/// and with no subscriber the exchange is dropped.
#[derive(Debug, Clone)]
pub struct ExchangeBus {
    tx: broadcast::Sender<CapturedExchange>,
}

impl ExchangeBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Returns the number of listeners reached.
    pub fn broadcast(&self, exchange: CapturedExchange) -> usize {
        self.tx.send(exchange).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CapturedExchange> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ExchangeBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

/// Event channel of the page window, shared by the relay and the page context.
#[derive(Debug, Clone)]
pub struct WindowEvents {
    tx: broadcast::Sender<PageEvent>,
}

impl WindowEvents {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn dispatch(&self, event: PageEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.tx.subscribe()
    }
}

impl Default for WindowEvents {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}
