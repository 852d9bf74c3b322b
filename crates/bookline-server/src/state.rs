//! Shared application state handed to every handler.

use std::sync::Arc;

use bookline_config::AppConfig;
use bookline_notify::{BroadcastPublisher, EventSink, FanOutDispatcher, RetryPolicy};
use bookline_storage::memory::MemoryStore;

use crate::access::StoreAccessQuery;
use crate::services::{AvailabilityLedger, BookingService, IdentityResolver, MessagingEngine};

/// Everything the HTTP layer needs: the domain services plus the
/// broadcast transport for subscription endpoints.
#[derive(Clone)]
pub struct AppState {
    pub identities: IdentityResolver,
    pub availability: AvailabilityLedger,
    pub bookings: BookingService,
    pub messaging: MessagingEngine,
    pub publisher: Arc<BroadcastPublisher>,
    pub access: Arc<StoreAccessQuery>,
}

impl AppState {
    /// Wire the in-memory stores, the event queue, and the dispatcher
    /// worker. The worker task is returned so the caller decides where
    /// it runs.
    pub fn new(config: &AppConfig) -> (Self, FanOutDispatcher) {
        let store = Arc::new(MemoryStore::new());
        let publisher = BroadcastPublisher::new_shared();
        let retry = RetryPolicy {
            max_attempts: config.notify.max_attempts,
            base_delay: config.retry_base_delay(),
        };
        let (events, dispatcher) = FanOutDispatcher::new(publisher.clone(), retry);
        (
            Self::with_parts(store, publisher, events),
            dispatcher,
        )
    }

    fn with_parts(
        store: Arc<MemoryStore>,
        publisher: Arc<BroadcastPublisher>,
        events: EventSink,
    ) -> Self {
        let access = Arc::new(StoreAccessQuery::new(store.clone(), store.clone()));
        Self {
            identities: IdentityResolver::new(store.clone()),
            availability: AvailabilityLedger::new(store.clone(), events.clone()),
            bookings: BookingService::new(store.clone(), store.clone(), events.clone()),
            messaging: MessagingEngine::new(store.clone(), store, events),
            publisher,
            access,
        }
    }
}
