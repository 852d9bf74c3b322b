//! Bridges the transport's subscribe-authorization questions to the
//! domain stores.

use async_trait::async_trait;
use uuid::Uuid;

use bookline_notify::ChannelAccessQuery;
use bookline_storage::{DynBookingStore, DynMessageStore};

/// Answers channel access questions from booking and message records.
pub struct StoreAccessQuery {
    bookings: DynBookingStore,
    messages: DynMessageStore,
}

impl StoreAccessQuery {
    pub fn new(bookings: DynBookingStore, messages: DynMessageStore) -> Self {
        Self { bookings, messages }
    }
}

#[async_trait]
impl ChannelAccessQuery for StoreAccessQuery {
    async fn is_thread_participant(&self, thread_id: Uuid, identity_id: Uuid) -> bool {
        match self.messages.get_thread(thread_id).await {
            Ok(Some(thread)) => thread.has_participant(identity_id),
            // Missing or unreadable record denies access
            _ => false,
        }
    }

    async fn is_booking_party(&self, booking_id: Uuid, identity_id: Uuid) -> bool {
        match self.bookings.get(booking_id).await {
            Ok(Some(booking)) => booking.is_party(identity_id),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookline_core::{BookingRequest, BookingType, CallerContext, Channel};
    use bookline_notify::can_subscribe;
    use bookline_storage::memory::MemoryStore;
    use bookline_storage::{BookingStore, MessageStore};
    use std::sync::Arc;
    use time::{Duration, OffsetDateTime};

    #[tokio::test]
    async fn test_booking_channel_access_follows_parties() {
        let store = Arc::new(MemoryStore::new());
        let query = StoreAccessQuery::new(store.clone(), store.clone());

        let booking = BookingRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            OffsetDateTime::now_utc() + Duration::days(1),
            BookingType::Consultation,
            None,
            "UTC",
        )
        .unwrap();
        store.insert(booking.clone()).await.unwrap();

        let channel = Channel::BookingRequest(booking.id);
        let creator = CallerContext::new(Uuid::new_v4(), booking.creator_identity_id);
        let client = CallerContext::new(Uuid::new_v4(), booking.client_identity_id);
        let outsider = CallerContext::new(Uuid::new_v4(), Uuid::new_v4());

        assert!(can_subscribe(&channel, &creator, &query).await);
        assert!(can_subscribe(&channel, &client, &query).await);
        assert!(!can_subscribe(&channel, &outsider, &query).await);
        // Unknown booking denies
        let unknown = Channel::BookingRequest(Uuid::new_v4());
        assert!(!can_subscribe(&unknown, &creator, &query).await);
    }

    #[tokio::test]
    async fn test_thread_channel_access_follows_participants() {
        let store = Arc::new(MemoryStore::new());
        let query = StoreAccessQuery::new(store.clone(), store.clone());

        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let thread = store.find_or_create_thread(a, b).await.unwrap();

        let channel = Channel::MessageThread(thread.id);
        let participant = CallerContext::new(Uuid::new_v4(), a);
        let outsider = CallerContext::new(Uuid::new_v4(), Uuid::new_v4());
        assert!(can_subscribe(&channel, &participant, &query).await);
        assert!(!can_subscribe(&channel, &outsider, &query).await);
    }
}
