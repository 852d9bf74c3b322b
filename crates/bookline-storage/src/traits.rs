//! Storage traits for the Bookline storage abstraction layer.
//!
//! Each domain component talks to its own store trait. Implementations
//! must be thread-safe (`Send + Sync`), and the multi-write operations
//! (`activate_exclusive`, `replace_all`, `find_or_create_thread`) must
//! apply atomically: partial application is never observable.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use bookline_core::{
    AvailabilityRule, BookingRequest, BookingStatus, Identity, IdentitySwitchRecord, Message,
    MessageThread,
};

use crate::error::Result;

/// Store for identities and the switch audit log.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Reads an identity by ID. Returns `None` if absent.
    async fn get(&self, id: Uuid) -> Result<Option<Identity>>;

    /// Lists a user's identities, oldest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Identity>>;

    /// Inserts a new identity.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` when the alias is already
    /// taken by another identity of the same owner.
    async fn insert(&self, identity: Identity) -> Result<()>;

    /// Persists updated identity fields.
    async fn update(&self, identity: Identity) -> Result<()>;

    /// Atomically makes `identity_id` the user's only active identity
    /// and appends the switch audit record. All writes land together
    /// or not at all.
    async fn activate_exclusive(
        &self,
        user_id: Uuid,
        identity_id: Uuid,
        record: IdentitySwitchRecord,
    ) -> Result<Identity>;

    /// Removes an identity. Callers enforce the sole-identity and
    /// currently-active guards before calling.
    async fn remove(&self, id: Uuid) -> Result<()>;

    /// Switch audit records for a user, newest first.
    async fn switch_history(&self, user_id: Uuid) -> Result<Vec<IdentitySwitchRecord>>;
}

/// Store for availability rules.
#[async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Reads a rule by ID.
    async fn get(&self, rule_id: Uuid) -> Result<Option<AvailabilityRule>>;

    /// Lists an identity's rules ordered by `(day_of_week, start_time)`.
    async fn list_for_identity(&self, identity_id: Uuid) -> Result<Vec<AvailabilityRule>>;

    /// Inserts a rule.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` when the identity already
    /// has a rule with the identical `(day_of_week, start, end)` tuple.
    /// Overlapping-but-distinct windows are accepted.
    async fn insert(&self, rule: AvailabilityRule) -> Result<()>;

    /// Persists updated rule fields.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` when the updated fields
    /// collide with another rule's `(day_of_week, start, end)` tuple.
    async fn update(&self, rule: AvailabilityRule) -> Result<()>;

    /// Removes a rule.
    async fn remove(&self, rule_id: Uuid) -> Result<()>;

    /// Atomically deletes all of the identity's rules and inserts the
    /// replacement set. Rejects a set containing identical
    /// `(day_of_week, start, end)` tuples without touching the stored
    /// rules.
    async fn replace_all(&self, identity_id: Uuid, rules: Vec<AvailabilityRule>) -> Result<()>;
}

/// Store for booking requests. Bookings are never removed; terminal
/// states stay queryable.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Reads a booking by ID.
    async fn get(&self, id: Uuid) -> Result<Option<BookingRequest>>;

    /// Inserts a new booking.
    async fn insert(&self, booking: BookingRequest) -> Result<()>;

    /// Applies a guarded status transition. The transition check and
    /// the status write happen under one write guard, so two callers
    /// racing from the same stale status can never both land. Returns
    /// the previous status and the updated booking.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Rejected` carrying the transition error
    /// when `requested` is not reachable from the stored status.
    async fn update_status(
        &self,
        booking_id: Uuid,
        requested: BookingStatus,
    ) -> Result<(BookingStatus, BookingRequest)>;

    /// All bookings where the identity is on either side, ordered by
    /// `requested_at` descending.
    async fn list_for_identity(&self, identity_id: Uuid) -> Result<Vec<BookingRequest>>;
}

/// Store for message threads and messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Reads a thread by ID.
    async fn get_thread(&self, thread_id: Uuid) -> Result<Option<MessageThread>>;

    /// Returns the thread whose participant set is exactly `{a, b}`,
    /// creating it if absent. Never creates a second thread for the
    /// same pair.
    async fn find_or_create_thread(&self, a: Uuid, b: Uuid) -> Result<MessageThread>;

    /// Persists updated thread fields (read markers, last activity).
    async fn update_thread(&self, thread: MessageThread) -> Result<()>;

    /// Threads the identity participates in, latest activity first.
    async fn list_threads_for_identity(&self, identity_id: Uuid) -> Result<Vec<MessageThread>>;

    /// Appends a message to its thread.
    async fn insert_message(&self, message: Message) -> Result<()>;

    /// Reads a message by ID, including soft-deleted ones.
    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>>;

    /// Persists updated message fields (soft deletion).
    async fn update_message(&self, message: Message) -> Result<()>;

    /// Active messages of a thread, oldest first. Soft-deleted
    /// messages are excluded.
    async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>>;
}

/// Type alias for a shareable identity store.
pub type DynIdentityStore = Arc<dyn IdentityStore>;
/// Type alias for a shareable availability store.
pub type DynAvailabilityStore = Arc<dyn AvailabilityStore>;
/// Type alias for a shareable booking store.
pub type DynBookingStore = Arc<dyn BookingStore>;
/// Type alias for a shareable message store.
pub type DynMessageStore = Arc<dyn MessageStore>;

// Ensure traits are object-safe by using them as trait objects
#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_identity_store_object_safe(_: &dyn IdentityStore) {}
    fn _assert_availability_store_object_safe(_: &dyn AvailabilityStore) {}
    fn _assert_booking_store_object_safe(_: &dyn BookingStore) {}
    fn _assert_message_store_object_safe(_: &dyn MessageStore) {}
}
