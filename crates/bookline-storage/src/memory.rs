//! In-memory storage backend.
//!
//! All state sits behind a single `tokio::sync::RwLock`, so every
//! operation — including the multi-write ones — applies under one
//! write guard and is atomic with respect to other callers.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use bookline_core::{
    AvailabilityRule, BookingRequest, BookingStatus, Identity, IdentitySwitchRecord, Message,
    MessageThread,
};

use crate::error::{Result, StorageError};
use crate::traits::{AvailabilityStore, BookingStore, IdentityStore, MessageStore};

#[derive(Debug, Default)]
struct MemoryState {
    identities: HashMap<Uuid, Identity>,
    switches: Vec<IdentitySwitchRecord>,
    rules: HashMap<Uuid, AvailabilityRule>,
    bookings: HashMap<Uuid, BookingRequest>,
    threads: HashMap<Uuid, MessageThread>,
    messages: HashMap<Uuid, Message>,
}

/// In-memory backend implementing every store trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<Identity>> {
        Ok(self.state.read().await.identities.get(&id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Identity>> {
        let state = self.state.read().await;
        let mut identities: Vec<Identity> = state
            .identities
            .values()
            .filter(|i| i.owner_user_id == user_id)
            .cloned()
            .collect();
        identities.sort_by_key(|i| i.created_at);
        Ok(identities)
    }

    async fn insert(&self, identity: Identity) -> Result<()> {
        let mut state = self.state.write().await;
        let taken = state.identities.values().any(|i| {
            i.owner_user_id == identity.owner_user_id
                && i.alias == identity.alias
                && i.id != identity.id
        });
        if taken {
            return Err(StorageError::already_exists(
                "identity",
                format!("alias '{}'", identity.alias),
            ));
        }
        state.identities.insert(identity.id, identity);
        Ok(())
    }

    async fn update(&self, identity: Identity) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.identities.contains_key(&identity.id) {
            return Err(StorageError::not_found("identity", identity.id.to_string()));
        }
        state.identities.insert(identity.id, identity);
        Ok(())
    }

    async fn activate_exclusive(
        &self,
        user_id: Uuid,
        identity_id: Uuid,
        record: IdentitySwitchRecord,
    ) -> Result<Identity> {
        let mut state = self.state.write().await;
        let owned = state
            .identities
            .get(&identity_id)
            .is_some_and(|i| i.owner_user_id == user_id);
        if !owned {
            return Err(StorageError::not_found("identity", identity_id.to_string()));
        }
        // Single write guard: flag clears, flag set, and audit record
        // land together.
        for identity in state
            .identities
            .values_mut()
            .filter(|i| i.owner_user_id == user_id)
        {
            identity.is_active = identity.id == identity_id;
        }
        state.switches.push(record);
        debug!(%user_id, %identity_id, "activated identity");
        state
            .identities
            .get(&identity_id)
            .cloned()
            .ok_or_else(|| StorageError::not_found("identity", identity_id.to_string()))
    }

    async fn remove(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .identities
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found("identity", id.to_string()))
    }

    async fn switch_history(&self, user_id: Uuid) -> Result<Vec<IdentitySwitchRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<IdentitySwitchRecord> = state
            .switches
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| std::cmp::Reverse(r.switched_at));
        Ok(records)
    }
}

#[async_trait]
impl AvailabilityStore for MemoryStore {
    async fn get(&self, rule_id: Uuid) -> Result<Option<AvailabilityRule>> {
        Ok(self.state.read().await.rules.get(&rule_id).cloned())
    }

    async fn list_for_identity(&self, identity_id: Uuid) -> Result<Vec<AvailabilityRule>> {
        let state = self.state.read().await;
        let mut rules: Vec<AvailabilityRule> = state
            .rules
            .values()
            .filter(|r| r.identity_id == identity_id)
            .cloned()
            .collect();
        rules.sort_by_key(|r| (r.day_of_week, r.start_time));
        Ok(rules)
    }

    async fn insert(&self, rule: AvailabilityRule) -> Result<()> {
        let mut state = self.state.write().await;
        if let Some(colliding) = identical_window(state.rules.values(), &rule) {
            return Err(colliding);
        }
        state.rules.insert(rule.id, rule);
        Ok(())
    }

    async fn update(&self, rule: AvailabilityRule) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.rules.contains_key(&rule.id) {
            return Err(StorageError::not_found(
                "availability_rule",
                rule.id.to_string(),
            ));
        }
        // A patch must not collide the rule onto another identical window.
        if let Some(colliding) = identical_window(state.rules.values(), &rule) {
            return Err(colliding);
        }
        state.rules.insert(rule.id, rule);
        Ok(())
    }

    async fn remove(&self, rule_id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        state
            .rules
            .remove(&rule_id)
            .map(|_| ())
            .ok_or_else(|| StorageError::not_found("availability_rule", rule_id.to_string()))
    }

    async fn replace_all(&self, identity_id: Uuid, rules: Vec<AvailabilityRule>) -> Result<()> {
        // Validate the set before mutating so a rejection leaves the
        // stored rules untouched.
        for (i, rule) in rules.iter().enumerate() {
            if let Some(colliding) = identical_window(rules[..i].iter(), rule) {
                return Err(colliding);
            }
        }
        let mut state = self.state.write().await;
        // Delete-then-recreate under one guard.
        state.rules.retain(|_, r| r.identity_id != identity_id);
        for rule in rules {
            state.rules.insert(rule.id, rule);
        }
        Ok(())
    }
}

/// Uniqueness check shared by every availability write path: no two
/// rules of one identity may carry the same `(day, start, end)` tuple.
fn identical_window<'a>(
    existing: impl Iterator<Item = &'a AvailabilityRule>,
    rule: &AvailabilityRule,
) -> Option<StorageError> {
    let collides = existing.into_iter().any(|r| {
        r.identity_id == rule.identity_id
            && r.day_of_week == rule.day_of_week
            && r.start_time == rule.start_time
            && r.end_time == rule.end_time
            && r.id != rule.id
    });
    collides.then(|| {
        StorageError::already_exists(
            "availability_rule",
            format!(
                "day {} window {}-{}",
                rule.day_of_week, rule.start_time, rule.end_time
            ),
        )
    })
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<BookingRequest>> {
        Ok(self.state.read().await.bookings.get(&id).cloned())
    }

    async fn insert(&self, booking: BookingRequest) -> Result<()> {
        let mut state = self.state.write().await;
        state.bookings.insert(booking.id, booking);
        Ok(())
    }

    async fn update_status(
        &self,
        booking_id: Uuid,
        requested: BookingStatus,
    ) -> Result<(BookingStatus, BookingRequest)> {
        let mut state = self.state.write().await;
        let booking = state
            .bookings
            .get_mut(&booking_id)
            .ok_or_else(|| StorageError::not_found("booking", booking_id.to_string()))?;
        // Guard and write under the same lock: the transition is
        // checked against the stored status, never a stale read.
        let previous = booking.transition_to(requested)?;
        Ok((previous, booking.clone()))
    }

    async fn list_for_identity(&self, identity_id: Uuid) -> Result<Vec<BookingRequest>> {
        let state = self.state.read().await;
        let mut bookings: Vec<BookingRequest> = state
            .bookings
            .values()
            .filter(|b| b.is_party(identity_id))
            .cloned()
            .collect();
        bookings.sort_by_key(|b| std::cmp::Reverse(b.requested_at));
        Ok(bookings)
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn get_thread(&self, thread_id: Uuid) -> Result<Option<MessageThread>> {
        Ok(self.state.read().await.threads.get(&thread_id).cloned())
    }

    async fn find_or_create_thread(&self, a: Uuid, b: Uuid) -> Result<MessageThread> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.threads.values().find(|t| t.matches_pair(a, b)) {
            return Ok(existing.clone());
        }
        let thread = MessageThread::new(a, b);
        state.threads.insert(thread.id, thread.clone());
        debug!(thread_id = %thread.id, "created message thread");
        Ok(thread)
    }

    async fn update_thread(&self, thread: MessageThread) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.threads.contains_key(&thread.id) {
            return Err(StorageError::not_found("thread", thread.id.to_string()));
        }
        state.threads.insert(thread.id, thread);
        Ok(())
    }

    async fn list_threads_for_identity(&self, identity_id: Uuid) -> Result<Vec<MessageThread>> {
        let state = self.state.read().await;
        let mut threads: Vec<MessageThread> = state
            .threads
            .values()
            .filter(|t| t.has_participant(identity_id))
            .cloned()
            .collect();
        threads.sort_by_key(|t| std::cmp::Reverse(t.last_message_at));
        Ok(threads)
    }

    async fn insert_message(&self, message: Message) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.threads.contains_key(&message.thread_id) {
            return Err(StorageError::not_found(
                "thread",
                message.thread_id.to_string(),
            ));
        }
        state.messages.insert(message.id, message);
        Ok(())
    }

    async fn get_message(&self, message_id: Uuid) -> Result<Option<Message>> {
        Ok(self.state.read().await.messages.get(&message_id).cloned())
    }

    async fn update_message(&self, message: Message) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.messages.contains_key(&message.id) {
            return Err(StorageError::not_found("message", message.id.to_string()));
        }
        state.messages.insert(message.id, message);
        Ok(())
    }

    async fn list_messages(&self, thread_id: Uuid) -> Result<Vec<Message>> {
        let state = self.state.read().await;
        let mut messages: Vec<Message> = state
            .messages
            .values()
            .filter(|m| m.thread_id == thread_id && m.lifecycle.is_active())
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.sent_at);
        Ok(messages)
    }
}
