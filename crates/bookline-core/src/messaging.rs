//! Messaging threads between identity pairs with per-participant read
//! tracking and soft-deleted messages.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Lifecycle of a message. Deletion is an explicit state, not a
/// nullable timestamp, so reads filter with a pattern match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum MessageLifecycle {
    Active,
    Deleted {
        #[serde(with = "time::serde::rfc3339")]
        at: OffsetDateTime,
    },
}

impl MessageLifecycle {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A single message in a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub thread_id: Uuid,
    pub sender_identity_id: Uuid,
    pub body: String,
    pub lifecycle: MessageLifecycle,
    #[serde(with = "time::serde::rfc3339")]
    pub sent_at: OffsetDateTime,
}

impl Message {
    pub fn new(thread_id: Uuid, sender_identity_id: Uuid, body: impl Into<String>) -> Result<Self> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(CoreError::validation("body", "must not be empty"));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            thread_id,
            sender_identity_id,
            body,
            lifecycle: MessageLifecycle::Active,
            sent_at: OffsetDateTime::now_utc(),
        })
    }

    /// Soft-delete the message; recoverable, excluded from future reads.
    pub fn mark_deleted(&mut self) {
        self.lifecycle = MessageLifecycle::Deleted {
            at: OffsetDateTime::now_utc(),
        };
    }
}

/// One side of a thread, with its read marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreadParticipant {
    pub identity_id: Uuid,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_read_at: Option<OffsetDateTime>,
}

/// A two-party conversation keyed by its identity pair.
///
/// Threads are created lazily on the first message between a pair and
/// never duplicated: the pair is matched order-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageThread {
    pub id: Uuid,
    pub participants: Vec<ThreadParticipant>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_message_at: OffsetDateTime,
}

impl MessageThread {
    pub fn new(a: Uuid, b: Uuid) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: Uuid::new_v4(),
            participants: vec![
                ThreadParticipant {
                    identity_id: a,
                    last_read_at: None,
                },
                ThreadParticipant {
                    identity_id: b,
                    last_read_at: None,
                },
            ],
            created_at: now,
            last_message_at: now,
        }
    }

    pub fn has_participant(&self, identity_id: Uuid) -> bool {
        self.participants
            .iter()
            .any(|p| p.identity_id == identity_id)
    }

    /// Whether this thread's participant set is exactly `{a, b}`.
    pub fn matches_pair(&self, a: Uuid, b: Uuid) -> bool {
        self.participants.len() == 2
            && self.has_participant(a)
            && self.has_participant(b)
            && (a != b || self.participants.iter().all(|p| p.identity_id == a))
    }

    /// Stamp the participant's read marker.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the identity is not a participant, so
    /// thread existence is not confirmed to outsiders.
    pub fn mark_read(&mut self, identity_id: Uuid) -> Result<()> {
        let participant = self
            .participants
            .iter_mut()
            .find(|p| p.identity_id == identity_id)
            .ok_or_else(|| CoreError::not_found("thread", identity_id.to_string()))?;
        participant.last_read_at = Some(OffsetDateTime::now_utc());
        Ok(())
    }

    /// Whether the participant has messages newer than their read marker.
    pub fn has_unread(&self, identity_id: Uuid) -> bool {
        self.participants
            .iter()
            .find(|p| p.identity_id == identity_id)
            .is_some_and(|p| match p.last_read_at {
                Some(read_at) => self.last_message_at > read_at,
                None => true,
            })
    }
}
