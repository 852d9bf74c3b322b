//! Event type definitions for the fan-out system.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::availability::{AvailabilityRule, AvailabilityUpdateType};
use crate::booking::{BookingRequest, BookingStatus};
use crate::messaging::Message;

/// An identity's availability data or presence changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityChangedEvent {
    pub identity_id: Uuid,
    /// The affected rule. `None` signals "a slot was removed" or a pure
    /// presence change; consumers refetch rather than patch.
    pub rule: Option<AvailabilityRule>,
    pub update_type: AvailabilityUpdateType,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A booking request came into existence (always `Pending`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCreatedEvent {
    pub booking: BookingRequest,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A booking passed a guarded status transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingStatusChangedEvent {
    pub booking: BookingRequest,
    pub previous_status: BookingStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// A message was appended to a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSentEvent {
    pub thread_id: Uuid,
    pub message: Message,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Unified event enum flowing from mutations to the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    AvailabilityChanged(AvailabilityChangedEvent),
    BookingCreated(BookingCreatedEvent),
    BookingStatusChanged(BookingStatusChangedEvent),
    MessageSent(MessageSentEvent),
}

impl DomainEvent {
    /// Build an availability event.
    pub fn availability_changed(
        identity_id: Uuid,
        rule: Option<AvailabilityRule>,
        update_type: AvailabilityUpdateType,
    ) -> Self {
        Self::AvailabilityChanged(AvailabilityChangedEvent {
            identity_id,
            rule,
            update_type,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Build a booking-created event.
    pub fn booking_created(booking: BookingRequest) -> Self {
        Self::BookingCreated(BookingCreatedEvent {
            booking,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Build a booking-status-changed event carrying the prior status.
    pub fn booking_status_changed(booking: BookingRequest, previous_status: BookingStatus) -> Self {
        Self::BookingStatusChanged(BookingStatusChangedEvent {
            booking,
            previous_status,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Build a message-sent event.
    pub fn message_sent(message: Message) -> Self {
        Self::MessageSent(MessageSentEvent {
            thread_id: message.thread_id,
            message,
            timestamp: OffsetDateTime::now_utc(),
        })
    }

    /// Event kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AvailabilityChanged(_) => "availability_changed",
            Self::BookingCreated(_) => "booking_created",
            Self::BookingStatusChanged(_) => "booking_status_changed",
            Self::MessageSent(_) => "message_sent",
        }
    }

    /// Identities this event is about, for audit logging.
    pub fn subject_identity_ids(&self) -> Vec<Uuid> {
        match self {
            Self::AvailabilityChanged(e) => vec![e.identity_id],
            Self::BookingCreated(e) => {
                vec![e.booking.creator_identity_id, e.booking.client_identity_id]
            }
            Self::BookingStatusChanged(e) => {
                vec![e.booking.creator_identity_id, e.booking.client_identity_id]
            }
            Self::MessageSent(e) => vec![e.message.sender_identity_id],
        }
    }

    pub fn timestamp(&self) -> OffsetDateTime {
        match self {
            Self::AvailabilityChanged(e) => e.timestamp,
            Self::BookingCreated(e) => e.timestamp,
            Self::BookingStatusChanged(e) => e.timestamp,
            Self::MessageSent(e) => e.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::BookingType;
    use time::Duration;

    fn booking() -> BookingRequest {
        BookingRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            OffsetDateTime::now_utc() + Duration::days(1),
            BookingType::Consultation,
            None,
            "UTC",
        )
        .unwrap()
    }

    #[test]
    fn test_kind_names() {
        let event = DomainEvent::booking_created(booking());
        assert_eq!(event.kind(), "booking_created");
        let event = DomainEvent::availability_changed(
            Uuid::new_v4(),
            None,
            AvailabilityUpdateType::BulkUpdate,
        );
        assert_eq!(event.kind(), "availability_changed");
    }

    #[test]
    fn test_subjects_cover_both_booking_parties() {
        let booking = booking();
        let creator = booking.creator_identity_id;
        let client = booking.client_identity_id;
        let event = DomainEvent::booking_status_changed(booking, BookingStatus::Pending);
        let subjects = event.subject_identity_ids();
        assert!(subjects.contains(&creator));
        assert!(subjects.contains(&client));
    }

    #[test]
    fn test_event_serialization_round_trip() {
        let message = Message::new(Uuid::new_v4(), Uuid::new_v4(), "hi").unwrap();
        let event = DomainEvent::message_sent(message);
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"message_sent\""));
        let parsed: DomainEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.kind(), "message_sent");
    }

    #[test]
    fn test_status_changed_carries_previous() {
        let event = DomainEvent::booking_status_changed(booking(), BookingStatus::Pending);
        match event {
            DomainEvent::BookingStatusChanged(e) => {
                assert_eq!(e.previous_status, BookingStatus::Pending);
            }
            other => panic!("unexpected event: {}", other.kind()),
        }
    }
}
