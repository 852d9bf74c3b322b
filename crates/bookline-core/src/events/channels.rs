//! Broadcast channel naming and the static per-kind resolution rules.
//!
//! Channel names are part of the external surface; subscribers address
//! them by string. The mapping from event kind to channel set is fixed
//! at compile time and not configurable at runtime.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::types::DomainEvent;

/// A named addressable stream subscribers listen on.
///
/// All channels are private except [`Channel::Discovery`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// `identity.{id}` — everything about one identity
    Identity(Uuid),
    /// `discovery` — public feed of availability changes
    Discovery,
    /// `availability.{id}` — one identity's schedule
    Availability(Uuid),
    /// `creator-bookings.{id}` — provider-side booking feed
    CreatorBookings(Uuid),
    /// `client-bookings.{id}` — requester-side booking feed
    ClientBookings(Uuid),
    /// `booking-request.{id}` — a single booking's lifecycle
    BookingRequest(Uuid),
    /// `message-thread.{id}` — a single conversation
    MessageThread(Uuid),
}

impl Channel {
    /// The wire name of this channel.
    pub fn name(&self) -> String {
        match self {
            Self::Identity(id) => format!("identity.{id}"),
            Self::Discovery => "discovery".to_string(),
            Self::Availability(id) => format!("availability.{id}"),
            Self::CreatorBookings(id) => format!("creator-bookings.{id}"),
            Self::ClientBookings(id) => format!("client-bookings.{id}"),
            Self::BookingRequest(id) => format!("booking-request.{id}"),
            Self::MessageThread(id) => format!("message-thread.{id}"),
        }
    }

    /// Parse a wire name back into a channel.
    pub fn parse(name: &str) -> Option<Self> {
        if name == "discovery" {
            return Some(Self::Discovery);
        }
        let (prefix, id) = name.split_once('.')?;
        let id = Uuid::parse_str(id).ok()?;
        match prefix {
            "identity" => Some(Self::Identity(id)),
            "availability" => Some(Self::Availability(id)),
            "creator-bookings" => Some(Self::CreatorBookings(id)),
            "client-bookings" => Some(Self::ClientBookings(id)),
            "booking-request" => Some(Self::BookingRequest(id)),
            "message-thread" => Some(Self::MessageThread(id)),
            _ => None,
        }
    }

    /// Whether anyone may subscribe without an access check.
    pub fn is_public(&self) -> bool {
        matches!(self, Self::Discovery)
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Resolve the channel set an event fans out to.
pub fn resolve_channels(event: &DomainEvent) -> Vec<Channel> {
    match event {
        DomainEvent::AvailabilityChanged(e) => vec![
            Channel::Identity(e.identity_id),
            Channel::Discovery,
            Channel::Availability(e.identity_id),
        ],
        DomainEvent::BookingCreated(e) => {
            vec![Channel::CreatorBookings(e.booking.creator_identity_id)]
        }
        DomainEvent::BookingStatusChanged(e) => vec![
            Channel::BookingRequest(e.booking.id),
            Channel::CreatorBookings(e.booking.creator_identity_id),
            Channel::ClientBookings(e.booking.client_identity_id),
        ],
        DomainEvent::MessageSent(e) => vec![Channel::MessageThread(e.thread_id)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::AvailabilityUpdateType;
    use crate::booking::{BookingRequest, BookingStatus, BookingType};
    use crate::messaging::Message;
    use time::{Duration, OffsetDateTime};

    fn booking() -> BookingRequest {
        BookingRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            OffsetDateTime::now_utc() + Duration::days(1),
            BookingType::InPerson,
            None,
            "UTC",
        )
        .unwrap()
    }

    #[test]
    fn test_channel_names() {
        let id = Uuid::new_v4();
        assert_eq!(Channel::Identity(id).name(), format!("identity.{id}"));
        assert_eq!(Channel::Discovery.name(), "discovery");
        assert_eq!(
            Channel::CreatorBookings(id).name(),
            format!("creator-bookings.{id}")
        );
        assert_eq!(
            Channel::MessageThread(id).name(),
            format!("message-thread.{id}")
        );
    }

    #[test]
    fn test_parse_round_trip() {
        let id = Uuid::new_v4();
        for channel in [
            Channel::Identity(id),
            Channel::Discovery,
            Channel::Availability(id),
            Channel::CreatorBookings(id),
            Channel::ClientBookings(id),
            Channel::BookingRequest(id),
            Channel::MessageThread(id),
        ] {
            assert_eq!(Channel::parse(&channel.name()), Some(channel));
        }
        assert_eq!(Channel::parse("unknown.feed"), None);
        assert_eq!(Channel::parse("identity.not-a-uuid"), None);
    }

    #[test]
    fn test_only_discovery_is_public() {
        let id = Uuid::new_v4();
        assert!(Channel::Discovery.is_public());
        assert!(!Channel::Identity(id).is_public());
        assert!(!Channel::BookingRequest(id).is_public());
    }

    #[test]
    fn test_availability_fans_out_to_three_channels() {
        let identity_id = Uuid::new_v4();
        let event = DomainEvent::availability_changed(
            identity_id,
            None,
            AvailabilityUpdateType::ScheduleChanged,
        );
        let channels = resolve_channels(&event);
        assert_eq!(
            channels,
            vec![
                Channel::Identity(identity_id),
                Channel::Discovery,
                Channel::Availability(identity_id),
            ]
        );
    }

    #[test]
    fn test_booking_created_targets_creator_feed() {
        let booking = booking();
        let creator = booking.creator_identity_id;
        let channels = resolve_channels(&DomainEvent::booking_created(booking));
        assert_eq!(channels, vec![Channel::CreatorBookings(creator)]);
    }

    #[test]
    fn test_status_change_hits_three_audiences() {
        let booking = booking();
        let (id, creator, client) = (
            booking.id,
            booking.creator_identity_id,
            booking.client_identity_id,
        );
        let channels =
            resolve_channels(&DomainEvent::booking_status_changed(booking, BookingStatus::Pending));
        assert_eq!(
            channels,
            vec![
                Channel::BookingRequest(id),
                Channel::CreatorBookings(creator),
                Channel::ClientBookings(client),
            ]
        );
    }

    #[test]
    fn test_message_sent_targets_thread() {
        let message = Message::new(Uuid::new_v4(), Uuid::new_v4(), "hey").unwrap();
        let thread_id = message.thread_id;
        let channels = resolve_channels(&DomainEvent::message_sent(message));
        assert_eq!(channels, vec![Channel::MessageThread(thread_id)]);
    }
}
