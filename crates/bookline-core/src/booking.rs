//! Booking request lifecycle: a finite state machine with guarded
//! transitions, owned jointly by a creator identity and a client
//! identity.
//!
//! The transition table is exposed as pure functions over the status
//! enum so the guard can be unit-tested without any storage behind it.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{CoreError, Result};

/// Kind of session being booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingType {
    Consultation,
    ContentCreation,
    VirtualSession,
    InPerson,
    Custom,
}

impl BookingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consultation => "consultation",
            Self::ContentCreation => "content_creation",
            Self::VirtualSession => "virtual_session",
            Self::InPerson => "in_person",
            Self::Custom => "custom",
        }
    }

    /// All booking types accepted by validation.
    pub const ALL: [BookingType; 5] = [
        Self::Consultation,
        Self::ContentCreation,
        Self::VirtualSession,
        Self::InPerson,
        Self::Custom,
    ];
}

impl std::fmt::Display for BookingType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle state of a booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    /// The states reachable from this one.
    pub fn allowed_transitions(&self) -> &'static [BookingStatus] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::InProgress, Self::Cancelled, Self::NoShow],
            Self::InProgress => &[Self::Completed, Self::Cancelled],
            Self::Completed | Self::Cancelled | Self::NoShow => &[],
        }
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    pub const ALL: [BookingStatus; 6] = [
        Self::Pending,
        Self::Confirmed,
        Self::InProgress,
        Self::Completed,
        Self::Cancelled,
        Self::NoShow,
    ];
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Whether `from -> to` appears in the transition table.
pub fn is_transition_allowed(from: BookingStatus, to: BookingStatus) -> bool {
    from.allowed_transitions().contains(&to)
}

/// A request for a session between two identities.
///
/// The creator identity is the service-provider side and the only party
/// allowed to drive status changes; the client identity is the
/// requester. Bookings are never hard-deleted: cancellation is a
/// status, not removal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: Uuid,
    pub creator_identity_id: Uuid,
    pub client_identity_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub requested_at: OffsetDateTime,
    pub booking_type: BookingType,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub timezone: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl BookingRequest {
    /// Create a new booking request in `Pending` status.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidSchedule` if `requested_at` is not
    /// strictly in the future.
    pub fn new(
        creator_identity_id: Uuid,
        client_identity_id: Uuid,
        requested_at: OffsetDateTime,
        booking_type: BookingType,
        notes: Option<String>,
        timezone: impl Into<String>,
    ) -> Result<Self> {
        let now = OffsetDateTime::now_utc();
        if requested_at <= now {
            return Err(CoreError::InvalidSchedule);
        }
        Ok(Self {
            id: Uuid::new_v4(),
            creator_identity_id,
            client_identity_id,
            requested_at,
            booking_type,
            status: BookingStatus::Pending,
            notes,
            timezone: timezone.into(),
            created_at: now,
        })
    }

    /// Whether the given identity is a party to this booking.
    pub fn is_party(&self, identity_id: Uuid) -> bool {
        self.creator_identity_id == identity_id || self.client_identity_id == identity_id
    }

    /// Apply a guarded status transition, returning the previous status.
    ///
    /// The stored status is only mutated after the guard passes; on an
    /// invalid transition the booking is left unchanged and the error
    /// carries both the current and the requested status.
    pub fn transition_to(&mut self, requested: BookingStatus) -> Result<BookingStatus> {
        if !is_transition_allowed(self.status, requested) {
            return Err(CoreError::InvalidTransition {
                current: self.status,
                requested,
            });
        }
        let previous = self.status;
        self.status = requested;
        Ok(previous)
    }
}
