//! Core domain types for the Bookline platform: identities, booking
//! lifecycle, availability scheduling, messaging, and the domain event
//! model consumed by the fan-out dispatcher.

pub mod availability;
pub mod booking;
pub mod context;
pub mod error;
pub mod events;
pub mod identity;
pub mod messaging;

pub use availability::{
    AvailabilityPatch, AvailabilityRule, AvailabilityUpdateType, PresenceStatus,
};
pub use booking::{is_transition_allowed, BookingRequest, BookingStatus, BookingType};
pub use context::CallerContext;
pub use error::{CoreError, ErrorCategory, Result};
pub use events::{Channel, DomainEvent};
pub use identity::{
    creation_cooldown_remaining, Identity, IdentityRole, IdentitySwitchRecord, IdentityVisibility,
    VerificationStatus, IDENTITY_CREATION_COOLDOWN,
};
pub use messaging::{Message, MessageLifecycle, MessageThread, ThreadParticipant};
