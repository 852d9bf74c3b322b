//! Domain event types and channel resolution for real-time fan-out.
//!
//! Components construct a typed [`DomainEvent`] after every committed
//! mutation; the dispatcher in `bookline-notify` consumes them, resolves
//! the channel set with [`resolve_channels`], and hands the payload to
//! the transport. Events are ephemeral and never persisted.

pub mod channels;
pub mod types;

pub use channels::{resolve_channels, Channel};
pub use types::{
    AvailabilityChangedEvent, BookingCreatedEvent, BookingStatusChangedEvent, DomainEvent,
    MessageSentEvent,
};
