//! HTTP handlers, grouped per domain surface.

pub mod availability;
pub mod bookings;
pub mod channels;
pub mod health;
pub mod identities;
pub mod messages;
