//! Domain services binding storage and the event queue together.
//!
//! Each service takes an explicit [`bookline_core::CallerContext`]; no
//! operation relies on ambient current-identity state. Mutations write
//! through the stores first and enqueue their domain event only after
//! the write succeeds.

pub mod availability;
pub mod booking;
pub mod identity;
pub mod messaging;

pub use availability::{AvailabilityLedger, RuleDraft};
pub use booking::{BookingDraft, BookingService};
pub use identity::IdentityResolver;
pub use messaging::{MessagingEngine, ThreadSummary};
