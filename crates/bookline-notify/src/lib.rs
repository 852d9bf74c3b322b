//! Real-time event fan-out for Bookline.
//!
//! Domain mutations hand committed [`bookline_core::DomainEvent`]s to an
//! [`EventSink`]; the [`FanOutDispatcher`] resolves each event to its
//! channel set and publishes through a [`ChannelPublisher`] transport.
//! Subscription authorization lives in [`access`].

pub mod access;
pub mod dispatcher;
pub mod error;
pub mod publisher;

pub use access::{can_subscribe, ChannelAccessQuery};
pub use dispatcher::{EventSink, FanOutDispatcher, RetryPolicy};
pub use error::{NotifyError, Result};
pub use publisher::{BroadcastPublisher, ChannelMessage, ChannelPublisher, DynChannelPublisher};
