//! Subscribe-side authorization for broadcast channels.
//!
//! Every channel except the public `discovery` feed is private. For
//! identity-segmented channels the caller's current identity must match
//! the segment; for record-scoped channels the caller must be a party
//! to the record, which the transport asks the domain about through
//! [`ChannelAccessQuery`].

use async_trait::async_trait;
use uuid::Uuid;

use bookline_core::{CallerContext, Channel};

/// Domain questions the transport needs answered to authorize a
/// subscription.
#[async_trait]
pub trait ChannelAccessQuery: Send + Sync {
    /// Whether the identity participates in the thread.
    async fn is_thread_participant(&self, thread_id: Uuid, identity_id: Uuid) -> bool;

    /// Whether the identity is creator or client of the booking.
    async fn is_booking_party(&self, booking_id: Uuid, identity_id: Uuid) -> bool;
}

/// Decide whether the caller may subscribe to a channel.
pub async fn can_subscribe(
    channel: &Channel,
    ctx: &CallerContext,
    query: &dyn ChannelAccessQuery,
) -> bool {
    match channel {
        Channel::Discovery => true,
        Channel::Identity(id)
        | Channel::Availability(id)
        | Channel::CreatorBookings(id)
        | Channel::ClientBookings(id) => ctx.acts_as(*id),
        Channel::BookingRequest(booking_id) => {
            query.is_booking_party(*booking_id, ctx.identity_id).await
        }
        Channel::MessageThread(thread_id) => {
            query.is_thread_participant(*thread_id, ctx.identity_id).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticQuery {
        thread_ok: bool,
        booking_ok: bool,
    }

    #[async_trait]
    impl ChannelAccessQuery for StaticQuery {
        async fn is_thread_participant(&self, _thread_id: Uuid, _identity_id: Uuid) -> bool {
            self.thread_ok
        }

        async fn is_booking_party(&self, _booking_id: Uuid, _identity_id: Uuid) -> bool {
            self.booking_ok
        }
    }

    fn ctx(identity_id: Uuid) -> CallerContext {
        CallerContext::new(Uuid::new_v4(), identity_id)
    }

    #[tokio::test]
    async fn test_discovery_is_open() {
        let query = StaticQuery {
            thread_ok: false,
            booking_ok: false,
        };
        assert!(can_subscribe(&Channel::Discovery, &ctx(Uuid::new_v4()), &query).await);
    }

    #[tokio::test]
    async fn test_identity_segment_must_match_caller() {
        let me = Uuid::new_v4();
        let query = StaticQuery {
            thread_ok: true,
            booking_ok: true,
        };
        for own in [
            Channel::Identity(me),
            Channel::Availability(me),
            Channel::CreatorBookings(me),
            Channel::ClientBookings(me),
        ] {
            assert!(can_subscribe(&own, &ctx(me), &query).await);
        }
        let other = Uuid::new_v4();
        assert!(!can_subscribe(&Channel::CreatorBookings(other), &ctx(me), &query).await);
        assert!(!can_subscribe(&Channel::Identity(other), &ctx(me), &query).await);
    }

    #[tokio::test]
    async fn test_record_scoped_channels_ask_the_domain() {
        let me = Uuid::new_v4();
        let yes = StaticQuery {
            thread_ok: true,
            booking_ok: true,
        };
        let no = StaticQuery {
            thread_ok: false,
            booking_ok: false,
        };
        let thread = Channel::MessageThread(Uuid::new_v4());
        let booking = Channel::BookingRequest(Uuid::new_v4());
        assert!(can_subscribe(&thread, &ctx(me), &yes).await);
        assert!(can_subscribe(&booking, &ctx(me), &yes).await);
        assert!(!can_subscribe(&thread, &ctx(me), &no).await);
        assert!(!can_subscribe(&booking, &ctx(me), &no).await);
    }
}
