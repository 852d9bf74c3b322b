//! Event fan-out dispatcher.
//!
//! Mutations enqueue a [`DomainEvent`] through an [`EventSink`] and
//! return immediately; a dispatcher task drains the queue, resolves the
//! channel set, and pushes the payload to the transport. A failed or
//! dropped delivery never reaches back into the mutation: the domain
//! change has already committed.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use bookline_core::events::{resolve_channels, Channel, DomainEvent};

use crate::publisher::DynChannelPublisher;

/// Retry schedule for failed channel deliveries.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per channel, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each subsequent one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
        }
    }
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        // attempt is 1-based; exponential backoff from base_delay.
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

/// Cheap handle mutations use to enqueue events.
///
/// `dispatch` never fails and never blocks: if the dispatcher is gone
/// the event is dropped with a warning, because the mutation must not
/// be failed for a notification-layer fault.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<DomainEvent>,
}

impl EventSink {
    pub fn dispatch(&self, event: DomainEvent) {
        let kind = event.kind();
        if self.tx.send(event).is_err() {
            warn!(kind, "event dispatcher is gone, dropping event");
        }
    }

    /// A sink paired with the raw receiver, for asserting on enqueued
    /// events without running a dispatcher.
    pub fn capture() -> (Self, mpsc::UnboundedReceiver<DomainEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

/// Worker that drains the event queue into the channel transport.
pub struct FanOutDispatcher {
    rx: mpsc::UnboundedReceiver<DomainEvent>,
    publisher: DynChannelPublisher,
    retry: RetryPolicy,
}

impl FanOutDispatcher {
    /// Build a dispatcher plus the sink feeding it.
    pub fn new(publisher: DynChannelPublisher, retry: RetryPolicy) -> (EventSink, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            EventSink { tx },
            Self {
                rx,
                publisher,
                retry,
            },
        )
    }

    /// Drain events until every sink is dropped.
    pub async fn run(mut self) {
        info!("event dispatcher started");
        while let Some(event) = self.rx.recv().await {
            self.fan_out(&event).await;
        }
        info!("event dispatcher stopped");
    }

    /// Publish one event to all of its channels. Returns the number of
    /// channels that accepted the payload.
    pub async fn fan_out(&self, event: &DomainEvent) -> usize {
        let channels = resolve_channels(event);
        let payload = match serde_json::to_value(event) {
            Ok(payload) => payload,
            Err(error) => {
                warn!(kind = event.kind(), %error, "failed to serialize event, dropping");
                return 0;
            }
        };
        let mut delivered = 0;
        for channel in &channels {
            if self.publish_with_retry(channel, &payload).await {
                delivered += 1;
            }
        }
        debug!(
            kind = event.kind(),
            channels = channels.len(),
            delivered,
            "fanned out event"
        );
        delivered
    }

    async fn publish_with_retry(&self, channel: &Channel, payload: &serde_json::Value) -> bool {
        for attempt in 1..=self.retry.max_attempts {
            match self.publisher.publish(channel, payload).await {
                Ok(()) => return true,
                Err(error) => {
                    if attempt == self.retry.max_attempts {
                        warn!(
                            channel = %channel,
                            attempts = attempt,
                            %error,
                            "giving up on channel delivery"
                        );
                        return false;
                    }
                    let delay = self.retry.delay_for(attempt);
                    debug!(channel = %channel, attempt, delay_ms = delay.as_millis() as u64, %error, "retrying channel delivery");
                    tokio::time::sleep(delay).await;
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotifyError;
    use crate::publisher::{ChannelPublisher, FailingPublisher};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use time::{Duration as TimeDuration, OffsetDateTime};
    use uuid::Uuid;

    use bookline_core::{BookingRequest, BookingStatus, BookingType};

    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<String>>,
        fail_first: AtomicU32,
    }

    #[async_trait]
    impl ChannelPublisher for RecordingPublisher {
        async fn publish(
            &self,
            channel: &Channel,
            _payload: &serde_json::Value,
        ) -> crate::error::Result<()> {
            let remaining = self.fail_first.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_first.store(remaining - 1, Ordering::SeqCst);
                return Err(NotifyError::publish_failed(channel.name(), "flaky"));
            }
            self.published.lock().unwrap().push(channel.name());
            Ok(())
        }
    }

    fn booking() -> BookingRequest {
        BookingRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            OffsetDateTime::now_utc() + TimeDuration::days(1),
            BookingType::Consultation,
            None,
            "UTC",
        )
        .unwrap()
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_status_change_fans_out_to_three_channels() {
        let publisher = Arc::new(RecordingPublisher::default());
        let (_sink, dispatcher) = FanOutDispatcher::new(publisher.clone(), fast_retry());

        let booking = booking();
        let event = DomainEvent::booking_status_changed(booking.clone(), BookingStatus::Pending);
        let delivered = dispatcher.fan_out(&event).await;

        assert_eq!(delivered, 3);
        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 3);
        assert!(published.contains(&format!("booking-request.{}", booking.id)));
        assert!(published.contains(&format!(
            "creator-bookings.{}",
            booking.creator_identity_id
        )));
        assert!(published.contains(&format!(
            "client-bookings.{}",
            booking.client_identity_id
        )));
    }

    #[tokio::test]
    async fn test_worker_drains_queue() {
        let publisher = Arc::new(RecordingPublisher::default());
        let (sink, dispatcher) = FanOutDispatcher::new(publisher.clone(), fast_retry());
        let worker = tokio::spawn(dispatcher.run());

        sink.dispatch(DomainEvent::booking_created(booking()));
        sink.dispatch(DomainEvent::booking_created(booking()));
        drop(sink);

        // run() returns once all sinks are gone and the queue is empty
        worker.await.unwrap();
        assert_eq!(publisher.published.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_transient_failure_is_retried() {
        let publisher = Arc::new(RecordingPublisher {
            published: Mutex::new(Vec::new()),
            fail_first: AtomicU32::new(1),
        });
        let (_sink, dispatcher) = FanOutDispatcher::new(publisher.clone(), fast_retry());

        let delivered = dispatcher
            .fan_out(&DomainEvent::booking_created(booking()))
            .await;
        assert_eq!(delivered, 1);
        assert_eq!(publisher.published.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_swallowed() {
        let (_sink, dispatcher) =
            FanOutDispatcher::new(Arc::new(FailingPublisher), fast_retry());
        // Gives up after max_attempts; no panic, no error to the caller.
        let delivered = dispatcher
            .fan_out(&DomainEvent::booking_created(booking()))
            .await;
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_dispatch_after_worker_dropped_is_silent() {
        let publisher = Arc::new(RecordingPublisher::default());
        let (sink, dispatcher) = FanOutDispatcher::new(publisher, fast_retry());
        drop(dispatcher);
        // Must not panic or block
        sink.dispatch(DomainEvent::booking_created(booking()));
    }

    #[test]
    fn test_backoff_doubles() {
        let retry = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(retry.delay_for(1), Duration::from_millis(100));
        assert_eq!(retry.delay_for(2), Duration::from_millis(200));
        assert_eq!(retry.delay_for(3), Duration::from_millis(400));
    }
}
