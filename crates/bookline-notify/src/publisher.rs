//! Channel publisher trait and the in-process broadcast transport.
//!
//! The dispatcher only ever talks to [`ChannelPublisher`]; swapping the
//! in-process transport for an external push service is a matter of
//! providing another implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

use bookline_core::Channel;

use crate::error::Result;

/// Per-channel buffer for slow subscribers; older events are dropped
/// for receivers that lag beyond it.
const CHANNEL_BUFFER_SIZE: usize = 256;

/// A payload as delivered on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub channel: String,
    pub payload: serde_json::Value,
}

/// Transport that accepts a channel name plus payload and delivers it,
/// at least once, to subscribed listeners.
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// Deliver `payload` to every subscriber of `channel`.
    async fn publish(&self, channel: &Channel, payload: &serde_json::Value) -> Result<()>;
}

/// Type alias for a shareable publisher.
pub type DynChannelPublisher = Arc<dyn ChannelPublisher>;

/// In-process transport backed by one tokio broadcast channel per
/// channel name. Senders are created lazily on first subscribe or
/// first publish.
pub struct BroadcastPublisher {
    senders: RwLock<HashMap<String, broadcast::Sender<ChannelMessage>>>,
}

impl BroadcastPublisher {
    pub fn new() -> Self {
        Self {
            senders: RwLock::new(HashMap::new()),
        }
    }

    /// Create a new publisher wrapped in an Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Subscribe to a channel. Events published before subscription
    /// are not received.
    pub async fn subscribe(&self, channel: &Channel) -> broadcast::Receiver<ChannelMessage> {
        let mut senders = self.senders.write().await;
        senders
            .entry(channel.name())
            .or_insert_with(|| broadcast::channel(CHANNEL_BUFFER_SIZE).0)
            .subscribe()
    }

    /// Number of active subscribers on a channel.
    pub async fn subscriber_count(&self, channel: &Channel) -> usize {
        self.senders
            .read()
            .await
            .get(&channel.name())
            .map_or(0, broadcast::Sender::receiver_count)
    }
}

impl Default for BroadcastPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BroadcastPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BroadcastPublisher").finish()
    }
}

#[async_trait]
impl ChannelPublisher for BroadcastPublisher {
    async fn publish(&self, channel: &Channel, payload: &serde_json::Value) -> Result<()> {
        let name = channel.name();
        let message = ChannelMessage {
            channel: name.clone(),
            payload: payload.clone(),
        };
        let senders = self.senders.read().await;
        let Some(sender) = senders.get(&name) else {
            // Nobody ever subscribed; at-least-once holds trivially.
            debug!(channel = %name, "no subscribers, dropping payload");
            return Ok(());
        };
        match sender.send(message) {
            Ok(delivered) => {
                debug!(channel = %name, subscribers = delivered, "published");
                Ok(())
            }
            // All receivers dropped since the sender was created.
            Err(_) => Ok(()),
        }
    }
}

// Keep the failure path constructible for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) struct FailingPublisher;

#[cfg(test)]
#[async_trait]
impl ChannelPublisher for FailingPublisher {
    async fn publish(&self, channel: &Channel, _payload: &serde_json::Value) -> Result<()> {
        Err(crate::error::NotifyError::publish_failed(
            channel.name(),
            "transport down",
        ))
    }
}
