//! Push transport boundary for change notifications.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;
use uuid::Uuid;

use crate::errors::Result;

/// Callback invoked with each raw message delivered on a channel.
pub type MessageHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Callback invoked with channel-level transport faults.
pub type FaultHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ()> + Send + Sync>;

/// Identity of one live channel subscription, minted by the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub id: Uuid,
    pub channel: String,
}

impl SubscriptionHandle {
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.into(),
        }
    }
}

/// Push-notification transport consumed by the subscriber.
///
/// Delivery is at-least-once and unordered relative to user-driven work; the
/// explorer's fetch tokens absorb any interleaving. Implementations own the
/// channel mechanics (handshake, reconnect, replay).
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Subscribes `handler` to `channel`, replaying from `replay_from`.
    async fn subscribe(
        &self,
        channel: &str,
        replay_from: i64,
        handler: MessageHandler,
    ) -> Result<SubscriptionHandle>;

    /// Tears down one subscription.
    async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()>;

    /// Registers the handler for channel-level faults.
    fn on_transport_error(&self, handler: FaultHandler);
}
