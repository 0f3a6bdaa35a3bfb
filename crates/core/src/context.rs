//! Bootstrap wiring for the explorer core.

use std::sync::Arc;

use log::info;

use crate::events::{ChangeEventSubscriber, PushTransport};
use crate::explorer::{ExplorerService, SnapshotSink};
use crate::notifications::NotificationSink;
use crate::remote::OrderQueryClient;

/// Wires the explorer service and change-event subscriber to the host's
/// query client, push transport, and sinks.
///
/// The host calls [`start`] when its surface comes up and [`stop`] when it
/// is torn down. Both are safe to call repeatedly: the initial accounts load
/// is a stale-while-revalidate refresh and subscription activation is
/// idempotent.
///
/// [`start`]: ExplorerContext::start
/// [`stop`]: ExplorerContext::stop
pub struct ExplorerContext {
    service: Arc<ExplorerService>,
    subscriber: Arc<ChangeEventSubscriber>,
}

impl ExplorerContext {
    pub fn new(
        client: Arc<dyn OrderQueryClient>,
        transport: Arc<dyn PushTransport>,
        notifications: Arc<dyn NotificationSink>,
        snapshots: Arc<dyn SnapshotSink>,
    ) -> Self {
        let service = Arc::new(ExplorerService::new(
            client,
            notifications.clone(),
            snapshots,
        ));
        let subscriber = Arc::new(ChangeEventSubscriber::new(
            transport,
            service.clone(),
            notifications,
        ));
        Self {
            service,
            subscriber,
        }
    }

    /// The service driving selections and refreshes; the host surface calls
    /// its selection methods directly.
    pub fn service(&self) -> Arc<ExplorerService> {
        self.service.clone()
    }

    /// Loads the account list and subscribes to the change channels.
    pub async fn start(&self) {
        info!("starting order explorer");
        self.service.load_accounts().await;
        self.subscriber.activate().await;
    }

    /// Tears down the active subscriptions. Cached values stay in place so a
    /// restarted surface renders immediately.
    pub async fn stop(&self) {
        info!("stopping order explorer");
        self.subscriber.deactivate().await;
    }
}
