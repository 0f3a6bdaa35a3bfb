//! Idempotent subscription management for change notifications.

use std::sync::Arc;

use futures::FutureExt;
use log::{debug, info, warn};
use serde_json::Value;
use tokio::sync::RwLock;

use super::change_event::ChangeEvent;
use super::transport::{MessageHandler, PushTransport, SubscriptionHandle};
use crate::constants::{
    ACCOUNT_CHANGE_CHANNEL, ERROR_NOTIFICATION_TITLE, ORDER_CHANGE_CHANNEL, REPLAY_NEW_EVENTS,
};
use crate::explorer::ExplorerService;
use crate::notifications::{Notification, NormalizedError, NotificationSink};

struct SubscriberState {
    active: bool,
    handles: Vec<SubscriptionHandle>,
}

/// Routes change events from the push transport into explorer refreshes.
///
/// Owns the channel subscriptions and nothing else; all cached data stays
/// with the [`ExplorerService`]. Account change events re-fetch the account
/// list; order change events re-fetch months and then orders. Invalidation
/// is broad per channel: the record ids carried by an event are logged but
/// not matched against current state.
pub struct ChangeEventSubscriber {
    transport: Arc<dyn PushTransport>,
    service: Arc<ExplorerService>,
    notifications: Arc<dyn NotificationSink>,
    state: RwLock<SubscriberState>,
}

impl ChangeEventSubscriber {
    pub fn new(
        transport: Arc<dyn PushTransport>,
        service: Arc<ExplorerService>,
        notifications: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            transport,
            service,
            notifications,
            state: RwLock::new(SubscriberState {
                active: false,
                handles: Vec::new(),
            }),
        }
    }

    /// Establishes one subscription per change channel. Calling again while
    /// active is a no-op. The write lock is held across the subscribe awaits
    /// so a concurrent `activate` waits instead of double-subscribing.
    ///
    /// A channel the transport refuses is reported through the notification
    /// sink and left without a handle; the other channels still subscribe.
    pub async fn activate(&self) {
        let mut state = self.state.write().await;
        if state.active {
            debug!("change event subscriber already active");
            return;
        }
        self.transport.on_transport_error(Arc::new({
            let notifications = self.notifications.clone();
            move |fault: Value| {
                let notifications = notifications.clone();
                async move {
                    warn!("push transport fault: {fault}");
                    notifications.notify(Notification::from_errors(
                        ERROR_NOTIFICATION_TITLE,
                        &[NormalizedError::transport(format!(
                            "Push channel fault: {fault}"
                        ))],
                    ));
                }
                .boxed()
            }
        }));
        for channel in [ACCOUNT_CHANGE_CHANNEL, ORDER_CHANGE_CHANNEL] {
            let handler = self.dispatch_handler(channel);
            match self
                .transport
                .subscribe(channel, REPLAY_NEW_EVENTS, handler)
                .await
            {
                Ok(handle) => {
                    info!("subscribed to {channel}");
                    state.handles.push(handle);
                }
                Err(err) => {
                    warn!("failed to subscribe to {channel}: {err}");
                    self.notifications.notify(Notification::from_errors(
                        ERROR_NOTIFICATION_TITLE,
                        &[NormalizedError::transport(err.to_string())],
                    ));
                }
            }
        }
        state.active = true;
    }

    /// Tears down every confirmed subscription. A channel that never got a
    /// handle is skipped silently; an unsubscribe the transport rejects is
    /// logged and dropped. Safe to call when never activated.
    pub async fn deactivate(&self) {
        let mut state = self.state.write().await;
        for handle in state.handles.drain(..) {
            let channel = handle.channel.clone();
            match self.transport.unsubscribe(handle).await {
                Ok(()) => info!("unsubscribed from {channel}"),
                Err(err) => warn!("failed to unsubscribe from {channel}: {err}"),
            }
        }
        state.active = false;
    }

    fn dispatch_handler(&self, channel: &'static str) -> MessageHandler {
        let service = self.service.clone();
        Arc::new(move |payload: Value| {
            let service = service.clone();
            async move {
                match ChangeEvent::parse(channel, &payload) {
                    Some(event) => debug!(
                        "{channel} event: {} records, fields {:?}",
                        event.changed_entity_ids.len(),
                        event.changed_fields
                    ),
                    None => warn!("unparseable payload on {channel}, refreshing anyway"),
                }
                if channel == ACCOUNT_CHANGE_CHANNEL {
                    service.refresh_accounts().await;
                } else {
                    service.refresh_months_and_orders().await;
                }
            }
            .boxed()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::errors::{Error, Result};
    use crate::events::transport::FaultHandler;
    use crate::explorer::NoOpSnapshotSink;
    use crate::notifications::MockNotificationSink;
    use crate::remote::{OrderQueryClient, PicklistOption, QueryResult};

    // =========================================================================
    // Mock PushTransport
    // =========================================================================

    #[derive(Default)]
    struct MockTransport {
        subscriptions: Mutex<Vec<(String, i64, MessageHandler)>>,
        fail_channels: Mutex<HashSet<String>>,
        fail_unsubscribe: Mutex<bool>,
        unsubscribed: Mutex<Vec<String>>,
        fault_handler: Mutex<Option<FaultHandler>>,
    }

    impl MockTransport {
        fn fail_channel(&self, channel: &str) {
            self.fail_channels.lock().unwrap().insert(channel.to_string());
        }

        fn set_fail_unsubscribe(&self, fail: bool) {
            *self.fail_unsubscribe.lock().unwrap() = fail;
        }

        fn subscription_count(&self, channel: &str) -> usize {
            self.subscriptions
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _, _)| c == channel)
                .count()
        }

        fn unsubscribed(&self) -> Vec<String> {
            self.unsubscribed.lock().unwrap().clone()
        }

        async fn deliver(&self, channel: &str, payload: Value) {
            let handlers: Vec<MessageHandler> = self
                .subscriptions
                .lock()
                .unwrap()
                .iter()
                .filter(|(c, _, _)| c == channel)
                .map(|(_, _, handler)| handler.clone())
                .collect();
            for handler in handlers {
                handler(payload.clone()).await;
            }
        }

        async fn raise_fault(&self, fault: Value) {
            let handler = self.fault_handler.lock().unwrap().clone();
            if let Some(handler) = handler {
                handler(fault).await;
            }
        }
    }

    #[async_trait]
    impl PushTransport for MockTransport {
        async fn subscribe(
            &self,
            channel: &str,
            replay_from: i64,
            handler: MessageHandler,
        ) -> Result<SubscriptionHandle> {
            if self.fail_channels.lock().unwrap().contains(channel) {
                return Err(Error::SubscriptionFailed {
                    channel: channel.to_string(),
                    reason: "intentional subscribe failure".to_string(),
                });
            }
            self.subscriptions
                .lock()
                .unwrap()
                .push((channel.to_string(), replay_from, handler));
            Ok(SubscriptionHandle::new(channel))
        }

        async fn unsubscribe(&self, handle: SubscriptionHandle) -> Result<()> {
            if *self.fail_unsubscribe.lock().unwrap() {
                return Err(Error::Transport("intentional unsubscribe failure".into()));
            }
            self.unsubscribed
                .lock()
                .unwrap()
                .push(handle.channel.clone());
            let mut subscriptions = self.subscriptions.lock().unwrap();
            if let Some(pos) = subscriptions
                .iter()
                .position(|(c, _, _)| *c == handle.channel)
            {
                subscriptions.remove(pos);
            }
            Ok(())
        }

        fn on_transport_error(&self, handler: FaultHandler) {
            *self.fault_handler.lock().unwrap() = Some(handler);
        }
    }

    // =========================================================================
    // Mock OrderQueryClient
    // =========================================================================

    #[derive(Clone, Default)]
    struct RecordingClient {
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingClient {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn clear_calls(&self) {
            self.calls.lock().unwrap().clear();
        }
    }

    #[async_trait]
    impl OrderQueryClient for RecordingClient {
        async fn list_accounts_with_orders(&self) -> QueryResult<PicklistOption> {
            self.calls.lock().unwrap().push("accounts".to_string());
            Ok(vec![PicklistOption::new("Acme", "A")])
        }

        async fn list_due_months(&self, account_id: &str) -> QueryResult<PicklistOption> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("months({account_id})"));
            Ok(vec![PicklistOption::new("January", "1")])
        }

        async fn list_orders(
            &self,
            account_id: &str,
            due_month: &str,
        ) -> QueryResult<crate::remote::OrderRecord> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("orders({account_id},{due_month})"));
            Ok(Vec::new())
        }
    }

    fn subscriber_with(
        transport: Arc<MockTransport>,
    ) -> (
        Arc<ChangeEventSubscriber>,
        RecordingClient,
        MockNotificationSink,
        Arc<ExplorerService>,
    ) {
        let client = RecordingClient::default();
        let notifications = MockNotificationSink::new();
        let service = Arc::new(ExplorerService::new(
            Arc::new(client.clone()),
            Arc::new(notifications.clone()),
            Arc::new(NoOpSnapshotSink),
        ));
        let subscriber = Arc::new(ChangeEventSubscriber::new(
            transport,
            service.clone(),
            Arc::new(notifications.clone()),
        ));
        (subscriber, client, notifications, service)
    }

    fn cdc_payload(record_ids: &[&str]) -> Value {
        json!({
            "data": {
                "payload": {
                    "ChangeEventHeader": {
                        "recordIds": record_ids,
                        "changedFields": ["Total_Amount__c"]
                    }
                }
            }
        })
    }

    #[tokio::test]
    async fn test_activate_subscribes_each_channel_once_with_new_events_replay() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, _, _, _) = subscriber_with(transport.clone());

        subscriber.activate().await;

        assert_eq!(transport.subscription_count(ACCOUNT_CHANGE_CHANNEL), 1);
        assert_eq!(transport.subscription_count(ORDER_CHANGE_CHANNEL), 1);
        let subscriptions = transport.subscriptions.lock().unwrap();
        assert!(subscriptions
            .iter()
            .all(|(_, replay, _)| *replay == REPLAY_NEW_EVENTS));
    }

    #[tokio::test]
    async fn test_activate_twice_is_idempotent() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, _, _, _) = subscriber_with(transport.clone());

        subscriber.activate().await;
        subscriber.activate().await;

        assert_eq!(transport.subscription_count(ACCOUNT_CHANGE_CHANNEL), 1);
        assert_eq!(transport.subscription_count(ORDER_CHANGE_CHANNEL), 1);
    }

    #[tokio::test]
    async fn test_deactivate_without_activate_is_silent() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, _, notifications, _) = subscriber_with(transport.clone());

        subscriber.deactivate().await;

        assert!(transport.unsubscribed().is_empty());
        assert!(notifications.is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_then_activate_resubscribes() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, _, _, _) = subscriber_with(transport.clone());

        subscriber.activate().await;
        subscriber.deactivate().await;
        assert_eq!(transport.subscription_count(ACCOUNT_CHANGE_CHANNEL), 0);

        subscriber.activate().await;
        assert_eq!(transport.subscription_count(ACCOUNT_CHANGE_CHANNEL), 1);
        assert_eq!(transport.subscription_count(ORDER_CHANGE_CHANNEL), 1);
    }

    #[tokio::test]
    async fn test_failed_subscribe_reports_and_leaves_no_handle() {
        let transport = Arc::new(MockTransport::default());
        transport.fail_channel(ACCOUNT_CHANGE_CHANNEL);
        let (subscriber, _, notifications, _) = subscriber_with(transport.clone());

        subscriber.activate().await;

        assert_eq!(transport.subscription_count(ACCOUNT_CHANGE_CHANNEL), 0);
        assert_eq!(transport.subscription_count(ORDER_CHANGE_CHANNEL), 1);
        assert_eq!(notifications.len(), 1);
        assert!(notifications.notifications()[0]
            .message
            .contains(ACCOUNT_CHANGE_CHANNEL));

        // Only the confirmed channel is torn down.
        subscriber.deactivate().await;
        assert_eq!(transport.unsubscribed(), vec![ORDER_CHANGE_CHANNEL]);
    }

    #[tokio::test]
    async fn test_failed_unsubscribe_is_tolerated() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, _, _, _) = subscriber_with(transport.clone());

        subscriber.activate().await;
        transport.set_fail_unsubscribe(true);
        subscriber.deactivate().await;

        // Handles are gone despite the failures; a fresh activate resubscribes.
        transport.set_fail_unsubscribe(false);
        subscriber.activate().await;
        assert_eq!(transport.subscription_count(ORDER_CHANGE_CHANNEL), 2);
    }

    #[tokio::test]
    async fn test_account_event_refreshes_accounts_only() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, client, _, _) = subscriber_with(transport.clone());

        subscriber.activate().await;
        client.clear_calls();
        transport
            .deliver(ACCOUNT_CHANGE_CHANNEL, cdc_payload(&["001A"]))
            .await;

        assert_eq!(client.calls(), vec!["accounts"]);
    }

    #[tokio::test]
    async fn test_order_event_refreshes_months_then_orders() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, client, _, service) = subscriber_with(transport.clone());

        service.select_account("A").await;
        subscriber.activate().await;
        client.clear_calls();

        // Record ids outside the current scope still invalidate broadly.
        transport
            .deliver(ORDER_CHANGE_CHANNEL, cdc_payload(&["other-record"]))
            .await;

        assert_eq!(client.calls(), vec!["months(A)", "orders(A,1)"]);
    }

    #[tokio::test]
    async fn test_order_event_without_account_selection_is_ignored() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, client, _, _) = subscriber_with(transport.clone());

        subscriber.activate().await;
        client.clear_calls();
        transport
            .deliver(ORDER_CHANGE_CHANNEL, cdc_payload(&["001X"]))
            .await;

        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_payload_still_dispatches() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, client, _, _) = subscriber_with(transport.clone());

        subscriber.activate().await;
        client.clear_calls();
        transport
            .deliver(ACCOUNT_CHANGE_CHANNEL, json!({ "garbage": true }))
            .await;

        assert_eq!(client.calls(), vec!["accounts"]);
    }

    #[tokio::test]
    async fn test_transport_fault_reaches_notification_sink() {
        let transport = Arc::new(MockTransport::default());
        let (subscriber, _, notifications, _) = subscriber_with(transport.clone());

        subscriber.activate().await;
        transport
            .raise_fault(json!({ "error": "403::Handshake denied" }))
            .await;

        assert_eq!(notifications.len(), 1);
        let notification = &notifications.notifications()[0];
        assert!(notification.message.contains("Push channel fault"));
        assert!(notification.message.contains("Handshake denied"));
    }
}
