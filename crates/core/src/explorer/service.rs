//! Cascade coordination: selections, dependent fetch rules, sinks.

use std::sync::{Arc, Mutex};

use log::{debug, warn};

use super::slot::QuerySlot;
use super::snapshot::{ExplorerSnapshot, SnapshotSink};
use crate::constants::ERROR_NOTIFICATION_TITLE;
use crate::notifications::{
    reduce_errors, Notification, NormalizedError, NotificationSink,
};
use crate::remote::{ErrorPayload, OrderQueryClient, OrderRecord, PicklistOption};

/// Parameters of one orders fetch.
#[derive(Clone, PartialEq)]
struct OrderScope {
    account_id: String,
    due_month: String,
}

struct Selections {
    account_id: Option<String>,
    due_month: Option<String>,
    /// Armed on account selection. The first months load that applies
    /// disarms it and may auto-select the first option; reloads after that
    /// never auto-select.
    auto_select_armed: bool,
}

/// Coordinates the Accounts -> Months -> Orders query cascade.
///
/// Owns the three cache slots and both selections. Changing a selection
/// resets and reloads everything downstream of it; push-driven refreshes
/// come in through [`refresh_accounts`] and [`refresh_months_and_orders`].
/// Overlapping fetches need no cancellation: each slot's fetch token
/// discards whichever completion is no longer the latest, under any
/// completion order.
///
/// Every state change publishes a fresh [`ExplorerSnapshot`] through the
/// snapshot sink; failures that apply are reduced and forwarded to the
/// notification sink without halting sibling nodes.
///
/// [`refresh_accounts`]: ExplorerService::refresh_accounts
/// [`refresh_months_and_orders`]: ExplorerService::refresh_months_and_orders
pub struct ExplorerService {
    client: Arc<dyn OrderQueryClient>,
    notifications: Arc<dyn NotificationSink>,
    snapshots: Arc<dyn SnapshotSink>,
    accounts: QuerySlot<(), PicklistOption>,
    months: QuerySlot<String, PicklistOption>,
    orders: QuerySlot<OrderScope, OrderRecord>,
    selections: Mutex<Selections>,
}

impl ExplorerService {
    pub fn new(
        client: Arc<dyn OrderQueryClient>,
        notifications: Arc<dyn NotificationSink>,
        snapshots: Arc<dyn SnapshotSink>,
    ) -> Self {
        Self {
            client,
            notifications,
            snapshots,
            accounts: QuerySlot::new(),
            months: QuerySlot::new(),
            orders: QuerySlot::new(),
            selections: Mutex::new(Selections {
                account_id: None,
                due_month: None,
                auto_select_armed: false,
            }),
        }
    }

    /// Loads the account option list. Called once on startup and again for
    /// every account change event; a reload keeps the previous list visible
    /// while in flight.
    pub async fn load_accounts(&self) {
        let token = self.accounts.begin(());
        self.publish();
        debug!("loading accounts with orders");
        match self.client.list_accounts_with_orders().await {
            Ok(items) => {
                if self.accounts.complete_ok(token, items) {
                    self.publish();
                }
            }
            Err(payload) => self.apply_failure("accounts", &self.accounts, token, payload),
        }
    }

    /// Account change event: re-fetch the account list. Month and order
    /// selections stay untouched even if the selected account no longer
    /// appears in the refreshed list.
    pub async fn refresh_accounts(&self) {
        self.load_accounts().await;
    }

    /// Selects an account: clears the month selection, resets the order
    /// list, and loads the eligible months for the new account.
    pub async fn select_account(&self, account_id: impl Into<String>) {
        let account_id = account_id.into();
        debug!("account selected: {account_id}");
        {
            let mut sel = self.selections.lock().unwrap();
            sel.account_id = Some(account_id.clone());
            sel.due_month = None;
            sel.auto_select_armed = true;
        }
        self.orders.reset();
        self.publish();
        self.fetch_months(account_id).await;
    }

    /// Selects a payment-due month and loads the orders it scopes.
    pub async fn select_due_month(&self, due_month: impl Into<String>) {
        let due_month = due_month.into();
        debug!("due month selected: {due_month}");
        {
            let mut sel = self.selections.lock().unwrap();
            sel.due_month = Some(due_month);
        }
        self.refresh_orders().await;
    }

    /// Order change event: refresh the months list first (an order change
    /// can shift which months are eligible), then the orders scoped by it.
    /// A months refresh that fails or lands stale skips the orders refresh.
    /// No-op without an account selection.
    pub async fn refresh_months_and_orders(&self) {
        let account_id = self.selections.lock().unwrap().account_id.clone();
        let Some(account_id) = account_id else {
            debug!("order change ignored: no account selected");
            return;
        };
        if self.fetch_months(account_id).await {
            self.refresh_orders().await;
        }
    }

    /// Re-fetches the order list for the current selections. With either
    /// selection missing the order slot empties without a remote call.
    pub async fn refresh_orders(&self) {
        let scope = {
            let sel = self.selections.lock().unwrap();
            match (&sel.account_id, &sel.due_month) {
                (Some(account_id), Some(due_month)) => Some(OrderScope {
                    account_id: account_id.clone(),
                    due_month: due_month.clone(),
                }),
                _ => None,
            }
        };
        let Some(scope) = scope else {
            self.orders.reset();
            self.publish();
            return;
        };
        let token = self.orders.begin(scope.clone());
        self.publish();
        debug!(
            "loading orders for account {} month {}",
            scope.account_id, scope.due_month
        );
        match self
            .client
            .list_orders(&scope.account_id, &scope.due_month)
            .await
        {
            Ok(items) => {
                if self.orders.complete_ok(token, items) {
                    self.publish();
                }
            }
            Err(payload) => self.apply_failure("orders", &self.orders, token, payload),
        }
    }

    /// Current state, also published through the snapshot sink on every
    /// mutation.
    pub fn snapshot(&self) -> ExplorerSnapshot {
        let sel = self.selections.lock().unwrap();
        ExplorerSnapshot {
            accounts: self.accounts.snapshot(),
            months: self.months.snapshot(),
            orders: self.orders.snapshot(),
            selected_account_id: sel.account_id.clone(),
            selected_due_month: sel.due_month.clone(),
        }
    }

    /// Fetches the months for `account_id`. Returns whether the completion
    /// applied successfully (not stale, not failed); the chained orders
    /// refresh in [`refresh_months_and_orders`] hangs off that.
    ///
    /// [`refresh_months_and_orders`]: ExplorerService::refresh_months_and_orders
    async fn fetch_months(&self, account_id: String) -> bool {
        let token = self.months.begin(account_id.clone());
        self.publish();
        debug!("loading due months for account {account_id}");
        match self.client.list_due_months(&account_id).await {
            Ok(items) => {
                if !self.months.complete_ok(token, items.clone()) {
                    return false;
                }
                self.publish();
                if let Some(first) = self.take_auto_selection(&account_id, &items) {
                    debug!("auto-selecting first due month: {first}");
                    self.select_due_month(first).await;
                }
                true
            }
            Err(payload) => {
                self.apply_failure("months", &self.months, token, payload);
                false
            }
        }
    }

    /// Disarms the auto-select latch and returns the option to select, when
    /// this applied months load is the first one since its account was
    /// chosen and no month has been picked meanwhile.
    fn take_auto_selection(&self, account_id: &str, items: &[PicklistOption]) -> Option<String> {
        let mut sel = self.selections.lock().unwrap();
        if !sel.auto_select_armed || sel.account_id.as_deref() != Some(account_id) {
            return None;
        }
        sel.auto_select_armed = false;
        if sel.due_month.is_none() {
            items.first().map(|option| option.value.clone())
        } else {
            None
        }
    }

    /// Applies a failed completion to `slot` and, when it is not stale,
    /// reduces the payload and reports it. The slot keeps its last good
    /// value either way.
    fn apply_failure<P, T>(
        &self,
        node: &str,
        slot: &QuerySlot<P, T>,
        token: u64,
        payload: ErrorPayload,
    ) where
        P: Clone + PartialEq,
        T: Clone,
    {
        let mut errors = reduce_errors(&[payload]);
        if errors.is_empty() {
            errors.push(NormalizedError::unknown("Unknown error"));
        }
        let representative = errors[0].clone();
        if slot.complete_err(token, representative) {
            warn!("{node} query failed: {}", errors[0].message);
            self.notifications
                .notify(Notification::from_errors(ERROR_NOTIFICATION_TITLE, &errors));
            self.publish();
        }
    }

    fn publish(&self) {
        self.snapshots.publish(self.snapshot());
    }
}
