//! Client boundary for the remote order query service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::model::{OrderRecord, PicklistOption};

/// Opaque failure payload handed back by the remote query layer.
///
/// The query service reports failures as loosely structured JSON whose shape
/// varies by failure class (application message, per-field validation, record
/// batch errors). The payload is carried as-is and only interpreted by the
/// error reducer in `notifications::reducer`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorPayload(Value);

impl ErrorPayload {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Convenience for callers that only have a bare message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self(json!({ "message": message.into() }))
    }

    pub fn value(&self) -> &Value {
        &self.0
    }
}

/// Result of one remote list query.
pub type QueryResult<T> = Result<Vec<T>, ErrorPayload>;

/// Read access to the remote order query service.
///
/// All three operations are idempotent reads. Implementations own transport
/// concerns (HTTP, retries, timeouts); callers only see the option/record
/// lists or an opaque [`ErrorPayload`].
#[async_trait]
pub trait OrderQueryClient: Send + Sync {
    /// Lists accounts that have at least one order.
    async fn list_accounts_with_orders(&self) -> QueryResult<PicklistOption>;

    /// Lists the payment-due months with orders for one account.
    async fn list_due_months(&self, account_id: &str) -> QueryResult<PicklistOption>;

    /// Lists the orders for one account and payment-due month.
    async fn list_orders(&self, account_id: &str, due_month: &str) -> QueryResult<OrderRecord>;
}
