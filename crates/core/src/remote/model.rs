//! Wire models returned by the remote query endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A selectable option returned by the accounts and due-months endpoints.
///
/// `value` is the identifier the dependent queries are scoped by; `label`
/// is display text and carries no meaning for the cascade logic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PicklistOption {
    pub label: String,
    pub value: String,
}

impl PicklistOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// An order scoped by account and payment-due month.
///
/// Display derivations (record URLs, localized dates, currency formatting)
/// belong to the rendering surface, not to this model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub id: String,
    pub name: String,
    pub payment_due_date: NaiveDate,
    pub total_amount: Decimal,
}
