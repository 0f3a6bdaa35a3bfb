//! Parsed change notifications.

use std::collections::HashSet;

use serde_json::Value;

/// A change notification delivered on one push channel.
///
/// Parsed from the transport payload on delivery and consumed synchronously
/// by the subscriber; never stored. The record ids and field names are
/// currently informational (invalidation is broad per channel), but they are
/// surfaced here so a narrower filter can use them later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEvent {
    pub channel: String,
    pub changed_entity_ids: HashSet<String>,
    pub changed_fields: HashSet<String>,
}

impl ChangeEvent {
    /// Extracts the change header from a CDC-shaped payload
    /// (`data.payload.ChangeEventHeader`). Returns `None` when the payload
    /// carries no header; the caller still invalidates broadly in that case.
    pub fn parse(channel: &str, payload: &Value) -> Option<Self> {
        let header = payload.pointer("/data/payload/ChangeEventHeader")?;
        Some(Self {
            channel: channel.to_string(),
            changed_entity_ids: string_set(header.get("recordIds")),
            changed_fields: string_set(header.get("changedFields")),
        })
    }
}

fn string_set(value: Option<&Value>) -> HashSet<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
