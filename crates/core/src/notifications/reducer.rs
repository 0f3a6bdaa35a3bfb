//! Reduction of heterogeneous remote failure payloads.
//!
//! The remote query layer reports failures as loosely structured JSON. This
//! module classifies each payload with an ordered sequence of typed
//! extractors and reduces it to [`NormalizedError`] entries. Classification
//! precedence: application message, then per-field validation, then
//! record-level batch failure, then a best-effort text fallback.
//!
//! The reduction is pure and total: no payload, however malformed, panics or
//! escapes without a message. Null payloads are dropped.

use serde_json::{json, Value};

use super::model::{ErrorKind, NormalizedError};
use crate::remote::ErrorPayload;

/// Reduces a batch of opaque failure payloads to normalized errors.
pub fn reduce_errors(payloads: &[ErrorPayload]) -> Vec<NormalizedError> {
    payloads
        .iter()
        .flat_map(|payload| reduce_payload(payload.value()))
        .collect()
}

fn reduce_payload(value: &Value) -> Vec<NormalizedError> {
    if value.is_null() {
        return Vec::new();
    }
    if let Some(error) = extract_application(value) {
        return vec![error];
    }
    let field_errors = extract_field_validation(value);
    if !field_errors.is_empty() {
        return field_errors;
    }
    if let Some(error) = extract_partial_failure(value) {
        return vec![error];
    }
    vec![extract_fallback(value)]
}

/// Application-level failure: `body.message` carries the whole story.
fn extract_application(value: &Value) -> Option<NormalizedError> {
    let message = value.pointer("/body/message")?.as_str()?;
    if message.is_empty() {
        return None;
    }
    Some(NormalizedError::new(ErrorKind::Application, message))
}

/// Field-validation failure: `body.fieldErrors` maps each offending field to
/// a list of `{message, statusCode}` entries. Expands into one normalized
/// error per field entry.
fn extract_field_validation(value: &Value) -> Vec<NormalizedError> {
    let Some(field_errors) = value.pointer("/body/fieldErrors").and_then(Value::as_object) else {
        return Vec::new();
    };
    field_errors
        .iter()
        .flat_map(|(field, entries)| {
            entries
                .as_array()
                .map(Vec::as_slice)
                .unwrap_or_default()
                .iter()
                .map(move |entry| field_entry_error(field, entry))
        })
        .collect()
}

fn field_entry_error(field: &str, entry: &Value) -> NormalizedError {
    let message = entry
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("invalid value");
    let code = entry.get("statusCode").cloned().unwrap_or(Value::Null);
    NormalizedError::with_details(
        ErrorKind::Validation,
        format!("{field}: {message}"),
        json!({ "field": field, "code": code }),
    )
}

/// Record-level batch failure: `body.pageErrors` lists per-record failures;
/// the first one is representative.
fn extract_partial_failure(value: &Value) -> Option<NormalizedError> {
    let first = value
        .pointer("/body/pageErrors")
        .and_then(Value::as_array)?
        .first()?;
    let message = first
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("record-level failure");
    Some(NormalizedError::with_details(
        ErrorKind::PartialFailure,
        message,
        first.clone(),
    ))
}

/// Last resort: whatever human-readable text the payload exposes.
fn extract_fallback(value: &Value) -> NormalizedError {
    let text = [
        value.get("message"),
        value.get("body"),
        value.get("statusText"),
    ]
    .into_iter()
    .flatten()
    .find_map(|v| v.as_str().filter(|s| !s.is_empty()));
    match text {
        Some(text) => NormalizedError::unknown(text),
        None => NormalizedError::unknown("Unknown error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(value: Value) -> ErrorPayload {
        ErrorPayload::new(value)
    }

    #[test]
    fn test_application_error_wins_over_other_shapes() {
        let reduced = reduce_errors(&[payload(json!({
            "body": {
                "message": "Too many rows",
                "fieldErrors": { "Name": [{ "message": "bad", "statusCode": "X" }] }
            }
        }))]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].kind, ErrorKind::Application);
        assert_eq!(reduced[0].message, "Too many rows");
    }

    #[test]
    fn test_field_validation_expands_per_field() {
        let reduced = reduce_errors(&[payload(json!({
            "body": {
                "fieldErrors": {
                    "Total_Amount": [{ "message": "bad", "statusCode": "X" }],
                    "Name": [{ "message": "required", "statusCode": "REQUIRED_FIELD" }]
                }
            }
        }))]);
        assert_eq!(reduced.len(), 2);
        assert!(reduced.iter().all(|e| e.kind == ErrorKind::Validation));
        let amount = reduced
            .iter()
            .find(|e| e.message.contains("Total_Amount"))
            .unwrap();
        assert!(amount.message.contains("bad"));
        assert_eq!(
            amount.details.as_ref().unwrap()["field"],
            json!("Total_Amount")
        );
        assert_eq!(amount.details.as_ref().unwrap()["code"], json!("X"));
    }

    #[test]
    fn test_partial_failure_takes_first_entry() {
        let reduced = reduce_errors(&[payload(json!({
            "body": {
                "pageErrors": [
                    { "message": "row 3 locked", "statusCode": "LOCKED" },
                    { "message": "row 9 locked", "statusCode": "LOCKED" }
                ]
            }
        }))]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].kind, ErrorKind::PartialFailure);
        assert_eq!(reduced[0].message, "row 3 locked");
    }

    #[test]
    fn test_fallback_prefers_message_then_body_then_status_text() {
        let reduced = reduce_errors(&[
            payload(json!({ "message": "offline" })),
            payload(json!({ "body": "gateway timeout" })),
            payload(json!({ "statusText": "Service Unavailable" })),
        ]);
        let messages: Vec<_> = reduced.iter().map(|e| e.message.as_str()).collect();
        assert_eq!(
            messages,
            vec!["offline", "gateway timeout", "Service Unavailable"]
        );
        assert!(reduced.iter().all(|e| e.kind == ErrorKind::Unknown));
    }

    #[test]
    fn test_null_payloads_are_dropped() {
        let reduced = reduce_errors(&[payload(Value::Null), payload(json!({ "message": "kept" }))]);
        assert_eq!(reduced.len(), 1);
        assert_eq!(reduced[0].message, "kept");
    }

    #[test]
    fn test_malformed_payload_still_yields_a_message() {
        for value in [
            json!([1, 2, 3]),
            json!(42),
            json!(""),
            json!({ "body": { "fieldErrors": "not-a-map" } }),
            json!({ "body": { "pageErrors": [] } }),
        ] {
            let reduced = reduce_errors(&[payload(value)]);
            assert_eq!(reduced.len(), 1);
            assert!(!reduced[0].message.is_empty());
        }
    }
}
