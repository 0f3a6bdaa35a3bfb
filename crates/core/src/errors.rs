//! Error types for the explorer core.
//!
//! Remote query failures are not represented here: the query layer reports
//! them as opaque payloads (see `remote::ErrorPayload`) that go through the
//! notification reducer instead of the type system. This module covers the
//! push transport boundary, the one place the core itself can fail.

use thiserror::Error;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The transport refused or failed to establish a channel subscription.
    #[error("Failed to subscribe to {channel}: {reason}")]
    SubscriptionFailed { channel: String, reason: String },

    /// Channel-level transport fault (teardown failure, delivery fault).
    #[error("Push transport error: {0}")]
    Transport(String),
}
