//! Remote query service boundary.
//!
//! Defines the [`OrderQueryClient`] trait consumed by the explorer and the
//! wire models its endpoints return. Concrete clients live with the host.

pub mod client;
pub mod model;

pub use client::{ErrorPayload, OrderQueryClient, QueryResult};
pub use model::{OrderRecord, PicklistOption};
