//! Orderlens Core - cascading account/order drill-down explorer.
//!
//! Selecting an account narrows the eligible payment-due months, which in
//! turn scope the order list. Cached results stay fresh under push-driven
//! change events, and every remote failure is reduced to one
//! user-presentable notification.
//!
//! The host supplies the remote query client, the push transport, and the
//! rendering sinks; this crate owns the cascade rules, the parameter-keyed
//! caches, and the ordering guarantee between overlapping fetches (for any
//! node, the value shown is always the one from the last issued request,
//! whatever order the responses arrive in).

pub mod constants;
pub mod context;
pub mod errors;
pub mod events;
pub mod explorer;
pub mod notifications;
pub mod remote;

// Re-export the types a host needs to wire the explorer
pub use context::ExplorerContext;
pub use errors::{Error, Result};
pub use events::{ChangeEvent, ChangeEventSubscriber, PushTransport, SubscriptionHandle};
pub use explorer::{
    ExplorerService, ExplorerSnapshot, NodePhase, NodeSnapshot, SnapshotSink,
};
pub use notifications::{
    ErrorKind, Notification, NormalizedError, NotificationSink, Severity,
};
pub use remote::{ErrorPayload, OrderQueryClient, OrderRecord, PicklistOption};
