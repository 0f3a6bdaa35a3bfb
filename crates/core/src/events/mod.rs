//! Push-driven invalidation.
//!
//! The [`PushTransport`] trait is the boundary to the external notification
//! channel; [`ChangeEventSubscriber`] owns the subscriptions and maps each
//! delivered message to the explorer refresh it invalidates.

pub mod change_event;
pub mod subscriber;
pub mod transport;

pub use change_event::ChangeEvent;
pub use subscriber::ChangeEventSubscriber;
pub use transport::{FaultHandler, MessageHandler, PushTransport, SubscriptionHandle};
