//! Shared constants for the explorer core.

/// Push channel carrying account change events.
pub const ACCOUNT_CHANGE_CHANNEL: &str = "/data/AccountChangeEvent";

/// Push channel carrying order change events.
pub const ORDER_CHANGE_CHANNEL: &str = "/data/OrderChangeEvent";

/// Replay marker: deliver only events published after the subscription.
pub const REPLAY_NEW_EVENTS: i64 = -1;

/// Title used for every data-load failure notification.
pub const ERROR_NOTIFICATION_TITLE: &str = "Error loading data";

/// Fixed suffix appended to every failure notification.
pub const CONTACT_ADMIN_MESSAGE: &str =
    "Contact your system administrator if the problem persists.";
