//! Notification adapters.

mod queued_notifier;

pub use queued_notifier::{BillingNotification, QueuedNotifier};
