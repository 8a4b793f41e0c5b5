//! Billing command handlers.

mod one_time_purchase;
mod process_webhook;

pub use one_time_purchase::OneTimePurchaseHandler;
pub use process_webhook::ProcessWebhookHandler;
