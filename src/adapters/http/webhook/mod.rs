//! HTTP adapter for inbound provider webhooks.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::WebhookAppState;
pub use routes::webhook_router;
