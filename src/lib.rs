//! Billhook - payment provider webhook ingestion and subscription billing.
//!
//! Receives at-least-once, unordered webhook deliveries from a payment
//! provider and drives a per-user subscription state machine behind an
//! idempotency ledger, so every delivery is applied exactly once.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
