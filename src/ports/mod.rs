//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Billing Ports
//!
//! - `SubscriptionStore` - durable one-row-per-user subscription storage
//! - `ProcessedEventStore` - the idempotency ledger
//! - `PlanCatalog` / `ProductCatalog` - read-only catalog lookups
//! - `IdentityResolver` - customer email to user id
//! - `EntitlementStore` - one-time purchase grants
//! - `BillingNotifier` - fire-and-forget downstream notification

mod entitlement_store;
mod identity_resolver;
mod notifier;
mod plan_catalog;
mod processed_event_store;
mod product_catalog;
mod subscription_store;
pub mod testing;

pub use entitlement_store::EntitlementStore;
pub use identity_resolver::IdentityResolver;
pub use notifier::BillingNotifier;
pub use plan_catalog::PlanCatalog;
pub use processed_event_store::{ProcessedEvent, ProcessedEventStore, RecordOutcome};
pub use product_catalog::{Product, ProductCatalog};
pub use subscription_store::SubscriptionStore;
