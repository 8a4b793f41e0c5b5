//! PostgreSQL adapters - database implementations of the billing ports.

mod entitlement_store;
mod identity_resolver;
mod plan_catalog;
mod processed_event_store;
mod product_catalog;
mod subscription_store;

pub use entitlement_store::PostgresEntitlementStore;
pub use identity_resolver::PostgresIdentityResolver;
pub use plan_catalog::PostgresPlanCatalog;
pub use processed_event_store::PostgresProcessedEventStore;
pub use product_catalog::PostgresProductCatalog;
pub use subscription_store::PostgresSubscriptionStore;
