//! ProductCatalog port - one-time-purchase product lookups.
//!
//! The one-time-purchase path is the simpler sibling of the subscription
//! path: events whose product id matches this catalog grant or revoke a
//! single service entitlement instead of driving the subscription state
//! machine.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::DomainError;

/// A one-time-purchase product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Internal product slug.
    pub id: String,
    /// Provider-side product identifier.
    pub product_id: String,
}

/// Read-only catalog keyed on the provider's product id.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_product_id(&self, product_id: &str)
        -> Result<Option<Product>, DomainError>;
}
