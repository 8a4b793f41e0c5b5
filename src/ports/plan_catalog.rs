//! PlanCatalog port - read-only plan lookups by provider offer id.

use async_trait::async_trait;

use crate::domain::billing::Plan;
use crate::domain::foundation::DomainError;

/// Read-only catalog mapping provider offer identifiers to plans.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Find the plan whose monthly or annual offer id matches.
    async fn find_by_offer_id(&self, offer_id: &str) -> Result<Option<Plan>, DomainError>;
}
