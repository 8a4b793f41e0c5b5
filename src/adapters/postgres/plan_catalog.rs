//! PostgreSQL implementation of PlanCatalog.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::billing::Plan;
use crate::domain::foundation::{DomainError, PlanId};
use crate::ports::PlanCatalog;

/// PostgreSQL implementation of the PlanCatalog port.
///
/// Plans are reference data maintained by operators; lookups match either
/// the monthly or the annual offer identifier.
pub struct PostgresPlanCatalog {
    pool: PgPool,
}

impl PostgresPlanCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: String,
    offer_id_monthly: Option<String>,
    offer_id_annual: Option<String>,
}

impl TryFrom<PlanRow> for Plan {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let id = PlanId::new(&row.id)?;
        Ok(Plan {
            id,
            offer_id_monthly: row.offer_id_monthly,
            offer_id_annual: row.offer_id_annual,
        })
    }
}

#[async_trait]
impl PlanCatalog for PostgresPlanCatalog {
    async fn find_by_offer_id(&self, offer_id: &str) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, offer_id_monthly, offer_id_annual
            FROM plans
            WHERE offer_id_monthly = $1 OR offer_id_annual = $1
            "#,
        )
        .bind(offer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find plan: {}", e)))?;

        row.map(Plan::try_from).transpose()
    }
}
