//! PostgreSQL implementation of ProductCatalog.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::DomainError;
use crate::ports::{Product, ProductCatalog};

/// PostgreSQL implementation of the ProductCatalog port.
pub struct PostgresProductCatalog {
    pool: PgPool,
}

impl PostgresProductCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    product_id: String,
}

#[async_trait]
impl ProductCatalog for PostgresProductCatalog {
    async fn find_by_product_id(&self, product_id: &str) -> Result<Option<Product>, DomainError> {
        let row: Option<ProductRow> = sqlx::query_as(
            r#"
            SELECT id, product_id FROM products WHERE product_id = $1
            "#,
        )
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to find product: {}", e)))?;

        Ok(row.map(|r| Product {
            id: r.id,
            product_id: r.product_id,
        }))
    }
}
