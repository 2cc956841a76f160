//! PostgreSQL implementation of the plan catalog.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::billing::Plan;
use crate::ports::{PlanCatalog, StoreError};

pub struct PostgresPlanCatalog {
    pool: PgPool,
}

impl PostgresPlanCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlanCatalog for PostgresPlanCatalog {
    async fn find_by_price_id(&self, stripe_price_id: &str) -> Result<Option<Plan>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, stripe_price_id, name
            FROM plans
            WHERE stripe_price_id = $1
            "#,
        )
        .bind(stripe_price_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Plan {
            id: row.get("id"),
            stripe_price_id: row.get("stripe_price_id"),
            name: row.get("name"),
        }))
    }
}
