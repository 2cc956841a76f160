//! PostgreSQL implementation of the subscription repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{SubscriptionRecord, SubscriptionStatus};
use crate::ports::{StoreError, SubscriptionRepository, UpdateOutcome};

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn outcome(rows_affected: u64) -> UpdateOutcome {
    if rows_affected > 0 {
        UpdateOutcome::Applied
    } else {
        UpdateOutcome::NoMatch
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn upsert_by_user_id(&self, record: &SubscriptionRecord) -> Result<(), StoreError> {
        // created_at survives the conflict update so the row keeps its
        // original creation time across redeliveries.
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                user_id, plan_id, status, stripe_customer_id,
                stripe_subscription_id, current_period_end,
                cancel_at_period_end, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (user_id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                status = EXCLUDED.status,
                stripe_customer_id = EXCLUDED.stripe_customer_id,
                stripe_subscription_id = EXCLUDED.stripe_subscription_id,
                current_period_end = EXCLUDED.current_period_end,
                cancel_at_period_end = EXCLUDED.cancel_at_period_end,
                updated_at = NOW()
            "#,
        )
        .bind(record.user_id)
        .bind(record.plan_id)
        .bind(record.status.as_str())
        .bind(&record.stripe_customer_id)
        .bind(&record.stripe_subscription_id)
        .bind(record.current_period_end)
        .bind(record.cancel_at_period_end)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn apply_subscription_state(
        &self,
        stripe_subscription_id: &str,
        status: &SubscriptionStatus,
        current_period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2,
                current_period_end = $3,
                cancel_at_period_end = $4,
                updated_at = NOW()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .bind(status.as_str())
        .bind(current_period_end)
        .bind(cancel_at_period_end)
        .execute(&self.pool)
        .await?;

        Ok(outcome(result.rows_affected()))
    }

    async fn mark_canceled(
        &self,
        stripe_subscription_id: &str,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'canceled', updated_at = NOW()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .execute(&self.pool)
        .await?;

        Ok(outcome(result.rows_affected()))
    }

    async fn set_status(
        &self,
        stripe_subscription_id: &str,
        status: &SubscriptionStatus,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2, updated_at = NOW()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(outcome(result.rows_affected()))
    }
}
