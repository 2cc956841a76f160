//! Subscription repository port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::billing::{SubscriptionRecord, SubscriptionStatus};

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Result of a targeted update.
///
/// Targeted transitions address rows by `stripe_subscription_id`; whether a
/// miss is an error is a policy decision made by the caller, so the store
/// reports the outcome instead of deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Exactly one row was updated.
    Applied,
    /// No row matched the target identifier.
    NoMatch,
}

/// Persistence port for subscription records.
///
/// One row per user; creation is an upsert keyed on `user_id` so webhook
/// redelivery converges instead of duplicating rows.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Inserts the record, or overwrites the existing row for the same user.
    async fn upsert_by_user_id(&self, record: &SubscriptionRecord) -> Result<(), StoreError>;

    /// Overwrites status, period end, and cancellation flag on the row
    /// matching the Stripe subscription identifier.
    async fn apply_subscription_state(
        &self,
        stripe_subscription_id: &str,
        status: &SubscriptionStatus,
        current_period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Soft-delete: sets status to canceled, leaving all other fields intact.
    async fn mark_canceled(&self, stripe_subscription_id: &str)
        -> Result<UpdateOutcome, StoreError>;

    /// Sets only the status on the row matching the Stripe subscription
    /// identifier.
    async fn set_status(
        &self,
        stripe_subscription_id: &str,
        status: &SubscriptionStatus,
    ) -> Result<UpdateOutcome, StoreError>;
}
