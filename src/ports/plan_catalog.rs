//! Plan catalog port.

use async_trait::async_trait;

use super::subscription_repository::StoreError;
use crate::domain::billing::Plan;

/// Read-only lookup of internal plans by their external price identifier.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Resolves the plan mapped to a Stripe price, if one exists.
    async fn find_by_price_id(&self, stripe_price_id: &str) -> Result<Option<Plan>, StoreError>;
}
