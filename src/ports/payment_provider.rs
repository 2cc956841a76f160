//! Payment provider port for Stripe API operations.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from payment provider operations.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The requested object does not exist at the provider.
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Provider rejected the request.
    #[error("Provider API error: {0}")]
    ApiError(String),

    /// Network failure communicating with the provider.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Provider returned a response we could not interpret.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Subscription state as reported by the provider.
///
/// Retrieved in full when a checkout completes; the session payload alone
/// does not carry period or price information.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSubscription {
    /// Subscription identifier (sub_...).
    pub id: String,
    /// Owning customer (cus_...).
    pub customer_id: String,
    /// Lifecycle status string, verbatim.
    pub status: String,
    /// Current billing period end (Unix timestamp).
    pub current_period_end: i64,
    /// Whether cancellation is pending at period end.
    pub cancel_at_period_end: bool,
    /// Price on the first subscription item, if any.
    pub price_id: Option<String>,
}

/// Price object as reported by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPrice {
    /// Price identifier (price_...).
    pub id: String,
    /// Product the price belongs to.
    pub product_id: String,
    /// Whether the price is currently purchasable.
    pub active: bool,
}

/// Port for read operations against the payment provider's API.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Retrieves the current state of a subscription.
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, PaymentError>;

    /// Retrieves a price object.
    async fn retrieve_price(&self, price_id: &str) -> Result<ProviderPrice, PaymentError>;
}
