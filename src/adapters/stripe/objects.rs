//! Raw Stripe API response shapes.
//!
//! Deserialization targets for the REST responses; only the fields the
//! reconciler consumes are declared, everything else is ignored.

use serde::Deserialize;

use crate::ports::{ProviderPrice, ProviderSubscription};

/// Stripe list container (`{"object": "list", "data": [...]}`).
#[derive(Debug, Deserialize)]
pub struct StripeList<T> {
    pub data: Vec<T>,
}

/// `GET /v1/subscriptions/{id}` response.
#[derive(Debug, Deserialize)]
pub struct StripeSubscription {
    pub id: String,
    pub customer: String,
    pub status: String,
    pub current_period_end: i64,
    #[serde(default)]
    pub cancel_at_period_end: bool,
    pub items: StripeList<StripeSubscriptionItem>,
}

#[derive(Debug, Deserialize)]
pub struct StripeSubscriptionItem {
    pub price: StripePriceRef,
}

#[derive(Debug, Deserialize)]
pub struct StripePriceRef {
    pub id: String,
}

impl From<StripeSubscription> for ProviderSubscription {
    fn from(sub: StripeSubscription) -> Self {
        let price_id = sub.items.data.first().map(|item| item.price.id.clone());
        ProviderSubscription {
            id: sub.id,
            customer_id: sub.customer,
            status: sub.status,
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
            price_id,
        }
    }
}

/// `GET /v1/prices/{id}` response.
#[derive(Debug, Deserialize)]
pub struct StripePrice {
    pub id: String,
    pub product: String,
    pub active: bool,
}

impl From<StripePrice> for ProviderPrice {
    fn from(price: StripePrice) -> Self {
        ProviderPrice {
            id: price.id,
            product_id: price.product,
            active: price.active,
        }
    }
}
