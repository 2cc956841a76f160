//! Stripe REST API client.

use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

use super::objects::{StripePrice, StripeSubscription};
use crate::ports::{PaymentError, PaymentProvider, ProviderPrice, ProviderSubscription};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Stripe API client implementing the payment provider port.
///
/// Authenticates with the secret API key via HTTP basic auth, as the Stripe
/// REST API expects. The base URL is overridable so tests can point at a
/// local stub.
pub struct StripeClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl StripeClient {
    pub fn new(api_key: SecretString, base_url: Option<String>) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, PaymentError> {
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .basic_auth(self.api_key.expose_secret(), None::<&str>)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(PaymentError::NotFound(path.to_string())),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%status, path, "Stripe API request failed");
                Err(PaymentError::ApiError(format!("{}: {}", status, body)))
            }
            _ => response
                .json::<T>()
                .await
                .map_err(|e| PaymentError::InvalidResponse(e.to_string())),
        }
    }
}

#[async_trait]
impl PaymentProvider for StripeClient {
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<ProviderSubscription, PaymentError> {
        let subscription: StripeSubscription =
            self.get(&format!("subscriptions/{}", subscription_id)).await?;
        Ok(subscription.into())
    }

    async fn retrieve_price(&self, price_id: &str) -> Result<ProviderPrice, PaymentError> {
        let price: StripePrice = self.get(&format!("prices/{}", price_id)).await?;
        Ok(price.into())
    }
}
