//! Route definitions for the billing service.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use super::handlers;
use crate::application::WebhookReconciler;

/// Shared state injected into every handler.
#[derive(Clone)]
pub struct BillingAppState {
    pub reconciler: Arc<WebhookReconciler>,
}

/// Builds the billing router.
pub fn billing_routes(state: BillingAppState) -> Router {
    Router::new()
        .route("/api/webhooks/stripe", post(handlers::stripe_webhook))
        .route("/health", get(handlers::health))
        .with_state(state)
}
