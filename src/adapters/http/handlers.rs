//! HTTP handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use super::routes::BillingAppState;
use crate::application::ReconcileOutcome;

/// Liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

/// Stripe webhook endpoint.
///
/// Takes the raw body bytes; the signature covers the exact bytes Stripe
/// sent, so the body must not pass through any JSON extractor first.
pub async fn stripe_webhook(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers
        .get("Stripe-Signature")
        .and_then(|value| value.to_str().ok())
    else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Missing Stripe-Signature header"})),
        )
            .into_response();
    };

    match state.reconciler.process(&body, signature).await {
        Ok(outcome) => {
            if let ReconcileOutcome::Acknowledged(reason) = &outcome {
                tracing::debug!(reason = %reason, "Webhook acknowledged without action");
            }
            (StatusCode::OK, Json(json!({"received": true}))).into_response()
        }
        Err(err) => {
            tracing::warn!(error = %err, "Webhook rejected");
            (err.status_code(), Json(json!({"error": err.to_string()}))).into_response()
        }
    }
}
