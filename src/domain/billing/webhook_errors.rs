//! Webhook error types for Stripe webhook handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping. The endpoint is all-or-nothing per event:
//! every failure aborts the request with a 400 so Stripe's redelivery on
//! non-2xx drives recovery. Unrecognized events are not failures.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window (5 minutes).
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Event timestamp is in the future beyond clock skew tolerance.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from webhook event.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Required field missing from webhook payload.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No internal plan maps to the Stripe price on the checkout.
    #[error("No plan found for price {0}")]
    UnknownPrice(String),

    /// No local row matched the targeted stripe_subscription_id.
    /// Only surfaced under the `Reject` unmatched-target policy.
    #[error("No subscription found for {0}")]
    SubscriptionNotFound(String),

    /// Stripe API call failed while enriching the event.
    #[error("Payment provider error: {0}")]
    Provider(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Maps the error to an HTTP status code.
    ///
    /// Stripe retries delivery on any non-2xx, so every failure maps to 400.
    /// Recognized-but-ignored events never reach this path; they are
    /// acknowledged as successful outcomes upstream.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}
