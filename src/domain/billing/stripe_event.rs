//! Stripe webhook event types.
//!
//! Defines the event envelope and the typed per-event payloads. Dispatch is
//! over a sum type: [`StripeEvent::classify`] turns the string-tagged envelope
//! into an [`EventKind`] variant carrying the payload that transition needs.
//! Only fields relevant to reconciliation are captured.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::webhook_errors::WebhookError;

/// Stripe webhook event envelope (simplified).
///
/// Contains the essential fields needed for webhook processing.
/// Additional fields from Stripe's full event schema are ignored.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEvent {
    /// Unique identifier for the event (evt_xxx format).
    pub id: String,

    /// Type of event (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Time at which the event was created (Unix timestamp).
    pub created: i64,

    /// Object containing event-specific data.
    pub data: StripeEventData,

    /// Whether this is a live mode event (vs test mode).
    pub livemode: bool,

    /// API version used to render this event.
    pub api_version: Option<String>,
}

/// Container for event-specific data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeEventData {
    /// The object that triggered the event (polymorphic based on event type).
    pub object: serde_json::Value,

    /// Previous values for updated attributes (only for update events).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_attributes: Option<serde_json::Value>,
}

impl StripeEvent {
    /// Returns true if this is a live mode event.
    pub fn is_live(&self) -> bool {
        self.livemode
    }

    /// Classify the envelope into a typed event variant.
    ///
    /// Recognized event types get their payload deserialized into the shape
    /// the corresponding transition needs; anything else becomes
    /// `Unrecognized` and is acknowledged without action.
    pub fn classify(&self) -> Result<EventKind, WebhookError> {
        match self.event_type.as_str() {
            "checkout.session.completed" => Ok(EventKind::CheckoutCompleted(self.payload()?)),
            "customer.subscription.updated" => Ok(EventKind::SubscriptionUpdated(self.payload()?)),
            "customer.subscription.deleted" => Ok(EventKind::SubscriptionDeleted(self.payload()?)),
            "invoice.payment_succeeded" => Ok(EventKind::PaymentSucceeded(self.payload()?)),
            "invoice.payment_failed" => Ok(EventKind::PaymentFailed(self.payload()?)),
            other => Ok(EventKind::Unrecognized(other.to_string())),
        }
    }

    fn payload<T: serde::de::DeserializeOwned>(&self) -> Result<T, WebhookError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            WebhookError::ParseError(format!(
                "invalid {} payload: {}",
                self.event_type, e
            ))
        })
    }
}

/// A recognized webhook event with its typed payload.
///
/// Each variant maps to exactly one state transition on the subscription
/// store; `Unrecognized` maps to an acknowledged no-op.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// A checkout finished; create the subscription record.
    CheckoutCompleted(CheckoutSessionPayload),
    /// Subscription state changed; overwrite status, period end, cancel flag.
    SubscriptionUpdated(SubscriptionPayload),
    /// Subscription ended; soft-delete (status = canceled).
    SubscriptionDeleted(SubscriptionPayload),
    /// An invoice was paid; mark the referenced subscription active.
    PaymentSucceeded(InvoicePayload),
    /// An invoice payment failed; mark the referenced subscription past due.
    PaymentFailed(InvoicePayload),
    /// Event type we do not act on; acknowledged and logged.
    Unrecognized(String),
}

/// Checkout session fields used by the creation transition.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CheckoutSessionPayload {
    /// Session identifier (cs_...).
    pub id: String,

    /// Customer attached during checkout.
    pub customer: Option<String>,

    /// Subscription the checkout created, retrieved in full before persisting.
    pub subscription: Option<String>,

    /// Custom metadata; must carry the owning `user_id`.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Subscription fields used by the update and delete transitions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubscriptionPayload {
    /// Subscription identifier (sub_...).
    pub id: String,

    /// Owning customer (cus_...).
    pub customer: String,

    /// Lifecycle status string, passed through verbatim.
    pub status: String,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: i64,

    /// Whether cancellation is pending at period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Invoice fields used by the payment-succeeded/failed transitions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvoicePayload {
    /// Invoice identifier (in_...).
    pub id: String,

    /// Subscription the invoice bills, if any. Absent for one-off invoices,
    /// in which case the event is an acknowledged no-op.
    pub subscription: Option<String>,
}

/// Builder for creating test StripeEvent instances.
#[cfg(test)]
pub struct StripeEventBuilder {
    id: String,
    event_type: String,
    created: i64,
    object: serde_json::Value,
    livemode: bool,
}

#[cfg(test)]
impl Default for StripeEventBuilder {
    fn default() -> Self {
        Self {
            id: "evt_test_123".to_string(),
            event_type: "checkout.session.completed".to_string(),
            created: chrono::Utc::now().timestamp(),
            object: serde_json::json!({}),
            livemode: false,
        }
    }
}

#[cfg(test)]
impl StripeEventBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = event_type.into();
        self
    }

    pub fn object(mut self, object: serde_json::Value) -> Self {
        self.object = object;
        self
    }

    pub fn livemode(mut self, livemode: bool) -> Self {
        self.livemode = livemode;
        self
    }

    pub fn build(self) -> StripeEvent {
        StripeEvent {
            id: self.id,
            event_type: self.event_type,
            created: self.created,
            data: StripeEventData {
                object: self.object,
                previous_attributes: None,
            },
            livemode: self.livemode,
            api_version: Some("2023-10-16".to_string()),
        }
    }
}
