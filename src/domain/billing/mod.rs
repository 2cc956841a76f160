//! Billing domain module.
//!
//! Mirrors a user's Stripe subscription state into a local record via
//! webhook reconciliation.
//!
//! # Module Structure
//!
//! - `subscription` - SubscriptionRecord and SubscriptionStatus
//! - `plan` - Plan pricing tier lookup record
//! - `stripe_event` - Event envelope and typed event payloads
//! - `webhook_verifier` - Signature verification for inbound webhooks
//! - `webhook_errors` - Error taxonomy with HTTP mapping

mod plan;
mod stripe_event;
mod subscription;
mod webhook_errors;
mod webhook_verifier;

pub use plan::Plan;
pub use stripe_event::{
    CheckoutSessionPayload, EventKind, InvoicePayload, StripeEvent, StripeEventData,
    SubscriptionPayload,
};
pub use subscription::{SubscriptionRecord, SubscriptionStatus};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{SignatureHeader, StripeWebhookVerifier};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
