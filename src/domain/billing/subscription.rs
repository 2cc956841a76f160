//! Subscription record - the locally persisted mirror of a user's billing state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription lifecycle status as reported by the payment processor.
///
/// The three states the reconciler acts on are modeled explicitly; any other
/// processor-defined value is passed through verbatim so the stored status
/// always reflects what Stripe reported, even for states we do not interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubscriptionStatus {
    /// Subscription is active and current.
    Active,
    /// Payment failed, grace period in effect.
    PastDue,
    /// Subscription has been canceled (soft-deleted locally).
    Canceled,
    /// Any other processor-defined status, stored verbatim.
    Other(String),
}

impl SubscriptionStatus {
    /// Parse a status string from Stripe. Never fails; unrecognized values
    /// are carried through as `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => Self::Active,
            "past_due" => Self::PastDue,
            "canceled" => Self::Canceled,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire/storage representation of this status.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for SubscriptionStatus {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<SubscriptionStatus> for String {
    fn from(status: SubscriptionStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The locally persisted subscription record, one row per user.
///
/// Created on the first successful `checkout.session.completed`, mutated by
/// later lifecycle events, and soft-deleted (status set to canceled) when the
/// external subscription ends. `user_id` is the upsert key at creation;
/// `stripe_subscription_id` is the join key for every later mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Owning identity; unique key for the upsert path. Immutable.
    pub user_id: Uuid,

    /// Internal plan resolved from the Stripe price at creation.
    pub plan_id: Uuid,

    /// Lifecycle status mirroring the processor's view.
    pub status: SubscriptionStatus,

    /// External customer identifier. Immutable after creation.
    pub stripe_customer_id: String,

    /// External subscription identifier; join key for all mutations.
    pub stripe_subscription_id: String,

    /// End of the current billing period; refreshed on every update event.
    pub current_period_end: DateTime<Utc>,

    /// Whether a pending cancellation takes effect at period end.
    pub cancel_at_period_end: bool,

    /// Bookkeeping timestamps.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// Build a fresh record for the creation upsert.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: Uuid,
        plan_id: Uuid,
        status: SubscriptionStatus,
        stripe_customer_id: impl Into<String>,
        stripe_subscription_id: impl Into<String>,
        current_period_end: DateTime<Utc>,
        cancel_at_period_end: bool,
    ) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            plan_id,
            status,
            stripe_customer_id: stripe_customer_id.into(),
            stripe_subscription_id: stripe_subscription_id.into(),
            current_period_end,
            cancel_at_period_end,
            created_at: now,
            updated_at: now,
        }
    }
}
