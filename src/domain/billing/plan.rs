//! Plan - internal pricing tier definition mapped to a Stripe price.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pricing tier row, read-only from the reconciler's perspective.
///
/// Plans are seeded out of band; the reconciler only resolves them by
/// external price identifier when creating a subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    /// Internal plan identifier.
    pub id: Uuid,

    /// Stripe price identifier (price_...) this plan maps to.
    pub stripe_price_id: String,

    /// Display name ("Pro Monthly" etc.). Not used by the reconciler.
    pub name: String,
}
