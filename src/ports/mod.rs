//! Port interfaces (hexagonal architecture).
//!
//! These traits define the boundaries between the application core and
//! external systems. Adapters implement these ports; the reconciler depends
//! only on the traits so every dependency is injected and swappable in tests.

mod plan_catalog;
mod payment_provider;
mod subscription_repository;

pub use payment_provider::{PaymentError, PaymentProvider, ProviderPrice, ProviderSubscription};
pub use plan_catalog::PlanCatalog;
pub use subscription_repository::{StoreError, SubscriptionRepository, UpdateOutcome};
