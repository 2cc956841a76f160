//! PostgreSQL adapter implementations.

mod plan_catalog;
mod subscription_repository;

pub use plan_catalog::PostgresPlanCatalog;
pub use subscription_repository::PostgresSubscriptionRepository;
