//! HTTP adapter: axum routes and handlers.

mod handlers;
mod routes;

pub use routes::{billing_routes, BillingAppState};
