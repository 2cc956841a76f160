//! Stripe API adapter.

mod client;
mod objects;

pub use client::StripeClient;
