//! Skillpath Billing - Stripe subscription webhook reconciliation.
//!
//! This crate keeps the local subscription record consistent with Stripe's
//! view of truth by processing signed webhook events.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
