//! Adapter implementations of the port interfaces.

pub mod http;
pub mod postgres;
pub mod stripe;
