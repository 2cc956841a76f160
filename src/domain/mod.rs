//! Domain layer containing business logic and domain types.

pub mod billing;
