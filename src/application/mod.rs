//! Application layer: use case orchestration over the ports.

mod reconciler;

pub use reconciler::{ReconcileOutcome, UnmatchedTargetPolicy, WebhookReconciler};
