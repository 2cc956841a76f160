//! Webhook reconciler: applies Stripe subscription events to the local store.
//!
//! Each recognized event maps to exactly one state transition. Processing is
//! all-or-nothing per event; any failure surfaces as an error and the caller
//! rejects the delivery so Stripe retries it. There is no delivered-event
//! log: every transition is idempotent (upsert on create, absolute overwrites
//! elsewhere), so at-least-once delivery converges on redelivery.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::billing::{
    CheckoutSessionPayload, EventKind, InvoicePayload, StripeWebhookVerifier, SubscriptionPayload,
    SubscriptionRecord, SubscriptionStatus, WebhookError,
};
use crate::ports::{
    PaymentError, PaymentProvider, PlanCatalog, StoreError, SubscriptionRepository, UpdateOutcome,
};

impl From<PaymentError> for WebhookError {
    fn from(err: PaymentError) -> Self {
        WebhookError::Provider(err.to_string())
    }
}

impl From<StoreError> for WebhookError {
    fn from(err: StoreError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

/// What to do when a targeted update matches no local row.
///
/// Events can arrive for subscriptions created before this service existed,
/// or races can deliver an update before the creating checkout lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnmatchedTargetPolicy {
    /// Acknowledge and log; the delivery is considered handled.
    #[default]
    Ignore,
    /// Reject the delivery so the provider redelivers it later.
    Reject,
}

/// Result of successfully processing one webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// Subscription record created (or overwritten) for the user.
    Created { user_id: Uuid },
    /// Subscription state overwritten from an update event.
    Updated,
    /// Subscription soft-deleted.
    Canceled,
    /// Subscription marked active after a successful invoice payment.
    MarkedActive,
    /// Subscription marked past due after a failed invoice payment.
    MarkedPastDue,
    /// Nothing to do; acknowledged with the stated reason.
    Acknowledged(String),
}

/// Orchestrates webhook verification, dispatch, and persistence.
///
/// All collaborators are injected; nothing here touches process globals.
pub struct WebhookReconciler {
    verifier: StripeWebhookVerifier,
    provider: Arc<dyn PaymentProvider>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    plans: Arc<dyn PlanCatalog>,
    unmatched_policy: UnmatchedTargetPolicy,
}

impl WebhookReconciler {
    pub fn new(
        verifier: StripeWebhookVerifier,
        provider: Arc<dyn PaymentProvider>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        plans: Arc<dyn PlanCatalog>,
        unmatched_policy: UnmatchedTargetPolicy,
    ) -> Self {
        Self {
            verifier,
            provider,
            subscriptions,
            plans,
            unmatched_policy,
        }
    }

    /// Verifies the delivery and applies the transition it describes.
    ///
    /// The signature covers the raw body bytes; verification happens before
    /// any payload interpretation.
    pub async fn process(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let event = self.verifier.verify_and_parse(payload, signature_header)?;

        tracing::info!(
            event_id = %event.id,
            event_type = %event.event_type,
            livemode = event.livemode,
            "Processing webhook event"
        );

        match event.classify()? {
            EventKind::CheckoutCompleted(session) => self.handle_checkout_completed(session).await,
            EventKind::SubscriptionUpdated(sub) => self.handle_subscription_updated(sub).await,
            EventKind::SubscriptionDeleted(sub) => self.handle_subscription_deleted(sub).await,
            EventKind::PaymentSucceeded(invoice) => {
                self.handle_invoice(invoice, SubscriptionStatus::Active).await
            }
            EventKind::PaymentFailed(invoice) => {
                self.handle_invoice(invoice, SubscriptionStatus::PastDue).await
            }
            EventKind::Unrecognized(event_type) => {
                tracing::info!(event_type = %event_type, "Ignoring unhandled event type");
                Ok(ReconcileOutcome::Acknowledged(format!(
                    "unhandled event type: {}",
                    event_type
                )))
            }
        }
    }

    /// Creation path. The session payload only carries identifiers, so the
    /// current subscription and price are fetched from the provider before
    /// resolving the internal plan and upserting.
    async fn handle_checkout_completed(
        &self,
        session: CheckoutSessionPayload,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let user_id = session
            .metadata
            .get("user_id")
            .ok_or(WebhookError::MissingMetadata("user_id"))?;
        let user_id = Uuid::parse_str(user_id)
            .map_err(|_| WebhookError::ParseError("metadata user_id is not a UUID".to_string()))?;

        let subscription_id = session
            .subscription
            .as_deref()
            .ok_or(WebhookError::MissingField("subscription"))?;

        let subscription = self.provider.retrieve_subscription(subscription_id).await?;

        let price_id = subscription
            .price_id
            .as_deref()
            .ok_or(WebhookError::MissingField("price"))?;
        let price = self.provider.retrieve_price(price_id).await?;

        let plan = self
            .plans
            .find_by_price_id(&price.id)
            .await?
            .ok_or_else(|| WebhookError::UnknownPrice(price.id.clone()))?;

        let record = SubscriptionRecord::new(
            user_id,
            plan.id,
            SubscriptionStatus::parse(&subscription.status),
            subscription.customer_id.clone(),
            subscription.id.clone(),
            epoch_to_datetime(subscription.current_period_end)?,
            subscription.cancel_at_period_end,
        );

        self.subscriptions.upsert_by_user_id(&record).await?;

        tracing::info!(
            user_id = %user_id,
            plan_id = %plan.id,
            stripe_subscription_id = %subscription.id,
            "Subscription created from checkout"
        );

        Ok(ReconcileOutcome::Created { user_id })
    }

    async fn handle_subscription_updated(
        &self,
        sub: SubscriptionPayload,
    ) -> Result<ReconcileOutcome, WebhookError> {
        let status = SubscriptionStatus::parse(&sub.status);
        let period_end = epoch_to_datetime(sub.current_period_end)?;

        let outcome = self
            .subscriptions
            .apply_subscription_state(&sub.id, &status, period_end, sub.cancel_at_period_end)
            .await?;

        match outcome {
            UpdateOutcome::Applied => {
                tracing::info!(stripe_subscription_id = %sub.id, status = %status, "Subscription updated");
                Ok(ReconcileOutcome::Updated)
            }
            UpdateOutcome::NoMatch => self.unmatched(&sub.id),
        }
    }

    async fn handle_subscription_deleted(
        &self,
        sub: SubscriptionPayload,
    ) -> Result<ReconcileOutcome, WebhookError> {
        match self.subscriptions.mark_canceled(&sub.id).await? {
            UpdateOutcome::Applied => {
                tracing::info!(stripe_subscription_id = %sub.id, "Subscription canceled");
                Ok(ReconcileOutcome::Canceled)
            }
            UpdateOutcome::NoMatch => self.unmatched(&sub.id),
        }
    }

    async fn handle_invoice(
        &self,
        invoice: InvoicePayload,
        status: SubscriptionStatus,
    ) -> Result<ReconcileOutcome, WebhookError> {
        // One-off invoices carry no subscription and need no action.
        let Some(subscription_id) = invoice.subscription.as_deref() else {
            tracing::info!(invoice_id = %invoice.id, "Invoice has no subscription, nothing to do");
            return Ok(ReconcileOutcome::Acknowledged(
                "invoice without subscription".to_string(),
            ));
        };

        match self.subscriptions.set_status(subscription_id, &status).await? {
            UpdateOutcome::Applied => {
                tracing::info!(
                    stripe_subscription_id = %subscription_id,
                    status = %status,
                    "Subscription status set from invoice event"
                );
                Ok(match status {
                    SubscriptionStatus::PastDue => ReconcileOutcome::MarkedPastDue,
                    _ => ReconcileOutcome::MarkedActive,
                })
            }
            UpdateOutcome::NoMatch => self.unmatched(subscription_id),
        }
    }

    fn unmatched(&self, stripe_subscription_id: &str) -> Result<ReconcileOutcome, WebhookError> {
        match self.unmatched_policy {
            UnmatchedTargetPolicy::Ignore => {
                tracing::warn!(
                    stripe_subscription_id = %stripe_subscription_id,
                    "No local subscription matched event target, acknowledging"
                );
                Ok(ReconcileOutcome::Acknowledged(format!(
                    "no subscription matched {}",
                    stripe_subscription_id
                )))
            }
            UnmatchedTargetPolicy::Reject => Err(WebhookError::SubscriptionNotFound(
                stripe_subscription_id.to_string(),
            )),
        }
    }
}

fn epoch_to_datetime(secs: i64) -> Result<DateTime<Utc>, WebhookError> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| WebhookError::ParseError(format!("invalid timestamp: {}", secs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{compute_test_signature, Plan};
    use crate::ports::{ProviderPrice, ProviderSubscription};
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const TEST_SECRET: &str = "whsec_reconciler_test";
    const USER_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    struct MockProvider {
        subscription: Option<ProviderSubscription>,
        price: Option<ProviderPrice>,
    }

    impl MockProvider {
        fn empty() -> Self {
            Self {
                subscription: None,
                price: None,
            }
        }

        fn with_subscription() -> Self {
            Self {
                subscription: Some(ProviderSubscription {
                    id: "sub_123".to_string(),
                    customer_id: "cus_123".to_string(),
                    status: "active".to_string(),
                    current_period_end: 1767225600,
                    cancel_at_period_end: false,
                    price_id: Some("price_pro".to_string()),
                }),
                price: Some(ProviderPrice {
                    id: "price_pro".to_string(),
                    product_id: "prod_1".to_string(),
                    active: true,
                }),
            }
        }
    }

    #[async_trait]
    impl PaymentProvider for MockProvider {
        async fn retrieve_subscription(
            &self,
            subscription_id: &str,
        ) -> Result<ProviderSubscription, PaymentError> {
            self.subscription
                .clone()
                .ok_or_else(|| PaymentError::NotFound(subscription_id.to_string()))
        }

        async fn retrieve_price(&self, price_id: &str) -> Result<ProviderPrice, PaymentError> {
            self.price
                .clone()
                .ok_or_else(|| PaymentError::NotFound(price_id.to_string()))
        }
    }

    #[derive(Default)]
    struct InMemoryRepo {
        // keyed by user_id
        rows: Mutex<HashMap<Uuid, SubscriptionRecord>>,
    }

    impl InMemoryRepo {
        fn seeded(record: SubscriptionRecord) -> Self {
            let repo = Self::default();
            repo.rows.lock().unwrap().insert(record.user_id, record);
            repo
        }

        fn get(&self, user_id: Uuid) -> Option<SubscriptionRecord> {
            self.rows.lock().unwrap().get(&user_id).cloned()
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SubscriptionRepository for InMemoryRepo {
        async fn upsert_by_user_id(&self, record: &SubscriptionRecord) -> Result<(), StoreError> {
            self.rows
                .lock()
                .unwrap()
                .insert(record.user_id, record.clone());
            Ok(())
        }

        async fn apply_subscription_state(
            &self,
            stripe_subscription_id: &str,
            status: &SubscriptionStatus,
            current_period_end: chrono::DateTime<Utc>,
            cancel_at_period_end: bool,
        ) -> Result<UpdateOutcome, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            for record in rows.values_mut() {
                if record.stripe_subscription_id == stripe_subscription_id {
                    record.status = status.clone();
                    record.current_period_end = current_period_end;
                    record.cancel_at_period_end = cancel_at_period_end;
                    record.updated_at = Utc::now();
                    return Ok(UpdateOutcome::Applied);
                }
            }
            Ok(UpdateOutcome::NoMatch)
        }

        async fn mark_canceled(
            &self,
            stripe_subscription_id: &str,
        ) -> Result<UpdateOutcome, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            for record in rows.values_mut() {
                if record.stripe_subscription_id == stripe_subscription_id {
                    record.status = SubscriptionStatus::Canceled;
                    record.updated_at = Utc::now();
                    return Ok(UpdateOutcome::Applied);
                }
            }
            Ok(UpdateOutcome::NoMatch)
        }

        async fn set_status(
            &self,
            stripe_subscription_id: &str,
            status: &SubscriptionStatus,
        ) -> Result<UpdateOutcome, StoreError> {
            let mut rows = self.rows.lock().unwrap();
            for record in rows.values_mut() {
                if record.stripe_subscription_id == stripe_subscription_id {
                    record.status = status.clone();
                    record.updated_at = Utc::now();
                    return Ok(UpdateOutcome::Applied);
                }
            }
            Ok(UpdateOutcome::NoMatch)
        }
    }

    struct StaticCatalog {
        plan: Option<Plan>,
    }

    #[async_trait]
    impl PlanCatalog for StaticCatalog {
        async fn find_by_price_id(
            &self,
            stripe_price_id: &str,
        ) -> Result<Option<Plan>, StoreError> {
            Ok(self
                .plan
                .clone()
                .filter(|p| p.stripe_price_id == stripe_price_id))
        }
    }

    fn pro_plan() -> Plan {
        Plan {
            id: Uuid::parse_str("11111111-2222-3333-4444-555555555555").unwrap(),
            stripe_price_id: "price_pro".to_string(),
            name: "Pro Monthly".to_string(),
        }
    }

    fn seeded_record() -> SubscriptionRecord {
        SubscriptionRecord::new(
            Uuid::parse_str(USER_ID).unwrap(),
            pro_plan().id,
            SubscriptionStatus::Active,
            "cus_123".to_string(),
            "sub_123".to_string(),
            chrono::DateTime::from_timestamp(1767225600, 0).unwrap(),
            false,
        )
    }

    struct Harness {
        reconciler: WebhookReconciler,
        repo: Arc<InMemoryRepo>,
    }

    fn harness(provider: MockProvider, repo: InMemoryRepo, policy: UnmatchedTargetPolicy) -> Harness {
        let repo = Arc::new(repo);
        let reconciler = WebhookReconciler::new(
            StripeWebhookVerifier::new(TEST_SECRET),
            Arc::new(provider),
            repo.clone(),
            Arc::new(StaticCatalog {
                plan: Some(pro_plan()),
            }),
            policy,
        );
        Harness { reconciler, repo }
    }

    fn signed(payload: &str) -> String {
        let timestamp = Utc::now().timestamp();
        format!(
            "t={},v1={}",
            timestamp,
            compute_test_signature(TEST_SECRET, timestamp, payload)
        )
    }

    fn event_json(event_type: &str, object: serde_json::Value) -> String {
        json!({
            "id": "evt_test",
            "type": event_type,
            "created": Utc::now().timestamp(),
            "data": {"object": object},
            "livemode": false,
            "api_version": "2023-10-16"
        })
        .to_string()
    }

    fn checkout_event() -> String {
        event_json(
            "checkout.session.completed",
            json!({
                "id": "cs_test_1",
                "customer": "cus_123",
                "subscription": "sub_123",
                "metadata": {"user_id": USER_ID}
            }),
        )
    }

    #[tokio::test]
    async fn checkout_creates_subscription() {
        let h = harness(
            MockProvider::with_subscription(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = checkout_event();

        let outcome = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        let user_id = Uuid::parse_str(USER_ID).unwrap();
        assert_eq!(outcome, ReconcileOutcome::Created { user_id });
        let record = h.repo.get(user_id).unwrap();
        assert_eq!(record.stripe_subscription_id, "sub_123");
        assert_eq!(record.plan_id, pro_plan().id);
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert!(!record.cancel_at_period_end);
    }

    #[tokio::test]
    async fn checkout_redelivery_converges_to_one_row() {
        let h = harness(
            MockProvider::with_subscription(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = checkout_event();

        h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();
        h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        assert_eq!(h.repo.len(), 1);
    }

    #[tokio::test]
    async fn checkout_without_user_id_metadata_fails() {
        let h = harness(
            MockProvider::with_subscription(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = event_json(
            "checkout.session.completed",
            json!({"id": "cs_1", "customer": "cus_123", "subscription": "sub_123", "metadata": {}}),
        );

        let result = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await;

        assert!(matches!(result, Err(WebhookError::MissingMetadata("user_id"))));
        assert_eq!(h.repo.len(), 0);
    }

    #[tokio::test]
    async fn checkout_with_malformed_user_id_fails() {
        let h = harness(
            MockProvider::with_subscription(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = event_json(
            "checkout.session.completed",
            json!({
                "id": "cs_1",
                "subscription": "sub_123",
                "metadata": {"user_id": "not-a-uuid"}
            }),
        );

        let result = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await;

        assert!(matches!(result, Err(WebhookError::ParseError(_))));
        assert_eq!(h.repo.len(), 0);
    }

    #[tokio::test]
    async fn checkout_without_subscription_fails() {
        let h = harness(
            MockProvider::with_subscription(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = event_json(
            "checkout.session.completed",
            json!({"id": "cs_1", "metadata": {"user_id": USER_ID}}),
        );

        let result = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await;

        assert!(matches!(result, Err(WebhookError::MissingField("subscription"))));
    }

    #[tokio::test]
    async fn checkout_with_unknown_price_fails() {
        let repo = Arc::new(InMemoryRepo::default());
        let reconciler = WebhookReconciler::new(
            StripeWebhookVerifier::new(TEST_SECRET),
            Arc::new(MockProvider::with_subscription()),
            repo.clone(),
            Arc::new(StaticCatalog { plan: None }),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = checkout_event();

        let result = reconciler.process(payload.as_bytes(), &signed(&payload)).await;

        assert!(matches!(result, Err(WebhookError::UnknownPrice(p)) if p == "price_pro"));
        assert_eq!(repo.len(), 0);
    }

    #[tokio::test]
    async fn checkout_provider_failure_fails() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = checkout_event();

        let result = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await;

        assert!(matches!(result, Err(WebhookError::Provider(_))));
    }

    #[tokio::test]
    async fn update_overwrites_state() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::seeded(seeded_record()),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = event_json(
            "customer.subscription.updated",
            json!({
                "id": "sub_123",
                "customer": "cus_123",
                "status": "past_due",
                "current_period_end": 1769904000,
                "cancel_at_period_end": true
            }),
        );

        let outcome = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Updated);
        let record = h.repo.get(Uuid::parse_str(USER_ID).unwrap()).unwrap();
        assert_eq!(record.status, SubscriptionStatus::PastDue);
        assert_eq!(record.current_period_end.timestamp(), 1769904000);
        assert!(record.cancel_at_period_end);
    }

    #[tokio::test]
    async fn update_passes_unknown_status_through() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::seeded(seeded_record()),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = event_json(
            "customer.subscription.updated",
            json!({
                "id": "sub_123",
                "customer": "cus_123",
                "status": "trialing",
                "current_period_end": 1769904000
            }),
        );

        h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        let record = h.repo.get(Uuid::parse_str(USER_ID).unwrap()).unwrap();
        assert_eq!(record.status, SubscriptionStatus::Other("trialing".to_string()));
    }

    #[tokio::test]
    async fn update_unknown_subscription_acknowledged_under_ignore() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = event_json(
            "customer.subscription.updated",
            json!({
                "id": "sub_ghost",
                "customer": "cus_123",
                "status": "active",
                "current_period_end": 1769904000
            }),
        );

        let outcome = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Acknowledged(_)));
    }

    #[tokio::test]
    async fn update_unknown_subscription_rejected_under_reject() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Reject,
        );
        let payload = event_json(
            "customer.subscription.updated",
            json!({
                "id": "sub_ghost",
                "customer": "cus_123",
                "status": "active",
                "current_period_end": 1769904000
            }),
        );

        let result = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await;

        assert!(matches!(
            result,
            Err(WebhookError::SubscriptionNotFound(id)) if id == "sub_ghost"
        ));
    }

    #[tokio::test]
    async fn delete_soft_deletes_only_status() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::seeded(seeded_record()),
            UnmatchedTargetPolicy::Ignore,
        );
        let before = h.repo.get(Uuid::parse_str(USER_ID).unwrap()).unwrap();
        let payload = event_json(
            "customer.subscription.deleted",
            json!({
                "id": "sub_123",
                "customer": "cus_123",
                "status": "canceled",
                "current_period_end": 1769904000
            }),
        );

        let outcome = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::Canceled);
        let record = h.repo.get(Uuid::parse_str(USER_ID).unwrap()).unwrap();
        assert_eq!(record.status, SubscriptionStatus::Canceled);
        // Soft delete leaves everything else untouched, including the row itself
        assert_eq!(record.current_period_end, before.current_period_end);
        assert_eq!(record.plan_id, before.plan_id);
        assert_eq!(h.repo.len(), 1);
    }

    #[tokio::test]
    async fn payment_succeeded_marks_active() {
        let mut record = seeded_record();
        record.status = SubscriptionStatus::PastDue;
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::seeded(record),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = event_json(
            "invoice.payment_succeeded",
            json!({"id": "in_1", "subscription": "sub_123"}),
        );

        let outcome = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::MarkedActive);
        let record = h.repo.get(Uuid::parse_str(USER_ID).unwrap()).unwrap();
        assert_eq!(record.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn payment_failed_marks_past_due() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::seeded(seeded_record()),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = event_json(
            "invoice.payment_failed",
            json!({"id": "in_1", "subscription": "sub_123"}),
        );

        let outcome = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        assert_eq!(outcome, ReconcileOutcome::MarkedPastDue);
        let record = h.repo.get(Uuid::parse_str(USER_ID).unwrap()).unwrap();
        assert_eq!(record.status, SubscriptionStatus::PastDue);
    }

    #[tokio::test]
    async fn invoice_without_subscription_is_acknowledged() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::seeded(seeded_record()),
            UnmatchedTargetPolicy::Ignore,
        );
        let before = h.repo.get(Uuid::parse_str(USER_ID).unwrap()).unwrap();
        let payload = event_json(
            "invoice.payment_succeeded",
            json!({"id": "in_oneoff", "subscription": null}),
        );

        let outcome = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Acknowledged(_)));
        let after = h.repo.get(Uuid::parse_str(USER_ID).unwrap()).unwrap();
        assert_eq!(after.status, before.status);
    }

    #[tokio::test]
    async fn unrecognized_event_is_acknowledged() {
        let h = harness(
            MockProvider::empty(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Reject,
        );
        let payload = event_json("customer.created", json!({"id": "cus_new"}));

        let outcome = h.reconciler.process(payload.as_bytes(), &signed(&payload)).await.unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Acknowledged(_)));
    }

    #[tokio::test]
    async fn invalid_signature_rejected_before_any_work() {
        let h = harness(
            MockProvider::with_subscription(),
            InMemoryRepo::default(),
            UnmatchedTargetPolicy::Ignore,
        );
        let payload = checkout_event();
        let timestamp = Utc::now().timestamp();
        let header = format!("t={},v1={}", timestamp, "ab".repeat(32));

        let result = h.reconciler.process(payload.as_bytes(), &header).await;

        assert!(matches!(result, Err(WebhookError::InvalidSignature)));
        assert_eq!(h.repo.len(), 0);
    }
}
