//! Skillpath billing service binary.
//!
//! Wires configuration, the database pool, the Stripe client, and the
//! webhook reconciler into an axum server.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use skillpath_billing::adapters::http::{billing_routes, BillingAppState};
use skillpath_billing::adapters::postgres::{PostgresPlanCatalog, PostgresSubscriptionRepository};
use skillpath_billing::adapters::stripe::StripeClient;
use skillpath_billing::application::WebhookReconciler;
use skillpath_billing::config::AppConfig;
use skillpath_billing::domain::billing::StripeWebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    tracing::info!(
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Starting skillpath-billing"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let stripe_client = StripeClient::new(
        SecretString::new(config.payment.stripe_api_key.clone()),
        config.payment.stripe_api_base_url.clone(),
    )?;

    let reconciler = WebhookReconciler::new(
        StripeWebhookVerifier::new(config.payment.stripe_webhook_secret.clone()),
        Arc::new(stripe_client),
        Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        Arc::new(PostgresPlanCatalog::new(pool)),
        config.payment.unmatched_event_policy,
    );

    let state = BillingAppState {
        reconciler: Arc::new(reconciler),
    };

    let app = billing_routes(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening for webhook deliveries");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.server.is_production() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
