//! Billhook server binary.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use billhook::adapters::http::webhook::{webhook_router, WebhookAppState};
use billhook::adapters::notify::QueuedNotifier;
use billhook::adapters::postgres::{
    PostgresEntitlementStore, PostgresIdentityResolver, PostgresPlanCatalog,
    PostgresProcessedEventStore, PostgresProductCatalog, PostgresSubscriptionStore,
};
use billhook::application::handlers::billing::{OneTimePurchaseHandler, ProcessWebhookHandler};
use billhook::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    if config.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    config.validate()?;

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let subscriptions = Arc::new(PostgresSubscriptionStore::new(pool.clone()));
    let processed_events = Arc::new(PostgresProcessedEventStore::new(pool.clone()));
    let plan_catalog = Arc::new(PostgresPlanCatalog::new(pool.clone()));
    let product_catalog = Arc::new(PostgresProductCatalog::new(pool.clone()));
    let identity_resolver = Arc::new(PostgresIdentityResolver::new(pool.clone()));
    let entitlements = Arc::new(PostgresEntitlementStore::new(pool.clone()));
    let notifier = Arc::new(QueuedNotifier::spawn());

    let one_time = Arc::new(OneTimePurchaseHandler::new(
        processed_events.clone(),
        identity_resolver.clone(),
        entitlements,
        notifier.clone(),
    ));
    let handler = Arc::new(ProcessWebhookHandler::new(
        subscriptions,
        processed_events,
        plan_catalog,
        product_catalog,
        identity_resolver,
        notifier,
        one_time,
    ));

    let state = WebhookAppState {
        handler,
        webhook_token: config.provider.webhook_token.clone(),
    };

    let app = Router::new()
        .merge(webhook_router())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, environment = ?config.server.environment, "billhook listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
