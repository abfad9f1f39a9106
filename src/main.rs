use anyhow::Context;
use library_subscription::{
    adapters::{
        http::BookServiceClient,
        memory::InMemorySubscriptionRepository,
        postgres::{self, PostgresSubscriptionRepository},
    },
    api::{SubscriptionAppState, create_subscription_router},
    application::subscription::ServiceDependencies,
    circuit_breaker::CircuitBreaker,
    config::SubscriptionServiceConfig,
    ports::SubscriptionRepository,
    seed, telemetry,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = SubscriptionServiceConfig::from_env()?;

    // Initialize tracing
    telemetry::init_tracing(
        "library_subscription=debug,tower_http=debug",
        config.log_format,
    );

    // Initialize storage
    let subscription_repository: Arc<dyn SubscriptionRepository> =
        match &config.storage.database_url {
            Some(database_url) => {
                tracing::info!("Using PostgreSQL subscription storage");
                let pool = postgres::connect(database_url, config.storage.db_max_connections).await?;
                Arc::new(PostgresSubscriptionRepository::new(pool))
            }
            None => {
                tracing::info!("Using in-memory subscription storage");
                Arc::new(InMemorySubscriptionRepository::new())
            }
        };

    if config.storage.seed_data {
        seed::seed_subscriptions(subscription_repository.as_ref())
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to seed subscriptions")?;
    }

    // Initialize the book-service client and its circuit breaker
    let book_service = Arc::new(
        BookServiceClient::new(
            &config.book_service_url,
            config.connect_timeout,
            config.read_timeout,
        )
        .context("Failed to build book-service client")?,
    );
    let circuit_breaker = Arc::new(CircuitBreaker::new(
        "book-service",
        config.circuit_breaker.clone(),
    ));

    tracing::info!(
        book_service_url = %config.book_service_url,
        breaker = ?config.circuit_breaker,
        "Book service client configured"
    );

    // Create service dependencies
    let service_deps = ServiceDependencies {
        subscription_repository,
        book_service,
        circuit_breaker,
    };

    // Create router
    let app = create_subscription_router(Arc::new(SubscriptionAppState { service_deps }));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;

    tracing::info!("subscription-service listening on {}", config.listen_addr);

    // Start server
    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
