use anyhow::Context;
use library_subscription::{
    adapters::{
        memory::InMemoryBookRepository,
        postgres::{self, PostgresBookRepository},
    },
    api::{BookAppState, create_book_router},
    application::book::ServiceDependencies,
    config::BookServiceConfig,
    ports::BookRepository,
    seed, telemetry,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = BookServiceConfig::from_env()?;

    // Initialize tracing
    telemetry::init_tracing(
        "library_subscription=debug,tower_http=debug",
        config.log_format,
    );

    // Initialize storage
    let book_repository: Arc<dyn BookRepository> = match &config.storage.database_url {
        Some(database_url) => {
            tracing::info!("Using PostgreSQL book storage");
            let pool = postgres::connect(database_url, config.storage.db_max_connections).await?;
            Arc::new(PostgresBookRepository::new(pool))
        }
        None => {
            tracing::info!("Using in-memory book storage");
            Arc::new(InMemoryBookRepository::new())
        }
    };

    if config.storage.seed_data {
        seed::seed_books(book_repository.as_ref())
            .await
            .map_err(|e| anyhow::anyhow!(e))
            .context("Failed to seed books")?;
    }

    // Create router
    let service_deps = ServiceDependencies { book_repository };
    let app = create_book_router(Arc::new(BookAppState { service_deps }));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_addr))?;

    tracing::info!("book-service listening on {}", config.listen_addr);

    // Start server
    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
