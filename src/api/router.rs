use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::book_handlers::{self, BookAppState};
use super::subscription_handlers::{self, SubscriptionAppState};

/// Creates the book-service router
///
/// - GET /books - List books
/// - GET /books/:id - Get a book
/// - PUT /books/:id - Overwrite available copies (body: JSON integer)
pub fn create_book_router(state: Arc<BookAppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(book_handlers::health))
        .route("/books", get(book_handlers::list_books))
        .route(
            "/books/:id",
            get(book_handlers::get_book).put(book_handlers::update_book),
        )
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Creates the subscription-service router
///
/// Command endpoints (Write operations):
/// - POST /subscriptions - Create a subscription (adjusts book copies remotely)
/// - POST /subscriptions/:id/return - Return a checked-out subscription
///
/// Query endpoints (Read operations):
/// - GET /subscriptions - List subscriptions
/// - GET /subscriptions/:id - Get subscription details
pub fn create_subscription_router(state: Arc<SubscriptionAppState>) -> Router {
    Router::new()
        // Health check endpoint (includes circuit breaker metrics)
        .route("/health", get(subscription_handlers::health))
        .route(
            "/subscriptions",
            get(subscription_handlers::list_subscriptions)
                .post(subscription_handlers::create_subscription),
        )
        .route(
            "/subscriptions/:id",
            get(subscription_handlers::get_subscription),
        )
        .route(
            "/subscriptions/:id/return",
            post(subscription_handlers::return_subscription),
        )
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}
