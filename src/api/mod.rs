pub mod book_handlers;
pub mod error;
pub mod router;
pub mod subscription_handlers;
pub mod types;

pub use book_handlers::BookAppState;
pub use error::ApiError;
pub use router::{create_book_router, create_subscription_router};
pub use subscription_handlers::SubscriptionAppState;
pub use types::*;
