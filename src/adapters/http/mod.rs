pub mod book_service_client;

pub use book_service_client::{BookServiceClient, BookServiceClientError};
