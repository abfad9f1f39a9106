pub mod book_repository;
pub mod book_service;
pub mod subscription_repository;

pub use book_repository::BookRepository;
pub use book_service::{BookService, BookServiceError};
pub use subscription_repository::SubscriptionRepository;
