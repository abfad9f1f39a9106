pub mod book_repository;
pub mod subscription_repository;

pub use book_repository::BookRepository as InMemoryBookRepository;
pub use subscription_repository::SubscriptionRepository as InMemorySubscriptionRepository;
