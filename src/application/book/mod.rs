mod book_service;
mod errors;

pub use book_service::{ServiceDependencies, get_book, list_books, update_available_copies};
pub use errors::{BookApplicationError, Result};
