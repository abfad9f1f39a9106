pub mod book;
pub mod commands;
pub mod errors;
pub mod subscription;
pub mod value_objects;

pub use book::{Book, CopiesMovement, adjust_copies};
pub use errors::*;
pub use subscription::Subscription;
pub use value_objects::*;
