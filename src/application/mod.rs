pub mod book;
pub mod subscription;
