use thiserror::Error;

/// 在庫アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum BookApplicationError {
    /// 書籍が存在しない
    #[error("Book not found: {0}")]
    BookNotFound(String),

    /// 貸出可能冊数が不正（未指定または負数）
    #[error("Invalid request: {0}")]
    InvalidCopies(String),

    /// BookRepositoryのエラー
    #[error("Book repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, BookApplicationError>;
