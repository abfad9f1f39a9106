use crate::domain::{BookId, SubscriptionId, SubscriptionValidationError};
use std::time::Duration;
use thiserror::Error;

/// 購読アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum SubscriptionApplicationError {
    /// 入力が不正（リモート呼び出しは行われていない）
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 購読が見つからない
    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(SubscriptionId),

    /// 在庫サービスが書籍を知らない
    #[error("Book not found: {0}")]
    BookNotFound(BookId),

    /// 在庫サービスが在庫0を返した（貸出不可）
    #[error("Book copies are not available for subscription: {0}")]
    InventoryUnavailable(BookId),

    /// 在庫サービスが更新値を受け付けなかった
    #[error("Book service rejected the copies update: {0}")]
    InventoryRejected(String),

    /// 在庫サービスに到達できない、またはサーキットがOpen
    #[error("{message}")]
    RemoteUnavailable {
        message: String,
        retry_after: Duration,
    },

    /// SubscriptionRepositoryのエラー
    #[error("Subscription repository error")]
    RepositoryError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<SubscriptionValidationError> for SubscriptionApplicationError {
    fn from(err: SubscriptionValidationError) -> Self {
        SubscriptionApplicationError::InvalidRequest(err.message().to_string())
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, SubscriptionApplicationError>;
