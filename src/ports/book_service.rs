use crate::circuit_breaker::BreakerFailure;
use crate::domain::{Book, BookId};
use async_trait::async_trait;
use thiserror::Error;

/// 書籍サービス呼び出しのエラー
///
/// 在庫サービスが正しく応答した業務上の結果（404、400など）と、
/// 通信障害（タイムアウト、接続失敗、5xx）を区別する。
#[derive(Debug, Error)]
pub enum BookServiceError {
    /// 書籍が存在しない（在庫サービスが404を返した）
    #[error("Book not found: {0}")]
    NotFound(BookId),

    /// 在庫サービスが値を受け付けなかった（4xx）
    #[error("Book service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// 応答がタイムアウトした
    #[error("Book service timed out")]
    Timeout(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 接続できなかった
    #[error("Book service unreachable")]
    Connection(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 5xxまたは想定外のステータス
    #[error("Book service responded with status {0}")]
    UnexpectedStatus(u16),

    /// 応答ボディを解釈できなかった
    #[error("Book service returned an unreadable body")]
    Decode(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl BreakerFailure for BookServiceError {
    /// 在庫サービスが正しく応答した業務上の結果はサーキットブレーカーの失敗に数えない
    fn is_breaker_failure(&self) -> bool {
        !matches!(self, Self::NotFound(_) | Self::Rejected { .. })
    }
}

pub type Result<T> = std::result::Result<T, BookServiceError>;

/// 書籍サービスポート
///
/// 購読コンテキストと在庫コンテキストの境界を維持する。
/// 購読コンテキストはBookIDと、呼び出しごとに取得する在庫数のみを知る。
#[async_trait]
pub trait BookService: Send + Sync {
    /// 書籍を取得する
    async fn get_book(&self, book_id: &BookId) -> Result<Book>;

    /// 書籍の貸出可能冊数を上書きする
    ///
    /// 在庫サービス側では検証・排他を行わない（後勝ち）。
    async fn update_available_copies(&self, book_id: &BookId, copies: u32) -> Result<Book>;
}
