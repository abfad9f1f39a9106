//! 在庫サービス呼び出しとサーキットブレーカーの境界
//!
//! 通信エラーはここでフォールバック結果に変換され、
//! 購読のビジネスロジックには通信レベルのエラー型が届かない。

use crate::circuit_breaker::Interruption;
use crate::domain::{Book, BookId};
use crate::ports::BookServiceError;

use super::errors::{Result, SubscriptionApplicationError};
use super::subscription_service::ServiceDependencies;

/// 貸出可能冊数の読み取り結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopiesReading {
    /// 在庫サービスが返した冊数
    Reported(u32),
    /// フォールバック（在庫0として扱う）
    Fallback,
}

impl CopiesReading {
    pub fn copies(&self) -> u32 {
        match self {
            CopiesReading::Reported(copies) => *copies,
            CopiesReading::Fallback => 0,
        }
    }
}

/// 在庫更新の結果
#[derive(Debug)]
pub enum CopiesUpdate {
    /// 在庫サービスが更新を反映した
    Applied(Book),
    /// フォールバック（更新されたかどうかは不明）
    Degraded(SubscriptionApplicationError),
}

/// 書籍の貸出可能冊数をサーキットブレーカー経由で取得する
///
/// # エラー
/// - BookNotFound: 在庫サービスが404を返した
/// - InventoryRejected: 在庫サービスがその他の4xxを返した
pub(super) async fn fetch_available_copies(
    deps: &ServiceDependencies,
    book_id: &BookId,
) -> Result<CopiesReading> {
    deps.circuit_breaker
        .call_with_fallback(
            move || async move {
                deps.book_service
                    .get_book(book_id)
                    .await
                    .map(|book| CopiesReading::Reported(book.available_copies))
            },
            move |interruption| {
                log_fallback("read", book_id, &interruption);
                CopiesReading::Fallback
            },
        )
        .await
        .map_err(business_error)
}

/// 書籍の貸出可能冊数をサーキットブレーカー経由で上書きする
pub(super) async fn apply_available_copies(
    deps: &ServiceDependencies,
    book_id: &BookId,
    copies: u32,
) -> Result<CopiesUpdate> {
    deps.circuit_breaker
        .call_with_fallback(
            move || async move {
                deps.book_service
                    .update_available_copies(book_id, copies)
                    .await
                    .map(CopiesUpdate::Applied)
            },
            move |interruption| {
                log_fallback("update", book_id, &interruption);
                CopiesUpdate::Degraded(remote_unavailable(deps))
            },
        )
        .await
        .map_err(business_error)
}

/// 在庫サービスが利用できないことを示すエラー
///
/// メッセージには観測用に現在時刻を含める。
pub(super) fn remote_unavailable(deps: &ServiceDependencies) -> SubscriptionApplicationError {
    let now = chrono::Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S");
    SubscriptionApplicationError::RemoteUnavailable {
        message: format!(
            "Book service is temporarily unavailable. Please try again later - {}",
            now
        ),
        retry_after: deps.circuit_breaker.retry_after_hint(),
    }
}

fn log_fallback(operation: &str, book_id: &BookId, interruption: &Interruption<BookServiceError>) {
    match interruption {
        Interruption::NotPermitted { retry_after } => tracing::warn!(
            operation,
            book_id = %book_id,
            retry_after_secs = retry_after.as_secs(),
            "Circuit breaker open for book-service, using fallback"
        ),
        Interruption::Failed(err) => tracing::warn!(
            operation,
            book_id = %book_id,
            error = %err,
            "Book service call failed, using fallback"
        ),
    }
}

fn business_error(err: BookServiceError) -> SubscriptionApplicationError {
    match err {
        BookServiceError::NotFound(book_id) => SubscriptionApplicationError::BookNotFound(book_id),
        other => SubscriptionApplicationError::InventoryRejected(other.to_string()),
    }
}
