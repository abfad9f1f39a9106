use crate::application::book::BookApplicationError;
use crate::application::subscription::SubscriptionApplicationError;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header::RETRY_AFTER},
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Book(BookApplicationError),
    Subscription(SubscriptionApplicationError),
    /// リクエストボディやパスを解釈できなかった
    BadRequest(String),
}

impl From<BookApplicationError> for ApiError {
    fn from(err: BookApplicationError) -> Self {
        ApiError::Book(err)
    }
}

impl From<SubscriptionApplicationError> for ApiError {
    fn from(err: SubscriptionApplicationError) -> Self {
        ApiError::Subscription(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut retry_after = None;

        let (status, error_type, message) = match self {
            // 400 Bad Request - 入力の欠落・不正
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::Book(BookApplicationError::InvalidCopies(msg))
            | ApiError::Subscription(SubscriptionApplicationError::InvalidRequest(msg)) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg)
            }

            // 404 Not Found - リクエストされたリソースが存在しない
            ApiError::Book(BookApplicationError::BookNotFound(book_id)) => (
                StatusCode::NOT_FOUND,
                "BOOK_NOT_FOUND",
                format!("Book not found with ID: {}", book_id),
            ),
            ApiError::Subscription(SubscriptionApplicationError::BookNotFound(book_id)) => (
                StatusCode::NOT_FOUND,
                "BOOK_NOT_FOUND",
                format!("Book not found with ID: {}", book_id),
            ),
            ApiError::Subscription(SubscriptionApplicationError::SubscriptionNotFound(id)) => (
                StatusCode::NOT_FOUND,
                "SUBSCRIPTION_NOT_FOUND",
                format!("Subscription not found with ID: {}", id),
            ),

            // 422 Unprocessable Entity - 在庫サービスが業務上の理由で拒否
            ApiError::Subscription(SubscriptionApplicationError::InventoryUnavailable(_)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "INVENTORY_UNAVAILABLE",
                "Book copies are not available for subscription".to_string(),
            ),
            ApiError::Subscription(SubscriptionApplicationError::InventoryRejected(msg)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVENTORY_REJECTED", msg)
            }

            // 503 Service Unavailable - 在庫サービスに到達できない
            ApiError::Subscription(SubscriptionApplicationError::RemoteUnavailable {
                message,
                retry_after: after,
            }) => {
                retry_after = Some(after.as_secs().max(1));
                (StatusCode::SERVICE_UNAVAILABLE, "REMOTE_UNAVAILABLE", message)
            }

            // 500 Internal Server Error - システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ApiError::Book(BookApplicationError::RepositoryError(ref e)) => {
                tracing::error!("Book repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_FAILURE",
                    "Failed to access book storage".to_string(),
                )
            }
            ApiError::Subscription(SubscriptionApplicationError::RepositoryError(ref e)) => {
                tracing::error!("Subscription repository error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_FAILURE",
                    "Failed to access subscription storage".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
