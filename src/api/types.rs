use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::circuit_breaker::CircuitBreakerMetrics;
use crate::domain::{
    Book, BookId, Subscription, SubscriptionId,
    commands::{CreateSubscription, ReturnSubscription},
};

/// 書籍レスポンス（GET /books, GET /books/:id, PUT /books/:id）
///
/// 購読サービスのHTTPクライアントも同じ形で読み取る。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: BookId,
    pub name: String,
    pub author: String,
    pub available_copies: u32,
    pub total_copies: u32,
}

impl From<Book> for BookResponse {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            name: book.name,
            author: book.author,
            available_copies: book.available_copies,
            total_copies: book.total_copies,
        }
    }
}

impl From<BookResponse> for Book {
    fn from(response: BookResponse) -> Self {
        Self {
            id: response.id,
            name: response.name,
            author: response.author,
            available_copies: response.available_copies,
            total_copies: response.total_copies,
        }
    }
}

/// 購読作成リクエスト（POST /subscriptions）
///
/// 必須項目の欠落を400として返すため、すべてOptionで受ける。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub subscriber_name: Option<String>,
    #[serde(alias = "dateSubscriber")]
    pub date_subscribed: Option<NaiveDate>,
    pub date_returned: Option<NaiveDate>,
    pub book_id: Option<String>,
}

impl CreateSubscriptionRequest {
    pub fn to_command(self) -> CreateSubscription {
        CreateSubscription {
            subscriber_name: self.subscriber_name,
            date_subscribed: self.date_subscribed,
            date_returned: self.date_returned,
            book_id: self.book_id,
        }
    }
}

/// 返却リクエスト（POST /subscriptions/:id/return）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnSubscriptionRequest {
    pub date_returned: Option<NaiveDate>,
}

impl ReturnSubscriptionRequest {
    pub fn to_command(self, subscription_id: Uuid) -> ReturnSubscription {
        ReturnSubscription {
            subscription_id: SubscriptionId::from_uuid(subscription_id),
            date_returned: self.date_returned,
        }
    }
}

/// 購読レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub id: Uuid,
    pub subscriber_name: String,
    pub date_subscribed: NaiveDate,
    pub date_returned: Option<NaiveDate>,
    pub book_id: String,
}

impl From<Subscription> for SubscriptionResponse {
    fn from(subscription: Subscription) -> Self {
        Self {
            id: subscription.id.value(),
            subscriber_name: subscription.subscriber_name,
            date_subscribed: subscription.date_subscribed,
            date_returned: subscription.date_returned,
            book_id: subscription.book_id.to_string(),
        }
    }
}

/// ヘルスチェックレスポンス
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circuit_breaker: Option<CircuitBreakerMetrics>,
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
