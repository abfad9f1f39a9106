//! 在庫サービス（book-service）のHTTPクライアント
//!
//! - `GET /books/{id}` で書籍を取得
//! - `PUT /books/{id}` でボディに新しい貸出可能冊数（整数）を送る

use crate::api::types::BookResponse;
use crate::domain::{Book, BookId};
use crate::ports::book_service::{BookService, BookServiceError, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;

/// クライアント構築時のエラー
#[derive(Debug, Error)]
pub enum BookServiceClientError {
    /// ベースURLを解釈できない、またはパスを持てないURL
    #[error("Invalid book service URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client")]
    Client(#[from] reqwest::Error),
}

/// 在庫サービスのHTTPクライアント
///
/// 接続タイムアウトと応答タイムアウトを持ち、ハングしたリモートで
/// 購読サービスが止まらないようにする。
pub struct BookServiceClient {
    client: Client,
    base_url: Url,
}

impl BookServiceClient {
    /// # 引数
    /// * `base_url` - 在庫サービスのベースURL（例: "http://book-service:8081"）
    /// * `connect_timeout` - 接続確立までのタイムアウト
    /// * `request_timeout` - リクエスト全体のタイムアウト
    pub fn new(
        base_url: &str,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> std::result::Result<Self, BookServiceClientError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| BookServiceClientError::InvalidBaseUrl(base_url.to_string()))?;

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// `{base}/books/{id}`
    ///
    /// IDは1つのパスセグメントとしてパーセントエンコードされる
    /// （`#`、`?`、`/`を含むIDが別のリソースを指さない）。
    fn book_url(&self, book_id: &BookId) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("books").push(book_id.as_str());
        }
        url
    }

    async fn read_book(book_id: &BookId, response: Response) -> Result<Book> {
        let status = response.status();
        if status.is_success() {
            let body: BookResponse = response
                .json()
                .await
                .map_err(|e| BookServiceError::Decode(Box::new(e)))?;
            return Ok(body.into());
        }

        if status == StatusCode::NOT_FOUND {
            return Err(BookServiceError::NotFound(book_id.clone()));
        }

        if status.is_client_error() {
            let message = response.text().await.unwrap_or_default();
            return Err(BookServiceError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Err(BookServiceError::UnexpectedStatus(status.as_u16()))
    }
}

fn transport_error(err: reqwest::Error) -> BookServiceError {
    if err.is_timeout() {
        BookServiceError::Timeout(Box::new(err))
    } else {
        BookServiceError::Connection(Box::new(err))
    }
}

#[async_trait]
impl BookService for BookServiceClient {
    async fn get_book(&self, book_id: &BookId) -> Result<Book> {
        let response = self
            .client
            .get(self.book_url(book_id))
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_book(book_id, response).await
    }

    async fn update_available_copies(&self, book_id: &BookId, copies: u32) -> Result<Book> {
        let response = self
            .client
            .put(self.book_url(book_id))
            .json(&copies)
            .send()
            .await
            .map_err(transport_error)?;

        Self::read_book(book_id, response).await
    }
}
