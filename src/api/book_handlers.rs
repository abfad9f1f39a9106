use crate::application::book::{
    ServiceDependencies, get_book as execute_get_book, list_books as execute_list_books,
    update_available_copies as execute_update_available_copies,
};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use std::sync::Arc;

use super::{
    error::ApiError,
    types::{BookResponse, HealthResponse},
};

// ============================================================================
// State
// ============================================================================

/// 在庫サービスのハンドラー間で共有される状態
#[derive(Clone)]
pub struct BookAppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /books - 書籍一覧を取得
pub async fn list_books(
    State(state): State<Arc<BookAppState>>,
) -> Result<Json<Vec<BookResponse>>, ApiError> {
    let books = execute_list_books(&state.service_deps).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

/// GET /books/:id - 書籍をIDで取得
///
/// 見つかった場合は書籍情報を返し、見つからない場合は404を返す。
pub async fn get_book(
    State(state): State<Arc<BookAppState>>,
    Path(book_id): Path<String>,
) -> Result<Json<BookResponse>, ApiError> {
    let book = execute_get_book(&state.service_deps, &book_id).await?;
    Ok(Json(BookResponse::from(book)))
}

// ============================================================================
// Command handlers (PUT)
// ============================================================================

/// PUT /books/:id - 貸出可能冊数を上書き
///
/// ボディは新しい冊数を表すJSON整数（例: `1`）。
/// 未指定・負数・整数以外は400を返す。
pub async fn update_book(
    State(state): State<Arc<BookAppState>>,
    Path(book_id): Path<String>,
    body: Result<Json<Option<i64>>, JsonRejection>,
) -> Result<Json<BookResponse>, ApiError> {
    let Json(copies) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let book = execute_update_available_copies(&state.service_deps, &book_id, copies).await?;
    Ok(Json(BookResponse::from(book)))
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        circuit_breaker: None,
    })
}
