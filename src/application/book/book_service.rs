use crate::domain::{Book, BookId};
use crate::ports::BookRepository;
use std::sync::Arc;

use super::errors::{BookApplicationError, Result};

/// 在庫サービスの依存関係
#[derive(Clone)]
pub struct ServiceDependencies {
    pub book_repository: Arc<dyn BookRepository>,
}

/// すべての書籍を取得する
pub async fn list_books(deps: &ServiceDependencies) -> Result<Vec<Book>> {
    deps.book_repository
        .find_all()
        .await
        .map_err(BookApplicationError::RepositoryError)
}

/// IDで書籍を取得する
///
/// # エラー
/// - BookNotFound: 書籍が存在しない（空のIDを含む）
pub async fn get_book(deps: &ServiceDependencies, book_id: &str) -> Result<Book> {
    let id = BookId::parse(book_id)
        .ok_or_else(|| BookApplicationError::BookNotFound(book_id.to_string()))?;

    deps.book_repository
        .find_by_id(&id)
        .await
        .map_err(BookApplicationError::RepositoryError)?
        .ok_or_else(|| BookApplicationError::BookNotFound(id.to_string()))
}

/// 書籍の貸出可能冊数を上書きする
///
/// 受動的な在庫ストアとして、値が0以上であること以外は検証しない
/// （総冊数を超えるかどうか、直前の値からの差分などは見ない）。
///
/// # 一貫性保証
///
/// 読み取りと保存の間に排他はなく、同じ書籍への同時更新は後勝ちとなる。
/// 購読サービス側の「読み取り→判断→書き込み」と合わせて、
/// 同時貸出で在庫数が1回分しか減らない競合が起こりうる。
///
/// # 引数
/// * `copies` - 新しい貸出可能冊数（未指定、負数、`i32::MAX`超過は`InvalidCopies`）
pub async fn update_available_copies(
    deps: &ServiceDependencies,
    book_id: &str,
    copies: Option<i64>,
) -> Result<Book> {
    // 上限はストレージの列（INTEGER）に合わせる
    let copies = copies
        .filter(|c| (0..=i64::from(i32::MAX)).contains(c))
        .and_then(|c| u32::try_from(c).ok())
        .ok_or_else(|| {
            BookApplicationError::InvalidCopies(format!(
                "remainingCopies must be an integer between 0 and {}",
                i32::MAX
            ))
        })?;

    let book = get_book(deps, book_id).await?;
    let book_id = book.id.clone();
    let updated = book.with_available_copies(copies);

    deps.book_repository
        .save(updated.clone())
        .await
        .map_err(BookApplicationError::RepositoryError)?;

    tracing::info!(book_id = %book_id, copies, "Updated available copies");

    Ok(updated)
}
