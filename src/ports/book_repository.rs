use crate::domain::{Book, BookId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 書籍リポジトリポート
///
/// 在庫コンテキストが所有する書籍レコードの永続化を抽象化する。
/// 楽観ロックは持たない。同じ書籍への同時`save`は後勝ちとなる。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// すべての書籍を取得する
    async fn find_all(&self) -> Result<Vec<Book>>;

    /// IDで書籍を取得する
    async fn find_by_id(&self, book_id: &BookId) -> Result<Option<Book>>;

    /// 書籍を保存する（upsert）
    async fn save(&self, book: Book) -> Result<()>;
}
