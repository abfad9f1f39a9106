use crate::domain::{Book, BookId};
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// BookRepositoryのインメモリ実装
///
/// `DATABASE_URL`が未設定のときに使われる。プロセス終了で内容は失われる。
#[derive(Default)]
pub struct BookRepository {
    books: RwLock<HashMap<BookId, Book>>,
}

impl BookRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    /// ID順で返す
    async fn find_all(&self) -> Result<Vec<Book>> {
        let mut books: Vec<Book> = self.books.read().await.values().cloned().collect();
        books.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
        Ok(books)
    }

    async fn find_by_id(&self, book_id: &BookId) -> Result<Option<Book>> {
        Ok(self.books.read().await.get(book_id).cloned())
    }

    async fn save(&self, book: Book) -> Result<()> {
        self.books.write().await.insert(book.id.clone(), book);
        Ok(())
    }
}
