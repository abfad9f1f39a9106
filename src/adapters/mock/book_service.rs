use crate::domain::{Book, BookId};
use crate::ports::book_service::{BookService as BookServiceTrait, BookServiceError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// BookServiceのモック実装
///
/// 書籍を保持することで状態を持ったテストをサポート。
/// 到達不能（タイムアウト）や書き込みのみの失敗を再現でき、
/// 実際に届いた呼び出しの回数を数える。
#[derive(Default)]
pub struct BookService {
    books: Mutex<HashMap<BookId, Book>>,
    unreachable: AtomicBool,
    updates_failing: AtomicBool,
    get_calls: AtomicUsize,
    update_calls: AtomicUsize,
}

impl BookService {
    pub fn new() -> Self {
        Self::default()
    }

    /// テスト用に書籍を登録
    pub fn add_book(&self, book: Book) {
        self.books.lock().unwrap().insert(book.id.clone(), book);
    }

    /// 登録済みの書籍を取得（呼び出し回数には数えない）
    pub fn book(&self, book_id: &str) -> Option<Book> {
        let book_id = BookId::parse(book_id)?;
        self.books.lock().unwrap().get(&book_id).cloned()
    }

    /// すべての呼び出しをタイムアウトさせる
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// 在庫更新のみを失敗させる（503）
    pub fn set_updates_failing(&self, failing: bool) {
        self.updates_failing.store(failing, Ordering::SeqCst);
    }

    /// 実際に処理した読み取り呼び出しの回数
    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    /// 実際に処理した更新呼び出しの回数
    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(BookServiceError::Timeout(Box::new(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "simulated timeout",
            ))));
        }
        Ok(())
    }
}

#[async_trait]
impl BookServiceTrait for BookService {
    async fn get_book(&self, book_id: &BookId) -> Result<Book> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        self.books
            .lock()
            .unwrap()
            .get(book_id)
            .cloned()
            .ok_or_else(|| BookServiceError::NotFound(book_id.clone()))
    }

    async fn update_available_copies(&self, book_id: &BookId, copies: u32) -> Result<Book> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if self.updates_failing.load(Ordering::SeqCst) {
            return Err(BookServiceError::UnexpectedStatus(503));
        }

        let mut books = self.books.lock().unwrap();
        let book = books
            .get_mut(book_id)
            .ok_or_else(|| BookServiceError::NotFound(book_id.clone()))?;
        book.available_copies = copies;
        Ok(book.clone())
    }
}
