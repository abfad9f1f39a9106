use crate::domain::{Book, BookId};
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, Result};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// PostgreSQLの行データをBookに変換する
///
/// 冊数はINTEGER（i32）で保存されているため、u32への変換でエラーハンドリングを行う。
fn map_row_to_book(row: &PgRow) -> Result<Book> {
    let book_id: String = row.get("book_id");
    let id = BookId::parse(&book_id).ok_or_else(|| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "book_id is blank",
        )) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Book {
        id,
        name: row.get("book_name"),
        author: row.get("author"),
        available_copies: copies_from_row(row, "available_copies")?,
        total_copies: copies_from_row(row, "total_copies")?,
    })
}

fn copies_from_row(row: &PgRow, column: &str) -> Result<u32> {
    let value: i32 = row.get(column);
    value.try_into().map_err(|_| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} out of range: {}", column, value),
        )) as Box<dyn std::error::Error + Send + Sync>
    })
}

fn copies_to_column(copies: u32) -> Result<i32> {
    copies.try_into().map_err(|_| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("copies out of range: {}", copies),
        )) as Box<dyn std::error::Error + Send + Sync>
    })
}

/// BookRepositoryのPostgreSQL実装
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    /// PostgreSQLコネクションプールから新しいBookRepositoryを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn find_all(&self) -> Result<Vec<Book>> {
        let rows = sqlx::query(
            r#"
            SELECT book_id, book_name, author, available_copies, total_copies
            FROM books
            ORDER BY book_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_book).collect()
    }

    async fn find_by_id(&self, book_id: &BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            r#"
            SELECT book_id, book_name, author, available_copies, total_copies
            FROM books
            WHERE book_id = $1
            "#,
        )
        .bind(book_id.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_book).transpose()
    }

    /// 書籍を保存（upsert）
    ///
    /// 楽観ロックは行わない。同じ書籍への同時更新は後勝ち。
    async fn save(&self, book: Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books (book_id, book_name, author, available_copies, total_copies)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (book_id)
            DO UPDATE SET
                book_name = EXCLUDED.book_name,
                author = EXCLUDED.author,
                available_copies = EXCLUDED.available_copies,
                total_copies = EXCLUDED.total_copies,
                updated_at = NOW()
            "#,
        )
        .bind(book.id.as_str())
        .bind(&book.name)
        .bind(&book.author)
        .bind(copies_to_column(book.available_copies)?)
        .bind(copies_to_column(book.total_copies)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
