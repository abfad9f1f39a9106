//! 起動時に投入するサンプルデータ
//!
//! 保存先が空の場合のみ投入する（PostgreSQLの再起動で重複させない）。
//! 購読のサンプルは在庫の調整を行わずにそのまま保存する。

use chrono::NaiveDate;

use crate::domain::{
    Book, BookId, Subscription, commands::CreateSubscription, subscription::open_subscription,
};
use crate::ports::{
    BookRepository, SubscriptionRepository, book_repository, subscription_repository,
};

/// (book_id, name, author, available_copies, total_copies)
const BOOKS: &[(&str, &str, &str, u32, u32)] = &[
    ("B1212", "History of Amazon Valley", "Ross Suarez", 2, 4),
    ("B4232", "Language Fundamentals", "Nick Jones", 0, 2),
];

/// (subscriber_name, date_subscribed, date_returned, book_id)
const SUBSCRIPTIONS: &[(&str, (i32, u32, u32), Option<(i32, u32, u32)>, &str)] = &[
    ("John", (2020, 6, 12), None, "B1212"),
    ("Mark", (2020, 4, 26), Some((2020, 5, 14)), "B4232"),
    ("Peter", (2020, 6, 22), None, "B1212"),
];

pub fn sample_books() -> Vec<Book> {
    BOOKS
        .iter()
        .filter_map(|&(id, name, author, available_copies, total_copies)| {
            Some(Book {
                id: BookId::parse(id)?,
                name: name.to_string(),
                author: author.to_string(),
                available_copies,
                total_copies,
            })
        })
        .collect()
}

pub fn sample_subscriptions() -> Vec<Subscription> {
    let date = |(y, m, d): (i32, u32, u32)| NaiveDate::from_ymd_opt(y, m, d);

    SUBSCRIPTIONS
        .iter()
        .filter_map(|&(name, subscribed, returned, book_id)| {
            open_subscription(CreateSubscription {
                subscriber_name: Some(name.to_string()),
                date_subscribed: date(subscribed),
                date_returned: returned.and_then(date),
                book_id: Some(book_id.to_string()),
            })
            .ok()
        })
        .collect()
}

/// 書籍が1冊も登録されていなければサンプルを投入する
///
/// 投入した件数を返す。
pub async fn seed_books(repository: &dyn BookRepository) -> book_repository::Result<usize> {
    if !repository.find_all().await?.is_empty() {
        return Ok(0);
    }

    let books = sample_books();
    let count = books.len();
    for book in books {
        repository.save(book).await?;
    }

    tracing::info!(count, "Seeded sample books");
    Ok(count)
}

/// 購読が1件もなければサンプルを投入する
pub async fn seed_subscriptions(
    repository: &dyn SubscriptionRepository,
) -> subscription_repository::Result<usize> {
    if !repository.find_all().await?.is_empty() {
        return Ok(0);
    }

    let subscriptions = sample_subscriptions();
    let count = subscriptions.len();
    for subscription in subscriptions {
        repository.save(subscription).await?;
    }

    tracing::info!(count, "Seeded sample subscriptions");
    Ok(count)
}
