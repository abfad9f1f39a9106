use crate::domain::{BookId, Subscription, SubscriptionId};
use crate::ports::subscription_repository::{
    Result, SubscriptionRepository as SubscriptionRepositoryTrait,
};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

fn map_row_to_subscription(row: &PgRow) -> Result<Subscription> {
    let book_id: String = row.get("book_id");
    let book_id = BookId::parse(&book_id).ok_or_else(|| {
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "book_id is blank",
        )) as Box<dyn std::error::Error + Send + Sync>
    })?;

    Ok(Subscription {
        id: SubscriptionId::from_uuid(row.get("subscription_id")),
        subscriber_name: row.get("subscriber_name"),
        date_subscribed: row.get("date_subscribed"),
        date_returned: row.get("date_returned"),
        book_id,
    })
}

/// SubscriptionRepositoryのPostgreSQL実装
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepositoryTrait for SubscriptionRepository {
    /// 作成順で返す
    async fn find_all(&self) -> Result<Vec<Subscription>> {
        let rows = sqlx::query(
            r#"
            SELECT subscription_id, subscriber_name, date_subscribed, date_returned, book_id
            FROM subscriptions
            ORDER BY created_at, subscription_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_subscription).collect()
    }

    async fn find_by_id(&self, subscription_id: SubscriptionId) -> Result<Option<Subscription>> {
        let row = sqlx::query(
            r#"
            SELECT subscription_id, subscriber_name, date_subscribed, date_returned, book_id
            FROM subscriptions
            WHERE subscription_id = $1
            "#,
        )
        .bind(subscription_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_subscription).transpose()
    }

    /// 購読を保存（upsert）
    async fn save(&self, subscription: Subscription) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                subscription_id,
                subscriber_name,
                date_subscribed,
                date_returned,
                book_id
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (subscription_id)
            DO UPDATE SET
                subscriber_name = EXCLUDED.subscriber_name,
                date_subscribed = EXCLUDED.date_subscribed,
                date_returned = EXCLUDED.date_returned,
                book_id = EXCLUDED.book_id,
                updated_at = NOW()
            "#,
        )
        .bind(subscription.id.value())
        .bind(&subscription.subscriber_name)
        .bind(subscription.date_subscribed)
        .bind(subscription.date_returned)
        .bind(subscription.book_id.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
