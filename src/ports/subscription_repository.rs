use crate::domain::{Subscription, SubscriptionId};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// 購読リポジトリポート
///
/// 購読コンテキストのローカルストア。
/// 在庫サービスへの書き込みが成功した後にのみ`save`が呼ばれる。
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// すべての購読を取得する
    async fn find_all(&self) -> Result<Vec<Subscription>>;

    /// IDで購読を取得する
    async fn find_by_id(&self, subscription_id: SubscriptionId) -> Result<Option<Subscription>>;

    /// 購読を保存する（upsert）
    ///
    /// 新規の場合はINSERT、既存の場合は返却日などを更新する。
    async fn save(&self, subscription: Subscription) -> Result<()>;
}
