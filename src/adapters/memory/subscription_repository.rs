use crate::domain::{Subscription, SubscriptionId};
use crate::ports::subscription_repository::{
    Result, SubscriptionRepository as SubscriptionRepositoryTrait,
};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// SubscriptionRepositoryのインメモリ実装
///
/// 挿入順を保持する。
#[derive(Default)]
pub struct SubscriptionRepository {
    subscriptions: RwLock<Vec<Subscription>>,
}

impl SubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepositoryTrait for SubscriptionRepository {
    async fn find_all(&self) -> Result<Vec<Subscription>> {
        Ok(self.subscriptions.read().await.clone())
    }

    async fn find_by_id(&self, subscription_id: SubscriptionId) -> Result<Option<Subscription>> {
        Ok(self
            .subscriptions
            .read()
            .await
            .iter()
            .find(|s| s.id == subscription_id)
            .cloned())
    }

    async fn save(&self, subscription: Subscription) -> Result<()> {
        let mut subscriptions = self.subscriptions.write().await;
        match subscriptions.iter_mut().find(|s| s.id == subscription.id) {
            Some(existing) => *existing = subscription,
            None => subscriptions.push(subscription),
        }
        Ok(())
    }
}
