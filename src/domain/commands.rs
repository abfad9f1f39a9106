use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SubscriptionId;

/// コマンド：購読を作成する
///
/// 入力は未検証のまま保持し、`subscription::open_subscription`で検証する。
/// `date_returned`がある場合は返却として扱われる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub subscriber_name: Option<String>,
    pub date_subscribed: Option<NaiveDate>,
    pub date_returned: Option<NaiveDate>,
    pub book_id: Option<String>,
}

/// コマンド：貸出中の購読を返却する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnSubscription {
    pub subscription_id: SubscriptionId,
    pub date_returned: Option<NaiveDate>,
}
