use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{
    BookId, CopiesMovement, SubscriptionId, SubscriptionValidationError,
    commands::CreateSubscription,
};

/// 購読（購読コンテキストの集約）
///
/// 書籍はIDでのみ参照する。在庫数は呼び出しごとに在庫サービスから取得し、
/// この集約には保持しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub subscriber_name: String,
    pub date_subscribed: NaiveDate,
    pub date_returned: Option<NaiveDate>,
    pub book_id: BookId,
}

impl Subscription {
    /// 貸出中か（返却日がない）
    pub fn is_checked_out(&self) -> bool {
        self.date_returned.is_none()
    }

    /// この購読が在庫に与える変化
    pub fn movement(&self) -> CopiesMovement {
        if self.is_checked_out() {
            CopiesMovement::Checkout
        } else {
            CopiesMovement::Return
        }
    }
}

/// 購読作成コマンドを検証し、新しい購読を組み立てる（純粋な関数）
///
/// 検証ルール：
/// - 購読者名が空でないこと
/// - 購読日があること
/// - 書籍IDが空でないこと
///
/// IDはここで採番される。永続化はまだ行わない。
pub fn open_subscription(
    cmd: CreateSubscription,
) -> Result<Subscription, SubscriptionValidationError> {
    let subscriber_name = cmd
        .subscriber_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or(SubscriptionValidationError::MissingSubscriberName)?
        .to_string();

    let date_subscribed = cmd
        .date_subscribed
        .ok_or(SubscriptionValidationError::MissingDateSubscribed)?;

    let book_id = cmd
        .book_id
        .as_deref()
        .and_then(BookId::parse)
        .ok_or(SubscriptionValidationError::MissingBookId)?;

    Ok(Subscription {
        id: SubscriptionId::new(),
        subscriber_name,
        date_subscribed,
        date_returned: cmd.date_returned,
        book_id,
    })
}

/// 貸出中の購読に返却日を設定する（純粋な関数）
///
/// # エラー
/// - 返却日がない場合は`MissingDateReturned`
/// - 既に返却済みの場合は`AlreadyReturned`
pub fn mark_returned(
    subscription: Subscription,
    date_returned: Option<NaiveDate>,
) -> Result<Subscription, SubscriptionValidationError> {
    let date_returned = date_returned.ok_or(SubscriptionValidationError::MissingDateReturned)?;

    if !subscription.is_checked_out() {
        return Err(SubscriptionValidationError::AlreadyReturned);
    }

    Ok(Subscription {
        date_returned: Some(date_returned),
        ..subscription
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn checkout_command() -> CreateSubscription {
        CreateSubscription {
            subscriber_name: Some("John".to_string()),
            date_subscribed: Some(date(2020, 6, 12)),
            date_returned: None,
            book_id: Some("B1212".to_string()),
        }
    }

    #[test]
    fn test_open_subscription_success() {
        let subscription = open_subscription(checkout_command()).unwrap();

        assert_eq!(subscription.subscriber_name, "John");
        assert_eq!(subscription.book_id.as_str(), "B1212");
        assert_eq!(subscription.date_subscribed, date(2020, 6, 12));
        assert!(subscription.is_checked_out());
        assert_eq!(subscription.movement(), CopiesMovement::Checkout);
    }

    #[test]
    fn test_open_subscription_with_return_date_is_a_return() {
        let cmd = CreateSubscription {
            date_returned: Some(date(2020, 5, 14)),
            ..checkout_command()
        };

        let subscription = open_subscription(cmd).unwrap();
        assert_eq!(subscription.movement(), CopiesMovement::Return);
    }

    #[test]
    fn test_open_subscription_rejects_blank_subscriber() {
        let cmd = CreateSubscription {
            subscriber_name: Some("   ".to_string()),
            ..checkout_command()
        };
        assert_eq!(
            open_subscription(cmd),
            Err(SubscriptionValidationError::MissingSubscriberName)
        );

        let cmd = CreateSubscription {
            subscriber_name: None,
            ..checkout_command()
        };
        assert_eq!(
            open_subscription(cmd),
            Err(SubscriptionValidationError::MissingSubscriberName)
        );
    }

    #[test]
    fn test_open_subscription_rejects_missing_date() {
        let cmd = CreateSubscription {
            date_subscribed: None,
            ..checkout_command()
        };
        assert_eq!(
            open_subscription(cmd),
            Err(SubscriptionValidationError::MissingDateSubscribed)
        );
    }

    #[test]
    fn test_open_subscription_rejects_blank_book_id() {
        let cmd = CreateSubscription {
            book_id: Some(String::new()),
            ..checkout_command()
        };
        assert_eq!(
            open_subscription(cmd),
            Err(SubscriptionValidationError::MissingBookId)
        );
    }

    #[test]
    fn test_mark_returned_sets_date() {
        let subscription = open_subscription(checkout_command()).unwrap();
        let id = subscription.id;

        let returned = mark_returned(subscription, Some(date(2020, 7, 1))).unwrap();
        assert_eq!(returned.id, id);
        assert_eq!(returned.date_returned, Some(date(2020, 7, 1)));
        assert_eq!(returned.movement(), CopiesMovement::Return);
    }

    #[test]
    fn test_mark_returned_fails_when_already_returned() {
        let subscription = open_subscription(checkout_command()).unwrap();
        let returned = mark_returned(subscription, Some(date(2020, 7, 1))).unwrap();

        assert_eq!(
            mark_returned(returned, Some(date(2020, 7, 2))),
            Err(SubscriptionValidationError::AlreadyReturned)
        );
    }

    #[test]
    fn test_mark_returned_requires_date() {
        let subscription = open_subscription(checkout_command()).unwrap();
        assert_eq!(
            mark_returned(subscription, None),
            Err(SubscriptionValidationError::MissingDateReturned)
        );
    }
}
