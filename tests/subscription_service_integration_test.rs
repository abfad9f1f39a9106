use chrono::NaiveDate;
use library_subscription::adapters::memory::InMemorySubscriptionRepository;
use library_subscription::adapters::mock::BookService as MockBookService;
use library_subscription::application::subscription::{
    ServiceDependencies, SubscriptionApplicationError, create_subscription, get_subscription,
    list_subscriptions, return_subscription,
};
use library_subscription::circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitState, SlidingWindow,
};
use library_subscription::domain::commands::{CreateSubscription, ReturnSubscription};
use library_subscription::domain::{Book, BookId, Subscription, SubscriptionId};
use library_subscription::ports::SubscriptionRepository;
use library_subscription::ports::subscription_repository::Result as RepositoryResult;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// テスト用のヘルパー関数
// ============================================================================

struct TestContext {
    deps: ServiceDependencies,
    book_service: Arc<MockBookService>,
    repository: Arc<InMemorySubscriptionRepository>,
    breaker: Arc<CircuitBreaker>,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn book(id: &str, available_copies: u32, total_copies: u32) -> Book {
    Book {
        id: BookId::parse(id).unwrap(),
        name: format!("Book {}", id),
        author: "Test Author".to_string(),
        available_copies,
        total_copies,
    }
}

/// 2回の呼び出しで評価し、失敗率50%以上でOpenになる設定
fn sensitive_breaker_config() -> CircuitBreakerConfig {
    CircuitBreakerConfig {
        failure_rate_threshold: 50.0,
        sliding_window: SlidingWindow::CountBased(4),
        minimum_number_of_calls: 2,
        wait_duration_in_open_state: Duration::from_secs(10),
        permitted_calls_in_half_open_state: 1,
    }
}

fn setup_with(config: CircuitBreakerConfig) -> TestContext {
    let book_service = Arc::new(MockBookService::new());
    book_service.add_book(book("B1212", 2, 4));
    book_service.add_book(book("B4232", 0, 2));

    let repository = Arc::new(InMemorySubscriptionRepository::new());
    let breaker = Arc::new(CircuitBreaker::new("book-service", config));

    let deps = ServiceDependencies {
        subscription_repository: repository.clone(),
        book_service: book_service.clone(),
        circuit_breaker: breaker.clone(),
    };

    TestContext {
        deps,
        book_service,
        repository,
        breaker,
    }
}

fn setup() -> TestContext {
    setup_with(CircuitBreakerConfig::default())
}

fn checkout(subscriber: &str, book_id: &str) -> CreateSubscription {
    CreateSubscription {
        subscriber_name: Some(subscriber.to_string()),
        date_subscribed: Some(date(2020, 6, 12)),
        date_returned: None,
        book_id: Some(book_id.to_string()),
    }
}

async fn stored_count(ctx: &TestContext) -> usize {
    ctx.repository.find_all().await.unwrap().len()
}

/// 保存だけが常に失敗するリポジトリ
struct UnwritableSubscriptionRepository {
    inner: InMemorySubscriptionRepository,
}

#[async_trait::async_trait]
impl SubscriptionRepository for UnwritableSubscriptionRepository {
    async fn find_all(&self) -> RepositoryResult<Vec<Subscription>> {
        self.inner.find_all().await
    }

    async fn find_by_id(
        &self,
        subscription_id: SubscriptionId,
    ) -> RepositoryResult<Option<Subscription>> {
        self.inner.find_by_id(subscription_id).await
    }

    async fn save(&self, _subscription: Subscription) -> RepositoryResult<()> {
        Err("disk full".into())
    }
}

// ============================================================================
// 正常系
// ============================================================================

#[tokio::test]
async fn test_checkout_decrements_available_copies() {
    let ctx = setup();

    let subscription = create_subscription(&ctx.deps, checkout("John", "B1212"))
        .await
        .unwrap();

    assert_eq!(subscription.subscriber_name, "John");
    assert_eq!(subscription.book_id.as_str(), "B1212");
    assert!(subscription.date_returned.is_none());
    assert_eq!(ctx.book_service.book("B1212").unwrap().available_copies, 1);

    let stored = get_subscription(&ctx.deps, subscription.id).await.unwrap();
    assert_eq!(stored, subscription);
}

#[tokio::test]
async fn test_subscription_with_returned_date_increments_copies() {
    let ctx = setup();

    let cmd = CreateSubscription {
        date_returned: Some(date(2020, 7, 1)),
        ..checkout("Mark", "B4232")
    };
    let subscription = create_subscription(&ctx.deps, cmd).await.unwrap();

    assert_eq!(subscription.date_returned, Some(date(2020, 7, 1)));
    assert_eq!(ctx.book_service.book("B4232").unwrap().available_copies, 1);
}

#[tokio::test]
async fn test_return_restores_copy_and_sets_returned_date() {
    let ctx = setup();

    let subscription = create_subscription(&ctx.deps, checkout("Peter", "B1212"))
        .await
        .unwrap();
    assert_eq!(ctx.book_service.book("B1212").unwrap().available_copies, 1);

    let returned = return_subscription(
        &ctx.deps,
        ReturnSubscription {
            subscription_id: subscription.id,
            date_returned: Some(date(2020, 6, 30)),
        },
    )
    .await
    .unwrap();

    assert_eq!(returned.id, subscription.id);
    assert_eq!(returned.date_returned, Some(date(2020, 6, 30)));
    assert_eq!(ctx.book_service.book("B1212").unwrap().available_copies, 2);

    let stored = get_subscription(&ctx.deps, subscription.id).await.unwrap();
    assert_eq!(stored.date_returned, Some(date(2020, 6, 30)));
}

#[tokio::test]
async fn test_sequential_checkouts_drain_inventory() {
    let ctx = setup();

    create_subscription(&ctx.deps, checkout("John", "B1212"))
        .await
        .unwrap();
    create_subscription(&ctx.deps, checkout("Peter", "B1212"))
        .await
        .unwrap();

    let result = create_subscription(&ctx.deps, checkout("Ann", "B1212")).await;

    assert!(matches!(
        result,
        Err(SubscriptionApplicationError::InventoryUnavailable(_))
    ));
    assert_eq!(ctx.book_service.book("B1212").unwrap().available_copies, 0);
    assert_eq!(list_subscriptions(&ctx.deps).await.unwrap().len(), 2);
}

// ============================================================================
// 在庫による拒否
// ============================================================================

#[tokio::test]
async fn test_checkout_with_zero_copies_is_rejected() {
    let ctx = setup();

    let result = create_subscription(&ctx.deps, checkout("John", "B4232")).await;

    assert!(matches!(
        result,
        Err(SubscriptionApplicationError::InventoryUnavailable(ref id)) if id.as_str() == "B4232"
    ));
    assert_eq!(ctx.book_service.book("B4232").unwrap().available_copies, 0);
    assert_eq!(ctx.book_service.update_calls(), 0);
    assert_eq!(stored_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_unknown_book_is_not_a_breaker_failure() {
    let ctx = setup();

    let result = create_subscription(&ctx.deps, checkout("John", "B9999")).await;

    assert!(matches!(
        result,
        Err(SubscriptionApplicationError::BookNotFound(_))
    ));
    assert_eq!(ctx.breaker.metrics().failed_calls, 0);
    assert_eq!(ctx.breaker.metrics().buffered_calls, 1);
    assert_eq!(stored_count(&ctx).await, 0);
}

// ============================================================================
// 入力検証
// ============================================================================

#[tokio::test]
async fn test_validation_failures_make_no_remote_calls() {
    let ctx = setup();

    let missing_name = CreateSubscription {
        subscriber_name: Some("   ".to_string()),
        ..checkout("John", "B1212")
    };
    let missing_date = CreateSubscription {
        date_subscribed: None,
        ..checkout("John", "B1212")
    };
    let missing_book = CreateSubscription {
        book_id: None,
        ..checkout("John", "B1212")
    };

    for cmd in [missing_name, missing_date, missing_book] {
        let result = create_subscription(&ctx.deps, cmd).await;
        assert!(matches!(
            result,
            Err(SubscriptionApplicationError::InvalidRequest(_))
        ));
    }

    assert_eq!(ctx.book_service.get_calls(), 0);
    assert_eq!(ctx.book_service.update_calls(), 0);
    assert_eq!(stored_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_return_errors() {
    let ctx = setup();

    let unknown = return_subscription(
        &ctx.deps,
        ReturnSubscription {
            subscription_id: SubscriptionId::new(),
            date_returned: Some(date(2020, 6, 30)),
        },
    )
    .await;
    assert!(matches!(
        unknown,
        Err(SubscriptionApplicationError::SubscriptionNotFound(_))
    ));

    let subscription = create_subscription(&ctx.deps, checkout("John", "B1212"))
        .await
        .unwrap();
    let calls_before = ctx.book_service.get_calls();

    let missing_date = return_subscription(
        &ctx.deps,
        ReturnSubscription {
            subscription_id: subscription.id,
            date_returned: None,
        },
    )
    .await;
    assert!(matches!(
        missing_date,
        Err(SubscriptionApplicationError::InvalidRequest(_))
    ));

    return_subscription(
        &ctx.deps,
        ReturnSubscription {
            subscription_id: subscription.id,
            date_returned: Some(date(2020, 6, 30)),
        },
    )
    .await
    .unwrap();

    let twice = return_subscription(
        &ctx.deps,
        ReturnSubscription {
            subscription_id: subscription.id,
            date_returned: Some(date(2020, 7, 1)),
        },
    )
    .await;
    assert!(matches!(
        twice,
        Err(SubscriptionApplicationError::InvalidRequest(_))
    ));

    // 成功した返却1回分の読み取りのみ
    assert_eq!(ctx.book_service.get_calls(), calls_before + 1);
}

// ============================================================================
// リモート障害とサーキットブレーカー
// ============================================================================

#[tokio::test]
async fn test_unreachable_inventory_returns_unavailable() {
    let ctx = setup();
    ctx.book_service.set_unreachable(true);

    let result = create_subscription(&ctx.deps, checkout("John", "B1212")).await;

    match result {
        Err(SubscriptionApplicationError::RemoteUnavailable { message, .. }) => {
            assert!(message.starts_with("Book service is temporarily unavailable"));
        }
        other => panic!("expected RemoteUnavailable, got {:?}", other),
    }
    assert_eq!(ctx.breaker.metrics().failed_calls, 1);
    assert_eq!(ctx.book_service.update_calls(), 0);
    assert_eq!(stored_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_failed_update_persists_nothing() {
    let ctx = setup();
    ctx.book_service.set_updates_failing(true);

    let result = create_subscription(&ctx.deps, checkout("John", "B1212")).await;

    assert!(matches!(
        result,
        Err(SubscriptionApplicationError::RemoteUnavailable { .. })
    ));
    assert_eq!(ctx.book_service.get_calls(), 1);
    assert_eq!(ctx.book_service.update_calls(), 1);
    assert_eq!(ctx.book_service.book("B1212").unwrap().available_copies, 2);
    assert_eq!(ctx.breaker.metrics().failed_calls, 1);
    assert_eq!(stored_count(&ctx).await, 0);
}

#[tokio::test]
async fn test_save_failure_after_remote_update_is_a_repository_error() {
    let ctx = setup();
    let repository = Arc::new(UnwritableSubscriptionRepository {
        inner: InMemorySubscriptionRepository::new(),
    });
    let deps = ServiceDependencies {
        subscription_repository: repository.clone(),
        book_service: ctx.book_service.clone(),
        circuit_breaker: ctx.breaker.clone(),
    };

    let result = create_subscription(&deps, checkout("John", "B1212")).await;

    assert!(matches!(
        result,
        Err(SubscriptionApplicationError::RepositoryError(_))
    ));
    // 在庫サービス側はすでに更新済み
    assert_eq!(ctx.book_service.update_calls(), 1);
    assert_eq!(ctx.book_service.book("B1212").unwrap().available_copies, 1);
    // リモート呼び出しは成功しているのでブレーカーの失敗にはならない
    assert_eq!(ctx.breaker.metrics().failed_calls, 0);
    assert!(repository.find_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_open_breaker_skips_remote_calls() {
    let ctx = setup_with(sensitive_breaker_config());
    ctx.book_service.set_unreachable(true);

    for _ in 0..2 {
        let result = create_subscription(&ctx.deps, checkout("John", "B1212")).await;
        assert!(matches!(
            result,
            Err(SubscriptionApplicationError::RemoteUnavailable { .. })
        ));
    }
    assert_eq!(ctx.breaker.state(), CircuitState::Open);
    assert_eq!(ctx.book_service.get_calls(), 2);

    // 相手が復旧していても、Open中は呼び出さない
    ctx.book_service.set_unreachable(false);
    let result = create_subscription(&ctx.deps, checkout("John", "B1212")).await;

    match result {
        Err(SubscriptionApplicationError::RemoteUnavailable { retry_after, .. }) => {
            assert!(retry_after > Duration::ZERO);
            assert!(retry_after <= Duration::from_secs(10));
        }
        other => panic!("expected RemoteUnavailable, got {:?}", other),
    }
    assert_eq!(ctx.book_service.get_calls(), 2);
    assert_eq!(ctx.breaker.metrics().not_permitted_calls, 1);
    assert_eq!(stored_count(&ctx).await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_breaker_recovers_after_wait_duration() {
    let ctx = setup_with(sensitive_breaker_config());
    ctx.book_service.set_unreachable(true);

    for _ in 0..2 {
        let _ = create_subscription(&ctx.deps, checkout("John", "B1212")).await;
    }
    assert_eq!(ctx.breaker.state(), CircuitState::Open);

    ctx.book_service.set_unreachable(false);
    tokio::time::advance(Duration::from_secs(10)).await;

    // 待機時間経過後の最初の呼び出しが試行呼び出しとなり、成功でClosedに戻る
    let subscription = create_subscription(&ctx.deps, checkout("John", "B1212"))
        .await
        .unwrap();

    assert_eq!(ctx.breaker.state(), CircuitState::Closed);
    assert_eq!(ctx.book_service.book("B1212").unwrap().available_copies, 1);
    assert_eq!(
        get_subscription(&ctx.deps, subscription.id).await.unwrap(),
        subscription
    );
}

#[tokio::test(start_paused = true)]
async fn test_failed_trial_call_reopens_breaker() {
    let ctx = setup_with(sensitive_breaker_config());
    ctx.book_service.set_unreachable(true);

    for _ in 0..2 {
        let _ = create_subscription(&ctx.deps, checkout("John", "B1212")).await;
    }
    tokio::time::advance(Duration::from_secs(10)).await;

    let result = create_subscription(&ctx.deps, checkout("John", "B1212")).await;

    assert!(matches!(
        result,
        Err(SubscriptionApplicationError::RemoteUnavailable { .. })
    ));
    assert_eq!(ctx.breaker.state(), CircuitState::Open);
    assert_eq!(ctx.book_service.get_calls(), 3);
}
