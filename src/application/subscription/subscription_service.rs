use crate::circuit_breaker::CircuitBreaker;
use crate::domain::{
    self, Book, CopiesAdjustmentError, Subscription, SubscriptionId,
    commands::{CreateSubscription, ReturnSubscription},
};
use crate::ports::{BookService, SubscriptionRepository};
use std::sync::Arc;

use super::errors::{Result, SubscriptionApplicationError};
use super::inventory_gateway::{
    CopiesReading, CopiesUpdate, apply_available_copies, fetch_available_copies,
    remote_unavailable,
};

/// 購読サービスの依存関係
///
/// サーキットブレーカーは在庫サービスの論理名（"book-service"）ごとに1つで、
/// 読み取りと書き込みの両方の呼び出しで共有される。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub subscription_repository: Arc<dyn SubscriptionRepository>,
    pub book_service: Arc<dyn BookService>,
    pub circuit_breaker: Arc<CircuitBreaker>,
}

/// すべての購読を取得する
pub async fn list_subscriptions(deps: &ServiceDependencies) -> Result<Vec<Subscription>> {
    deps.subscription_repository
        .find_all()
        .await
        .map_err(SubscriptionApplicationError::RepositoryError)
}

/// IDで購読を取得する
pub async fn get_subscription(
    deps: &ServiceDependencies,
    subscription_id: SubscriptionId,
) -> Result<Subscription> {
    deps.subscription_repository
        .find_by_id(subscription_id)
        .await
        .map_err(SubscriptionApplicationError::RepositoryError)?
        .ok_or(SubscriptionApplicationError::SubscriptionNotFound(subscription_id))
}

/// 購読を作成する
///
/// 処理順序（この順序は変えない）：
/// 1. 入力の検証（失敗時はリモート呼び出しを行わない）
/// 2. 在庫サービスから貸出可能冊数を取得（サーキットブレーカー経由）
/// 3. 貸出なら在庫0で拒否、そうでなければ新しい冊数を計算
/// 4. 在庫サービスへ新しい冊数を書き込み（サーキットブレーカー経由）
/// 5. ローカルに購読を保存
///
/// 2または4が失敗した場合、ローカルには何も保存しない。
///
/// # 一貫性保証
///
/// 2つのサービスをまたぐトランザクションはない。
/// - 同じ書籍への同時リクエストは同じ冊数を読み、後の書き込みが勝つ
/// - 4の成功後に5が失敗すると、在庫だけが更新された状態が残る（ログに記録する）
///
/// # エラー
/// - InvalidRequest: 必須項目の欠落
/// - BookNotFound: 在庫サービスが書籍を知らない
/// - InventoryUnavailable: 在庫0の書籍への貸出
/// - RemoteUnavailable: 在庫サービスに到達できない、またはサーキットがOpen
/// - RepositoryError: ローカル保存の失敗
pub async fn create_subscription(
    deps: &ServiceDependencies,
    cmd: CreateSubscription,
) -> Result<Subscription> {
    // 1. 入力の検証
    let subscription = domain::subscription::open_subscription(cmd)?;

    // 2〜4. 在庫の調整
    coordinate_copies(deps, &subscription).await?;

    // 5. ローカルに保存
    persist(deps, subscription).await
}

/// 貸出中の購読を返却する
///
/// 作成時と同じ手順で在庫を1冊戻し、成功した場合のみ返却日を保存する。
///
/// # エラー
/// - SubscriptionNotFound: 購読が存在しない
/// - InvalidRequest: 返却日がない、または既に返却済み
/// - RemoteUnavailable: 在庫サービスに到達できない、またはサーキットがOpen
pub async fn return_subscription(
    deps: &ServiceDependencies,
    cmd: ReturnSubscription,
) -> Result<Subscription> {
    // 1. 購読を取得して返却日を設定
    let subscription = get_subscription(deps, cmd.subscription_id).await?;
    let returned = domain::subscription::mark_returned(subscription, cmd.date_returned)?;

    // 2〜4. 在庫の調整
    coordinate_copies(deps, &returned).await?;

    // 5. ローカルに保存
    persist(deps, returned).await
}

/// 在庫サービスの冊数を読み取り、購読に応じて1冊増減して書き戻す
async fn coordinate_copies(deps: &ServiceDependencies, subscription: &Subscription) -> Result<Book> {
    let book_id = &subscription.book_id;

    // 読み取り（フォールバック時は在庫数が不明なため、判断せずに中断する）
    let reading = fetch_available_copies(deps, book_id).await?;
    if reading == CopiesReading::Fallback {
        return Err(remote_unavailable(deps));
    }

    // 判断
    let movement = subscription.movement();
    let new_copies = domain::adjust_copies(reading.copies(), movement).map_err(|e| match e {
        CopiesAdjustmentError::NoCopiesAvailable => {
            tracing::warn!(book_id = %book_id, "Book copies not available for subscription");
            SubscriptionApplicationError::InventoryUnavailable(book_id.clone())
        }
        CopiesAdjustmentError::CopiesOverflow => SubscriptionApplicationError::InventoryRejected(
            format!("available copies of {} cannot be increased", book_id),
        ),
    })?;

    // 書き込み
    match apply_available_copies(deps, book_id, new_copies).await? {
        CopiesUpdate::Applied(book) => {
            tracing::info!(
                book_id = %book_id,
                ?movement,
                from = reading.copies(),
                to = book.available_copies,
                "Successfully updated book copies"
            );
            Ok(book)
        }
        CopiesUpdate::Degraded(err) => Err(err),
    }
}

async fn persist(deps: &ServiceDependencies, subscription: Subscription) -> Result<Subscription> {
    if let Err(e) = deps.subscription_repository.save(subscription.clone()).await {
        tracing::error!(
            subscription_id = %subscription.id,
            book_id = %subscription.book_id,
            error = %e,
            "Book copies were updated but the subscription could not be saved"
        );
        return Err(SubscriptionApplicationError::RepositoryError(e));
    }

    Ok(subscription)
}
