use crate::application::subscription::{
    ServiceDependencies, create_subscription as execute_create_subscription,
    get_subscription as execute_get_subscription,
    list_subscriptions as execute_list_subscriptions,
    return_subscription as execute_return_subscription,
};
use crate::domain::SubscriptionId;
use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        CreateSubscriptionRequest, HealthResponse, ReturnSubscriptionRequest,
        SubscriptionResponse,
    },
};

// ============================================================================
// State
// ============================================================================

/// 購読サービスのハンドラー間で共有される状態
#[derive(Clone)]
pub struct SubscriptionAppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Command handlers (POST)
// ============================================================================

/// POST /subscriptions - 新しい購読を作成
///
/// 強制されるビジネスルール:
/// - subscriberName、dateSubscribed、bookIdが揃っていること
/// - 返却日のない購読（貸出）は在庫が1冊以上あること
/// - 在庫サービスの更新が成功した場合のみ購読を保存する
pub async fn create_subscription(
    State(state): State<Arc<SubscriptionAppState>>,
    body: Result<Json<CreateSubscriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscriptionResponse>), ApiError> {
    let Json(req) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let subscription = execute_create_subscription(&state.service_deps, req.to_command()).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubscriptionResponse::from(subscription)),
    ))
}

/// POST /subscriptions/:id/return - 貸出中の購読を返却
///
/// 在庫を1冊戻してから返却日を保存する。
pub async fn return_subscription(
    State(state): State<Arc<SubscriptionAppState>>,
    subscription_id: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ReturnSubscriptionRequest>, JsonRejection>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let Path(subscription_id) = subscription_id.map_err(invalid_path)?;
    let Json(req) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;

    let subscription =
        execute_return_subscription(&state.service_deps, req.to_command(subscription_id)).await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /subscriptions - 購読一覧を取得
pub async fn list_subscriptions(
    State(state): State<Arc<SubscriptionAppState>>,
) -> Result<Json<Vec<SubscriptionResponse>>, ApiError> {
    let subscriptions = execute_list_subscriptions(&state.service_deps).await?;
    Ok(Json(
        subscriptions
            .into_iter()
            .map(SubscriptionResponse::from)
            .collect(),
    ))
}

/// GET /subscriptions/:id - 購読をIDで取得
pub async fn get_subscription(
    State(state): State<Arc<SubscriptionAppState>>,
    subscription_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let Path(subscription_id) = subscription_id.map_err(invalid_path)?;

    let subscription = execute_get_subscription(
        &state.service_deps,
        SubscriptionId::from_uuid(subscription_id),
    )
    .await?;

    Ok(Json(SubscriptionResponse::from(subscription)))
}

/// GET /health - 在庫サービス向けサーキットブレーカーの状態を含む
pub async fn health(State(state): State<Arc<SubscriptionAppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "UP",
        circuit_breaker: Some(state.service_deps.circuit_breaker.metrics()),
    })
}

fn invalid_path(rejection: PathRejection) -> ApiError {
    ApiError::BadRequest(format!("Invalid subscription ID: {}", rejection.body_text()))
}
