//! 外部サービス呼び出しを保護するサーキットブレーカー
//!
//! # 状態遷移
//! ```text
//! Closed    → Open      : ウィンドウ内の失敗率がしきい値以上
//! Open      → Half-Open : 待機時間経過後の最初の呼び出し時（遅延評価）
//! Half-Open → Closed    : 試行呼び出しが1回成功
//! Half-Open → Open      : 試行呼び出しが1回失敗
//! ```
//!
//! 状態は呼び出し元で共有される（`Arc<CircuitBreaker>`）。
//! 内部の`Mutex`はawaitをまたいで保持しない。

mod config;
mod window;

pub use config::{CircuitBreakerConfig, CircuitBreakerConfigError, SlidingWindow};

use serde::Serialize;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use window::{Outcome, OutcomeWindow};

/// エラーがサーキットブレーカーの失敗として数えられるか
///
/// 相手が正しく応答した業務上のエラーは`false`を返す。
pub trait BreakerFailure {
    fn is_breaker_failure(&self) -> bool;
}

/// サーキットブレーカーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// 保護された呼び出しの失敗
#[derive(Debug)]
pub enum CallError<E> {
    /// 呼び出しは行われなかった（Open、またはHalf-Openの試行枠が埋まっている）
    NotPermitted { retry_after: Duration },
    /// 呼び出しが失敗し、失敗として記録された
    Failed(E),
    /// 相手が業務上のエラーを返した（成功として記録された）
    Rejected(E),
}

/// フォールバックに渡される中断理由
#[derive(Debug)]
pub enum Interruption<E> {
    NotPermitted { retry_after: Duration },
    Failed(E),
}

/// 監視用のスナップショット
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircuitBreakerMetrics {
    pub name: String,
    pub state: CircuitState,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    /// 最小呼び出し数に達していない場合は`None`
    pub failure_rate: Option<f64>,
    pub not_permitted_calls: u64,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    /// 状態遷移ごとに増える。遷移前に許可された呼び出しの結果を捨てるために使う。
    generation: u64,
    window: OutcomeWindow,
    opened_at: Option<Instant>,
    half_open_permits_issued: u32,
    not_permitted_calls: u64,
}

/// 呼び出し許可
///
/// 結果が記録されずに破棄された場合（キャンセル）、Half-Openの試行枠を返却する。
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl Permit<'_> {
    fn settle(mut self, outcome: Outcome) {
        self.settled = true;
        self.breaker.on_result(self.generation, outcome);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release_permit(self.generation);
        }
    }
}

/// サーキットブレーカー
///
/// リモートサービスの論理名ごとに1つ作成し、同じサービスへのすべての呼び出し
/// （読み取り・書き込み）で共有する。
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let window = OutcomeWindow::new(config.sliding_window);
        Self {
            name: name.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                generation: 0,
                window,
                opened_at: None,
                half_open_permits_issued: 0,
                not_permitted_calls: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// 現在の状態
    ///
    /// Openの待機時間が経過していても、次の呼び出しまではOpenのまま。
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// 保護された呼び出しを実行する
    pub async fn call<T, E, F, Fut>(&self, operation: F) -> Result<T, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: BreakerFailure,
    {
        let permit = self
            .try_acquire()
            .map_err(|retry_after| CallError::NotPermitted { retry_after })?;

        match operation().await {
            Ok(value) => {
                permit.settle(Outcome::Success);
                Ok(value)
            }
            Err(err) if err.is_breaker_failure() => {
                permit.settle(Outcome::Failure);
                Err(CallError::Failed(err))
            }
            Err(err) => {
                permit.settle(Outcome::Success);
                Err(CallError::Rejected(err))
            }
        }
    }

    /// 保護された呼び出しを実行し、中断時はフォールバックの結果を返す
    ///
    /// 業務上のエラー（`Rejected`）はフォールバックせず`Err`で返す。
    pub async fn call_with_fallback<T, E, F, Fut, FB>(
        &self,
        operation: F,
        fallback: FB,
    ) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: BreakerFailure,
        FB: FnOnce(Interruption<E>) -> T,
    {
        match self.call(operation).await {
            Ok(value) => Ok(value),
            Err(CallError::Rejected(err)) => Err(err),
            Err(CallError::Failed(err)) => Ok(fallback(Interruption::Failed(err))),
            Err(CallError::NotPermitted { retry_after }) => {
                Ok(fallback(Interruption::NotPermitted { retry_after }))
            }
        }
    }

    /// クライアントに返す再試行までの目安
    ///
    /// Open中は残りの待機時間、それ以外は設定された待機時間。
    pub fn retry_after_hint(&self) -> Duration {
        let inner = self.lock();
        match (inner.state, inner.opened_at) {
            (CircuitState::Open, Some(opened_at)) => self
                .config
                .wait_duration_in_open_state
                .saturating_sub(opened_at.elapsed()),
            _ => self.config.wait_duration_in_open_state,
        }
    }

    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let mut inner = self.lock();
        let (buffered_calls, failed_calls) = inner.window.counts(Instant::now());
        let failure_rate = (buffered_calls >= self.config.effective_minimum_calls())
            .then(|| failure_rate(buffered_calls, failed_calls));

        CircuitBreakerMetrics {
            name: self.name.clone(),
            state: inner.state,
            buffered_calls,
            failed_calls,
            failure_rate,
            not_permitted_calls: inner.not_permitted_calls,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Result<Permit<'_>, Duration> {
        let mut inner = self.lock();
        let now = Instant::now();

        if inner.state == CircuitState::Open {
            let opened_at = inner.opened_at.unwrap_or(now);
            let elapsed = now.duration_since(opened_at);
            if elapsed < self.config.wait_duration_in_open_state {
                inner.not_permitted_calls += 1;
                return Err(self.config.wait_duration_in_open_state - elapsed);
            }
            self.transition(&mut inner, CircuitState::HalfOpen, now);
        }

        if inner.state == CircuitState::HalfOpen {
            if inner.half_open_permits_issued >= self.config.permitted_calls_in_half_open_state {
                inner.not_permitted_calls += 1;
                return Err(self.config.wait_duration_in_open_state);
            }
            inner.half_open_permits_issued += 1;
        }

        Ok(Permit {
            breaker: self,
            generation: inner.generation,
            settled: false,
        })
    }

    fn release_permit(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.half_open_permits_issued = inner.half_open_permits_issued.saturating_sub(1);
        }
    }

    fn on_result(&self, generation: u64, outcome: Outcome) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(
                breaker = %self.name,
                "Discarding result of a call permitted before the last state transition"
            );
            return;
        }

        let now = Instant::now();
        match (inner.state, outcome) {
            (CircuitState::Closed, _) => {
                inner.window.record(outcome, now);
                let (total, failures) = inner.window.counts(now);
                if total >= self.config.effective_minimum_calls() {
                    let rate = failure_rate(total, failures);
                    if rate >= self.config.failure_rate_threshold {
                        tracing::warn!(
                            breaker = %self.name,
                            failure_rate = rate,
                            threshold = self.config.failure_rate_threshold,
                            "Failure rate reached threshold"
                        );
                        self.transition(&mut inner, CircuitState::Open, now);
                    }
                }
            }
            (CircuitState::HalfOpen, Outcome::Success) => {
                self.transition(&mut inner, CircuitState::Closed, now);
            }
            (CircuitState::HalfOpen, Outcome::Failure) => {
                self.transition(&mut inner, CircuitState::Open, now);
            }
            (CircuitState::Open, _) => {}
        }
    }

    fn transition(&self, inner: &mut Inner, to: CircuitState, now: Instant) {
        let from = inner.state;
        inner.state = to;
        inner.generation += 1;
        inner.half_open_permits_issued = 0;

        match to {
            CircuitState::Open => {
                inner.opened_at = Some(now);
                tracing::warn!(breaker = %self.name, ?from, ?to, "Circuit breaker opened");
            }
            CircuitState::HalfOpen => {
                tracing::info!(breaker = %self.name, ?from, ?to, "Circuit breaker half-open");
            }
            CircuitState::Closed => {
                inner.opened_at = None;
                inner.window.clear();
                tracing::info!(breaker = %self.name, ?from, ?to, "Circuit breaker closed");
            }
        }
    }
}

fn failure_rate(total: usize, failures: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    failures as f64 * 100.0 / total as f64
}
