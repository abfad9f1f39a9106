use std::time::Duration;
use thiserror::Error;

/// 失敗率を計算するスライディングウィンドウ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlidingWindow {
    /// 直近N回の呼び出し
    CountBased(usize),
    /// 直近の一定時間内の呼び出し
    TimeBased(Duration),
}

/// サーキットブレーカーの設定
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitBreakerConfig {
    /// この失敗率（%）以上でOpenに遷移する
    pub failure_rate_threshold: f64,
    pub sliding_window: SlidingWindow,
    /// 失敗率を評価するために必要な最小呼び出し数
    ///
    /// 件数ベースのウィンドウでは、ウィンドウサイズを上限とする。
    pub minimum_number_of_calls: usize,
    /// OpenからHalf-Openに移るまでの待機時間
    pub wait_duration_in_open_state: Duration,
    /// Half-Open中に通す試行呼び出しの数
    pub permitted_calls_in_half_open_state: u32,
}

/// 設定値の不整合
#[derive(Debug, Error, PartialEq)]
pub enum CircuitBreakerConfigError {
    #[error("failure_rate_threshold must be in (0, 100], got {0}")]
    InvalidFailureRateThreshold(f64),

    #[error("sliding window must be greater than 0")]
    EmptySlidingWindow,

    #[error("minimum_number_of_calls must be greater than 0")]
    ZeroMinimumCalls,

    #[error("permitted_calls_in_half_open_state must be greater than 0")]
    ZeroHalfOpenCalls,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            sliding_window: SlidingWindow::CountBased(10),
            minimum_number_of_calls: 5,
            wait_duration_in_open_state: Duration::from_secs(10),
            permitted_calls_in_half_open_state: 3,
        }
    }
}

impl CircuitBreakerConfig {
    /// 設定値の整合性を確認する
    pub fn validate(&self) -> Result<(), CircuitBreakerConfigError> {
        if !(self.failure_rate_threshold > 0.0 && self.failure_rate_threshold <= 100.0) {
            return Err(CircuitBreakerConfigError::InvalidFailureRateThreshold(
                self.failure_rate_threshold,
            ));
        }
        let empty_window = match self.sliding_window {
            SlidingWindow::CountBased(size) => size == 0,
            SlidingWindow::TimeBased(duration) => duration.is_zero(),
        };
        if empty_window {
            return Err(CircuitBreakerConfigError::EmptySlidingWindow);
        }
        if self.minimum_number_of_calls == 0 {
            return Err(CircuitBreakerConfigError::ZeroMinimumCalls);
        }
        if self.permitted_calls_in_half_open_state == 0 {
            return Err(CircuitBreakerConfigError::ZeroHalfOpenCalls);
        }
        Ok(())
    }

    pub(super) fn effective_minimum_calls(&self) -> usize {
        match self.sliding_window {
            SlidingWindow::CountBased(size) => self.minimum_number_of_calls.min(size),
            SlidingWindow::TimeBased(_) => self.minimum_number_of_calls,
        }
    }
}
