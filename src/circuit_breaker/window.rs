use std::collections::VecDeque;
use tokio::time::Instant;

use super::SlidingWindow;

/// 呼び出し結果の記録
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Outcome {
    Success,
    Failure,
}

/// 直近の呼び出し結果を保持するウィンドウ
#[derive(Debug)]
pub(super) struct OutcomeWindow {
    kind: SlidingWindow,
    entries: VecDeque<(Instant, Outcome)>,
}

impl OutcomeWindow {
    pub(super) fn new(kind: SlidingWindow) -> Self {
        Self {
            kind,
            entries: VecDeque::new(),
        }
    }

    pub(super) fn record(&mut self, outcome: Outcome, now: Instant) {
        self.entries.push_back((now, outcome));
        self.evict(now);
    }

    pub(super) fn clear(&mut self) {
        self.entries.clear();
    }

    /// (記録件数, 失敗件数)
    pub(super) fn counts(&mut self, now: Instant) -> (usize, usize) {
        self.evict(now);
        let failures = self
            .entries
            .iter()
            .filter(|(_, outcome)| *outcome == Outcome::Failure)
            .count();
        (self.entries.len(), failures)
    }

    fn evict(&mut self, now: Instant) {
        match self.kind {
            SlidingWindow::CountBased(size) => {
                while self.entries.len() > size {
                    self.entries.pop_front();
                }
            }
            SlidingWindow::TimeBased(span) => {
                while let Some((at, _)) = self.entries.front() {
                    if now.duration_since(*at) < span {
                        break;
                    }
                    self.entries.pop_front();
                }
            }
        }
    }
}
