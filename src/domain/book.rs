use serde::{Deserialize, Serialize};

use super::{BookId, CopiesAdjustmentError};

/// 書籍（在庫コンテキストの集約）
///
/// `available_copies`は在庫更新操作を通してのみ変更される。
/// `total_copies`との大小関係はこの層では検証しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub author: String,
    pub available_copies: u32,
    pub total_copies: u32,
}

impl Book {
    /// 貸出可能冊数を上書きした書籍を返す
    pub fn with_available_copies(self, available_copies: u32) -> Self {
        Self {
            available_copies,
            ..self
        }
    }
}

/// 在庫を動かす購読の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopiesMovement {
    /// 貸出（返却日なし）: 1冊減らす
    Checkout,
    /// 返却（返却日あり）: 1冊戻す
    Return,
}

/// 直前に読み取った貸出可能冊数から、書き戻す冊数を計算する（純粋な関数）
///
/// ビジネスルール：
/// - 貸出は在庫が1冊以上あるときのみ可能
/// - 返却は現在の在庫数に関わらず1冊戻す
///
/// 読み取りから書き込みまでの間に他のリクエストが在庫を変更した場合、
/// その変更は上書きされる（在庫サービス側は後勝ち）。
pub fn adjust_copies(
    available_copies: u32,
    movement: CopiesMovement,
) -> Result<u32, CopiesAdjustmentError> {
    match movement {
        CopiesMovement::Checkout => available_copies
            .checked_sub(1)
            .ok_or(CopiesAdjustmentError::NoCopiesAvailable),
        CopiesMovement::Return => available_copies
            .checked_add(1)
            .ok_or(CopiesAdjustmentError::CopiesOverflow),
    }
}
