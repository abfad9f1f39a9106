/// 在庫数計算のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopiesAdjustmentError {
    /// 貸出可能な在庫がない
    NoCopiesAvailable,
    /// 返却で在庫数が表現可能な範囲を超えた
    CopiesOverflow,
}

/// 購読リクエストの入力エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionValidationError {
    /// 購読者名が空
    MissingSubscriberName,
    /// 購読日がない
    MissingDateSubscribed,
    /// 書籍IDが空
    MissingBookId,
    /// 返却日がない（返却操作時）
    MissingDateReturned,
    /// 既に返却済み
    AlreadyReturned,
}

impl SubscriptionValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            Self::MissingSubscriberName => "subscriberName is required and cannot be empty",
            Self::MissingDateSubscribed => "dateSubscribed is required",
            Self::MissingBookId => "bookId is required and cannot be empty",
            Self::MissingDateReturned => "dateReturned is required",
            Self::AlreadyReturned => "subscription has already been returned",
        }
    }
}
