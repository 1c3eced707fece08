//! Core types shared throughout the project.

use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

/// プラットフォームが扱う全言語コード
pub const ALL_LANGS: [&str; 24] = [
    "BG", "HR", "CS", "DA", "NL", "EN", "ET", "FI", "FR", "DE", "EL", "HU", "IT", "LT", "NO", "PL",
    "PT", "RO", "RU", "SK", "SL", "ES", "SV", "SE",
];

/// 協調的キャンセルトークン
///
/// クローンはすべて同じフラグを共有する。長時間処理は各サスペンドポイントで
/// [`CancellationToken::is_cancelled`] を確認し、致命的エラーの発生側は
/// [`CancellationToken::cancel`] でフラグを踏んで姉妹タスクも停止させる。
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// 新しいトークンを作成
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// キャンセルを要求する
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// キャンセルが要求されているか
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn test_cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();

        expect_that!(clone.is_cancelled(), eq(false));

        token.cancel();

        expect_that!(clone.is_cancelled(), eq(true));
    }
}
