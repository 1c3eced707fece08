//! リモート API からの翻訳キー取得
//!
//! すべての呼び出しはディスパッチャ経由で行い、プール単位・キー単位で
//! 並行にファンアウトする。キャンセルは各リモート呼び出しの前後で
//! 協調的に確認する。
/// API クライアント
mod client;
/// プール・キー単位のファンアウト
mod orchestrator;
/// 取得データの型定義
mod types;

pub use client::ApiClient;
pub use orchestrator::{
    FetchOptions,
    fetch_all_tks,
    fetch_translation_data,
};
pub use types::{
    LanguageVersion,
    TranslationData,
    TranslationKey,
};

use thiserror::Error;

use crate::dispatcher::FactoryError;

/// 取得フェーズの失敗
#[derive(Debug, Error)]
pub enum FetchError {
    /// ディスパッチャ経由のリクエスト失敗（再試行し尽くした後）
    #[error(transparent)]
    Factory(#[from] FactoryError),
    /// API 応答が期待した形をしていない
    #[error("Failed to decode API response: {0}")]
    Decode(String),
    /// キャンセルが要求された
    #[error("the fetch was cancelled")]
    Cancelled,
}
