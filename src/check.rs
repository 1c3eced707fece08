//! チェックパイプライン
//!
//! 取得（またはキャッシュ再投入）したキー一式を 1 件ずつ参照言語と
//! 比較し、言語別のエラーマップを集めた最終レポートを組み立てる。
/// 実行全体の組み立て
mod pipeline;
/// レポートのデータ型
mod report;
/// 1 キー分のチェック
mod tk;

pub use pipeline::{
    check_translations,
    get_translation_data,
};
pub use report::{
    LanguageFinding,
    Report,
    TkReport,
};

use thiserror::Error;

use crate::config::OptionsError;
use crate::fetch::FetchError;
use crate::tree::TreeError;

/// パイプライン全体を中断させる失敗
///
/// 言語単位の不一致・予期しない失敗はレポートのデータとして回収される
/// ため、ここに現れるのは全体を止めるべきものだけ。
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 入力バリデーション失敗。リモート呼び出し前に拒否される
    #[error(transparent)]
    Validation(#[from] OptionsError),
    /// 取得フェーズの失敗
    #[error(transparent)]
    Fetch(FetchError),
    /// 参照ツリーが構築できない
    #[error("Failed to build the reference tree for '{name}': {source}")]
    Reference {
        /// 対象キー名
        name: String,
        /// 元のエラー
        #[source]
        source: TreeError,
    },
    /// レポートのシリアライズ失敗
    #[error("Failed to serialize the report: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 実行が取り消された
    #[error("the check run was cancelled")]
    Cancelled,
}

impl From<FetchError> for PipelineError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Cancelled => Self::Cancelled,
            other => Self::Fetch(other),
        }
    }
}
