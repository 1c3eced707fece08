//! レポートのデータ型
//!
//! JSON のワイヤ形状（camelCase）は旧出力ファイルと互換。

use std::collections::BTreeMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// 1 言語分のチェック結果詳細
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LanguageFinding {
    /// 構造不一致または内容の欠落。`location` は参照ツリー上の位置
    Mismatch {
        /// 人間が読むメッセージ
        message: String,
        /// 参照ツリー上の位置
        location: String,
    },
    /// 予期しない失敗。診断のため元入力を添付する
    Unexpected {
        /// 人間が読むメッセージ
        message: String,
        /// 失敗した言語の元マークアップ
        input: String,
    },
}

/// 1 キー分のチェック結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TkReport {
    /// キー名
    pub name: String,
    /// キー ID
    pub id: i64,
    /// 所属プール ID
    pub pool_id: i64,
    /// キー全体の最終更新時刻
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// 言語コード → 結果。エラーの無い言語は設定時のみ `null` で残る
    pub languages: BTreeMap<String, Option<LanguageFinding>>,
}

/// 実行全体のレポート
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// 参照言語コード。`None` はマスターを表す
    pub correct_lang: Option<String>,
    /// キー名 → キー別レポート（名前順）
    pub keys: BTreeMap<String, TkReport>,
}

impl Report {
    /// 参照言語の表示名
    #[must_use]
    pub fn correct_lang_label(&self) -> &str {
        self.correct_lang.as_deref().unwrap_or("Master")
    }
}
