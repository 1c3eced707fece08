//! 取得データの型定義
//!
//! ワイヤ形状（camelCase）は旧キャッシュファイルとの互換を保つ。

use std::collections::BTreeMap;

use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};

/// 1 言語分の取得済みコンテンツ
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageVersion {
    /// マークアップ。プラットフォームに内容が無い言語は `None`
    pub markup: Option<String>,
    /// 最終更新時刻（プラットフォームが返す場合のみ）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
}

/// 監査対象の 1 コンテンツ項目（Translation Key）
///
/// 取得オーケストレーションが API 応答から組み立て、以後は不変。
/// チェックパイプラインが 1 度だけ消費する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationKey {
    /// キー ID
    pub id: i64,
    /// キー名
    pub name: String,
    /// 所属プール ID
    pub pool_id: i64,
    /// キー全体の最終更新時刻
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// マスター（参照）マークアップ
    pub master: String,
    /// 言語コード → 取得済みコンテンツ
    pub languages: BTreeMap<String, LanguageVersion>,
}

/// 取得済みキーの生データ一式
///
/// ファイルに保存しておき、後続の実行でディスパッチャを完全に迂回する
/// キャッシュとして再投入できる。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationData {
    /// 取得済みキー
    pub data: Vec<TranslationKey>,
}

/// プール一覧 API の 1 エントリ
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PoolKeyDto {
    pub name: String,
    pub translation_key_id: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

/// 言語別コンテンツ API の 1 エントリ（要求言語と位置で対応する）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LanguageEntryDto {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}
