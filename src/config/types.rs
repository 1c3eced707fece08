//! 実行オプションと検証エラーの型

use chrono::{
    DateTime,
    Utc,
};
use serde::Deserialize;
use thiserror::Error;

use crate::fetch::TranslationData;
use crate::types::CancellationToken;

/// 出力フォーマット
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON レポート
    #[default]
    Json,
    /// CSV テーブル
    Csv,
}

/// 1 フィールド分の検証エラー
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field_path}: {message}")]
pub struct ValidationError {
    /// 入力のフィールドパス（例: "poolIds"）
    pub field_path: String,
    /// 何が悪いか
    pub message: String,
}

impl ValidationError {
    /// 検証エラーを作る
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// オプション全体の検証失敗
#[derive(Error, Debug)]
pub enum OptionsError {
    /// 集約された検証エラー。リモート呼び出し前に検出され、再試行されない
    #[error("Input failed validation with the following messages:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// チェック実行の入力一式
///
/// HTTP ボディ（camelCase）からそのまま復元できる。`translation_data` を
/// 指定した実行ではリモート取得に関わるフィールドは無視される。
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CheckOptions {
    /// キーを探索するプール ID
    pub pool_ids: Vec<i64>,
    /// API 呼び出しに使うアクセストークン
    pub access_token: String,
    /// プラットフォームのオリジン
    pub origin: String,
    /// 対象言語。`None` で全言語
    pub langs: Option<Vec<String>>,
    /// キー名での絞り込み（`None` で全件）
    pub filter_tk_names: Option<Vec<String>>,
    /// キー ID での絞り込み（`None` で全件）
    pub filter_tk_ids: Option<Vec<i64>>,
    /// 参照言語。`None` でマスターを使用
    pub correct_lang: Option<String>,
    /// 整形タグを比較から除外するか
    pub ignore_formatting: bool,
    /// この時刻より古い翻訳を未編集として報告する
    pub check_edited_since: Option<DateTime<Utc>>,
    /// 出力フォーマット
    pub file_type: OutputFormat,
    /// エラーの無い言語・キーも `null` として残すか
    pub show_non_errors_in_json_output_as_null: bool,
    /// 取得済みキャッシュ。指定時はディスパッチャを完全に迂回する
    pub translation_data: Option<TranslationData>,
    /// 共有キャンセルトークン
    #[serde(skip)]
    pub cancellation: CancellationToken,
}
