//! 1 キー分のチェック処理
//!
//! 参照ツリーは 1 度だけ構築し、取得済みの各言語と比較する。言語単位の
//! 失敗はすべてレポートのエントリへ回収し、ここから上へは参照側の構築
//! 失敗だけが伝播する。

use chrono::{
    DateTime,
    Utc,
};
use thiserror::Error;

use super::PipelineError;
use super::report::{
    LanguageFinding,
    TkReport,
};
use crate::fetch::{
    LanguageVersion,
    TranslationKey,
};
use crate::tree::{
    CompareError,
    Tree,
    TreeError,
    compare,
};

/// 内容欠落系の不一致が指す位置（参照ツリーのルート）
const ROOT_LOCATION: &str = "ROOT";

/// 1 キー分のチェックに必要な設定
#[derive(Debug, Clone, Default)]
pub(super) struct CheckSettings {
    /// 参照言語。`None` でマスターを使用
    pub correct_lang: Option<String>,
    /// 整形タグを比較から除外するか
    pub ignore_formatting: bool,
    /// この時刻より古い翻訳を未編集として報告する
    pub check_edited_since: Option<DateTime<Utc>>,
    /// エラーの無い言語も `null` として残すか
    pub show_non_errors: bool,
}

/// 言語 1 件分の失敗（分類前）
#[derive(Debug, Error)]
enum LanguageFailure {
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error(transparent)]
    Compare(#[from] CompareError),
}

/// キー 1 件を参照言語と比較してレポート化する
pub(super) fn check_tk(
    tk: &TranslationKey,
    settings: &CheckSettings,
) -> Result<TkReport, PipelineError> {
    // 参照マークアップ: 設定された参照言語のコンテンツ、無ければマスター
    let correct_markup = settings
        .correct_lang
        .as_ref()
        .and_then(|lang| tk.languages.get(lang))
        .and_then(|version| version.markup.as_deref())
        .unwrap_or(&tk.master);

    let correct = Tree::parse(correct_markup, None, settings.ignore_formatting)
        .map_err(|source| PipelineError::Reference { name: tk.name.clone(), source })?;

    let mut languages = std::collections::BTreeMap::new();
    for (lang, version) in &tk.languages {
        let finding = check_language(&correct, lang, version, settings);
        if finding.is_some() || settings.show_non_errors {
            languages.insert(lang.clone(), finding);
        }
    }

    Ok(TkReport {
        name: tk.name.clone(),
        id: tk.id,
        pool_id: tk.pool_id,
        last_modified: tk.last_modified,
        languages,
    })
}

fn check_language(
    correct: &Tree,
    lang: &str,
    version: &LanguageVersion,
    settings: &CheckSettings,
) -> Option<LanguageFinding> {
    let Some(markup) = version.markup.as_deref() else {
        return Some(LanguageFinding::Mismatch {
            message: "Translation was empty".to_string(),
            location: ROOT_LOCATION.to_string(),
        });
    };

    if let Some(cutoff) = settings.check_edited_since {
        if version.last_modified.is_some_and(|modified| modified < cutoff) {
            return Some(LanguageFinding::Mismatch {
                message: format!("Not edited since {}", cutoff.to_rfc3339()),
                location: ROOT_LOCATION.to_string(),
            });
        }
    }

    match compare_language(correct, lang, markup, settings.ignore_formatting) {
        Ok(()) => None,
        Err(LanguageFailure::Compare(CompareError::Mismatch(mismatch))) => {
            Some(LanguageFinding::Mismatch {
                message: mismatch.message,
                location: mismatch.location,
            })
        }
        Err(failure) => {
            tracing::warn!(lang, error = %failure, "Unexpected failure while checking language");
            Some(LanguageFinding::Unexpected {
                message: "Error doing TK lang".to_string(),
                input: markup.to_string(),
            })
        }
    }
}

fn compare_language(
    correct: &Tree,
    lang: &str,
    markup: &str,
    ignore_formatting: bool,
) -> Result<(), LanguageFailure> {
    let tree = Tree::parse(markup, Some(lang.to_string()), ignore_formatting)?;
    compare(correct, &tree)?;
    Ok(())
}
