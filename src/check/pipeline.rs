//! チェック実行全体の組み立て
//!
//! 入力検証 → 既定値の適用 → 取得（またはキャッシュ再投入）→ キー別
//! チェック → レポート整形、の順に進む。途中で脱出した失敗は共有
//! キャンセルトークンを踏んでから呼び出し側へ伝える。

use std::collections::BTreeMap;

use super::PipelineError;
use super::report::Report;
use super::tk::{
    CheckSettings,
    check_tk,
};
use crate::config::CheckOptions;
use crate::fetch::{
    ApiClient,
    TranslationData,
    fetch_all_tks,
    fetch_translation_data,
};
use crate::render::{
    Output,
    render,
};

/// チェック全体を実行し、要求フォーマットで整形済みの出力を返す
///
/// 言語単位の失敗はレポートのデータになる。ここからエラーとして返るのは
/// 検証失敗と、実行全体を止めるべき失敗だけ。
pub async fn check_translations(options: &CheckOptions) -> Result<Output, PipelineError> {
    options.validate()?;
    let options = options.clone().with_defaults();

    let result = run(&options).await;
    if let Err(error) = &result {
        // 致命的エラーは共有トークンを踏み、同じトークンを見ている
        // 姉妹タスクも止める
        options.cancellation.cancel();
        tracing::error!(error = %error, "Translation check run failed");
    }
    result
}

/// チェックを行わず、生データだけを取得して返す（キャッシュ作成用）
///
/// 返ってきた [`TranslationData`] を保存しておけば、後続の実行は
/// `translation_data` 入力としてそのまま再投入でき、リモート呼び出しを
/// 完全に省略できる。
pub async fn get_translation_data(
    options: &CheckOptions,
) -> Result<TranslationData, PipelineError> {
    // 取得に関係するフィールドだけを切り出して検証する
    let reduced = CheckOptions {
        origin: options.origin.clone(),
        access_token: options.access_token.clone(),
        pool_ids: options.pool_ids.clone(),
        filter_tk_ids: options.filter_tk_ids.clone(),
        cancellation: options.cancellation.clone(),
        ..CheckOptions::default()
    };
    reduced.validate()?;
    let reduced = reduced.with_defaults();

    let client = ApiClient::new(reduced.origin.clone(), &reduced.access_token);
    let result =
        fetch_translation_data(&client, &reduced.fetch_options(), &reduced.cancellation).await;
    match result {
        Ok(data) => Ok(data),
        Err(error) => {
            reduced.cancellation.cancel();
            Err(error.into())
        }
    }
}

async fn run(options: &CheckOptions) -> Result<Output, PipelineError> {
    let tks = match &options.translation_data {
        // キャッシュが与えられていればディスパッチャを完全に迂回する
        Some(data) => data.data.clone(),
        None => {
            let client = ApiClient::new(options.origin.clone(), &options.access_token);
            fetch_all_tks(&client, &options.fetch_options(), &options.cancellation).await?
        }
    };

    if options.cancellation.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }

    let settings = CheckSettings {
        correct_lang: options.correct_lang.clone(),
        ignore_formatting: options.ignore_formatting,
        check_edited_since: options.check_edited_since,
        show_non_errors: options.show_non_errors_in_json_output_as_null,
    };

    let mut keys = BTreeMap::new();
    for tk in &tks {
        if options.cancellation.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let report = check_tk(tk, &settings)?;
        // エラーの無いキーは設定が無い限りレポートから落とす
        if report.languages.is_empty() && !settings.show_non_errors {
            continue;
        }
        keys.insert(report.name.clone(), report);
    }
    tracing::debug!(checked = tks.len(), reported = keys.len(), "Check run finished");

    let report = Report { correct_lang: options.correct_lang.clone(), keys };
    let langs = options.langs.clone().unwrap_or_default();
    render(&report, &langs, options.file_type)
}
