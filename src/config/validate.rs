//! 入力検証と既定値の適用
//!
//! 失敗は 1 件ずつ集め、最後にまとめて返す。呼び出し側は 1 回の往復で
//! すべての問題を知ることができる。

use super::types::{
    CheckOptions,
    OptionsError,
    ValidationError,
};
use crate::fetch::FetchOptions;
use crate::types::ALL_LANGS;

impl CheckOptions {
    /// 全フィールドを検証し、失敗をまとめて返す
    ///
    /// `translation_data` が与えられている場合、リモート取得に関わる
    /// フィールド（origin・accessToken・poolIds・フィルタ）は検証しない。
    pub fn validate(&self) -> Result<(), OptionsError> {
        let mut errors = Vec::new();
        let has_cached_data = self.translation_data.is_some();

        if !has_cached_data {
            if self.origin.is_empty() {
                errors.push(ValidationError::new("origin", "must be a non-empty string"));
            }
            if self.access_token.is_empty() {
                errors.push(ValidationError::new("accessToken", "must be a non-empty string"));
            }
            if self.pool_ids.is_empty() {
                errors
                    .push(ValidationError::new("poolIds", "must be a non-empty array of integers"));
            }
            if let Some(names) = &self.filter_tk_names {
                if names.is_empty() || names.iter().any(String::is_empty) {
                    errors.push(ValidationError::new(
                        "filterTkNames",
                        "if specified, must be a non-empty array of names",
                    ));
                }
            }
            if let Some(ids) = &self.filter_tk_ids {
                if ids.is_empty() {
                    errors.push(ValidationError::new(
                        "filterTkIds",
                        "if specified, must be a non-empty array of integers",
                    ));
                }
            }
        }

        if let Some(langs) = &self.langs {
            if langs.is_empty() || langs.iter().any(|lang| lang.chars().count() != 2) {
                errors.push(ValidationError::new(
                    "langs",
                    "if specified, must be a non-empty array of two-letter codes",
                ));
            }
        }

        if let Some(correct) = &self.correct_lang {
            if correct.chars().count() != 2 {
                errors.push(ValidationError::new(
                    "correctLang",
                    "must be a two-letter code, or null to use the master",
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(OptionsError::ValidationErrors(errors)) }
    }

    /// 既定値を適用した実行用オプションを返す
    ///
    /// 言語未指定は全言語になり、参照言語が対象に含まれていなければ
    /// 先頭へ追加する。
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        let mut langs = self
            .langs
            .take()
            .unwrap_or_else(|| ALL_LANGS.iter().map(ToString::to_string).collect());
        if let Some(correct) = &self.correct_lang {
            if !langs.contains(correct) {
                langs.insert(0, correct.clone());
            }
        }
        self.langs = Some(langs);
        self
    }

    /// 取得フェーズへ渡すオプションを切り出す
    #[must_use]
    pub(crate) fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            pool_ids: self.pool_ids.clone(),
            langs: self.langs.clone().unwrap_or_default(),
            filter_tk_names: self.filter_tk_names.clone(),
            filter_tk_ids: self.filter_tk_ids.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;
    use crate::fetch::TranslationData;

    fn valid_options() -> CheckOptions {
        CheckOptions {
            pool_ids: vec![1],
            access_token: "token".to_string(),
            origin: "https://example.com".to_string(),
            ..CheckOptions::default()
        }
    }

    #[googletest::test]
    fn test_valid_options_pass() {
        expect_that!(valid_options().validate(), ok(anything()));
    }

    #[googletest::test]
    fn test_all_failures_are_collected_into_one_error() {
        let options = CheckOptions {
            langs: Some(vec!["DEU".to_string()]),
            correct_lang: Some("E".to_string()),
            ..CheckOptions::default()
        };

        let error = options.validate().unwrap_err();
        let OptionsError::ValidationErrors(errors) = &error;

        // origin / accessToken / poolIds / langs / correctLang の 5 件
        expect_that!(errors.len(), eq(5));
        expect_that!(error.to_string().contains("correctLang"), eq(true));
    }

    #[rstest]
    #[case::empty_names(Some(vec![]), None)]
    #[case::empty_ids(None, Some(vec![]))]
    fn test_empty_filters_are_rejected(
        #[case] names: Option<Vec<String>>,
        #[case] ids: Option<Vec<i64>>,
    ) {
        let options =
            CheckOptions { filter_tk_names: names, filter_tk_ids: ids, ..valid_options() };

        assert!(options.validate().is_err());
    }

    #[googletest::test]
    fn test_cached_data_waives_the_fetch_fields() {
        let options = CheckOptions {
            translation_data: Some(TranslationData::default()),
            ..CheckOptions::default()
        };

        expect_that!(options.validate(), ok(anything()));
    }

    #[googletest::test]
    fn test_defaults_fill_all_langs() {
        let options = valid_options().with_defaults();

        expect_that!(options.langs.unwrap().len(), eq(ALL_LANGS.len()));
    }

    #[googletest::test]
    fn test_correct_lang_is_prepended_when_missing() {
        let options = CheckOptions {
            langs: Some(vec!["FR".to_string(), "DE".to_string()]),
            correct_lang: Some("EN".to_string()),
            ..valid_options()
        };

        let langs = options.with_defaults().langs.unwrap();

        expect_that!(
            langs,
            eq(&vec!["EN".to_string(), "FR".to_string(), "DE".to_string()])
        );
    }
}
