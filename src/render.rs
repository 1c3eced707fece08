//! レポートの JSON / CSV 整形
//!
//! CSV はキーごとに 1 行、要求言語ごとに 1 列。セルは
//! `位置 | メッセージ`（位置が無い失敗はメッセージのみ）、問題の無い
//! 言語は空欄になる。末尾に参照言語を示す `Correct:` 行が付く。

use crate::check::{
    LanguageFinding,
    PipelineError,
    Report,
};
use crate::config::OutputFormat;

/// 整形済み出力
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// 出力フォーマット
    pub format: OutputFormat,
    /// 整形済みデータ
    pub data: String,
}

impl Output {
    /// HTTP 応答に使うコンテンツタイプ
    #[must_use]
    pub const fn content_type(&self) -> &'static str {
        match self.format {
            OutputFormat::Json => "application/json",
            OutputFormat::Csv => "text/csv",
        }
    }
}

/// レポートを要求されたフォーマットへ整形する
pub fn render(
    report: &Report,
    langs: &[String],
    format: OutputFormat,
) -> Result<Output, PipelineError> {
    let data = match format {
        OutputFormat::Json => serde_json::to_string(report)?,
        OutputFormat::Csv => to_csv(report, langs),
    };
    Ok(Output { format, data })
}

fn to_csv(report: &Report, langs: &[String]) -> String {
    let mut rows: Vec<Vec<String>> = Vec::new();

    let mut header: Vec<String> =
        ["Pool", "ID", "Name", "Last Modified"].iter().map(ToString::to_string).collect();
    header.extend(langs.iter().cloned());
    rows.push(header);

    for tk in report.keys.values() {
        let mut row = vec![
            tk.pool_id.to_string(),
            tk.id.to_string(),
            tk.name.clone(),
            tk.last_modified.map(|modified| modified.to_rfc3339()).unwrap_or_default(),
        ];
        for lang in langs {
            row.push(match tk.languages.get(lang) {
                Some(Some(LanguageFinding::Mismatch { message, location })) => {
                    format!("{location} | {message}")
                }
                Some(Some(LanguageFinding::Unexpected { message, .. })) => message.clone(),
                _ => String::new(),
            });
        }
        rows.push(row);
    }

    rows.push(vec!["Correct:".to_string(), report.correct_lang_label().to_string()]);

    let lines: Vec<String> = rows
        .iter()
        .map(|row| row.iter().map(|cell| escape_csv(cell)).collect::<Vec<_>>().join(","))
        .collect();
    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

/// RFC 4180 に沿った最小限のエスケープ
fn escape_csv(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}
