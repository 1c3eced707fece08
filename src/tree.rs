//! コンテンツツリーモデル
//!
//! 1 言語分のマークアップをパースし、条件ブロック・表示タグ・整形タグの
//! 構造だけを残したツリーとして保持する。比較は [`compare`] が行う。
/// 生要素ツリーへのパース
mod markup;
/// アリーナ方式のノード格納
mod node;
/// 分類と平坦化を含むツリー構築
mod builder;
/// 参照ツリーと翻訳ツリーの構造比較
mod diff;

pub use diff::{
    CompareError,
    Mismatch,
    compare,
};
pub use markup::{
    RawElement,
    parse_markup,
};
pub use node::{
    NodeId,
    NodeIdent,
    NodeKind,
    Tree,
};

use thiserror::Error;

/// ツリー構築時の致命的エラー
///
/// 差分比較の不一致（[`Mismatch`]）とは異なり、レポートへ回収されずに
/// 呼び出し側へ即座に返る。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// マークアップがパースできない
    #[error("Failed to parse markup: {0}")]
    Parse(String),
    /// ルート以外の条件ブロックに整数の data-idx が無い
    #[error("Found a conditional without a data-idx")]
    ConditionalWithoutIndex,
    /// 表示タグに data-tag-name が無い
    #[error("Found a display tag without a name")]
    DisplayWithoutName,
}
