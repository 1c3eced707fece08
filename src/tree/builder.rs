//! 生要素からのツリー構築
//!
//! 要素の分類（条件ブロック・表示タグ・整形タグ）と、整形タグ無視時の
//! 平坦化をここで行う。識別子の不変条件違反は構築時点で即座に失敗する。

use super::TreeError;
use super::markup::{
    RawElement,
    parse_markup,
};
use super::node::{
    NodeId,
    NodeIdent,
    NodeKind,
    Tree,
};

/// 条件ブロックを示すマーカー要素名
const CONDITIONAL_TAG: &str = "wsd-basicconditional";
/// 合成ドキュメントルートの要素名
const ROOT_TAG: &str = "root";
/// 表示タグ判定に使うコンテンツタグ属性のプレフィックス
const CONTENT_ATTR_PREFIX: &str = "data-tag-";
/// 表示タグの識別子を保持する属性
const DISPLAY_NAME_ATTR: &str = "data-tag-name";
/// 条件ブロックの識別子を保持する属性
const CONDITIONAL_INDEX_ATTR: &str = "data-idx";

/// 要素の分類結果。`None` は構造に関与しない要素（スキップ）
fn classify(element: &RawElement) -> Option<NodeKind> {
    if element.name == CONDITIONAL_TAG {
        return Some(NodeKind::Conditional);
    }
    if element.children.is_empty() {
        if element.has_attribute_with_prefix(CONTENT_ATTR_PREFIX) {
            return Some(NodeKind::Display);
        }
        return None;
    }
    Some(NodeKind::Formatting)
}

fn conditional_ident(element: &RawElement) -> Result<NodeIdent, TreeError> {
    match element
        .attribute(CONDITIONAL_INDEX_ATTR)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
    {
        Some(idx) => Ok(NodeIdent::Index(idx)),
        None if element.name == ROOT_TAG => Ok(NodeIdent::Root),
        None => Err(TreeError::ConditionalWithoutIndex),
    }
}

fn display_ident(element: &RawElement) -> Result<NodeIdent, TreeError> {
    match element.attribute(DISPLAY_NAME_ATTR) {
        Some(name) if !name.is_empty() => Ok(NodeIdent::Name(name.to_string())),
        _ => Err(TreeError::DisplayWithoutName),
    }
}

/// 整形タグを透過させた実効子要素列を返す
///
/// `ignore_formatting` 時、整形タグと分類される子はノードにならず、その
/// 子孫がこの親の子並びへそのまま継ぎ足される（再帰的に平坦化）。
fn effective_children<'el>(element: &'el RawElement, ignore_formatting: bool) -> Vec<&'el RawElement> {
    let mut out = Vec::new();
    for child in &element.children {
        if ignore_formatting && classify(child) == Some(NodeKind::Formatting) {
            out.extend(effective_children(child, ignore_formatting));
        } else {
            out.push(child);
        }
    }
    out
}

impl Tree {
    /// マークアップ文字列からツリーを構築する
    ///
    /// `lang` が `None` のとき参照（正）ツリーになる。
    pub fn parse(
        markup: &str,
        lang: Option<String>,
        ignore_formatting: bool,
    ) -> Result<Self, TreeError> {
        let root = parse_markup(markup)?;
        Self::build(&root, lang, ignore_formatting)
    }

    /// パース済みルート要素からツリーを構築する
    ///
    /// ルート要素は常に条件ブロックとして扱う（合成ルートは識別子ルールを
    /// 免除される）。深さ優先・出現順を保存する。
    pub fn build(
        root: &RawElement,
        lang: Option<String>,
        ignore_formatting: bool,
    ) -> Result<Self, TreeError> {
        let mut tree = Self::new(lang);
        let ident = conditional_ident(root)?;
        let root_id = tree.push_node(NodeKind::Conditional, ident, None);
        build_children(&mut tree, root_id, root, ignore_formatting)?;
        Ok(tree)
    }
}

fn build_children(
    tree: &mut Tree,
    parent: NodeId,
    element: &RawElement,
    ignore_formatting: bool,
) -> Result<(), TreeError> {
    for child in effective_children(element, ignore_formatting) {
        match classify(child) {
            Some(NodeKind::Conditional) => {
                let id =
                    tree.push_node(NodeKind::Conditional, conditional_ident(child)?, Some(parent));
                build_children(tree, id, child, ignore_formatting)?;
            }
            Some(NodeKind::Display) => {
                tree.push_node(NodeKind::Display, display_ident(child)?, Some(parent));
            }
            Some(NodeKind::Formatting) => {
                let id = tree.push_node(
                    NodeKind::Formatting,
                    NodeIdent::Html(child.name.clone()),
                    Some(parent),
                );
                build_children(tree, id, child, ignore_formatting)?;
            }
            None => {}
        }
    }
    Ok(())
}
