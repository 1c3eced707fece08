//! アリーナ方式のノード格納と識別子
//!
//! 親子関係はインデックスで表現する。親への逆参照を辿る位置文字列の生成
//! （[`Tree::chain_text`]）も単なるインデックス歩行になる。

use std::fmt;

/// アリーナ内のノード位置
///
/// [`Tree`] だけが発行するため、発行元のツリーに対しては常に有効。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// ノードの識別子
///
/// 条件ブロックは整数、表示タグは文字列、整形タグは要素名から合成された
/// ID を持つ。合成ドキュメントルートだけが [`NodeIdent::Root`] となり、
/// 「識別子を持たなければならない」ルールを免除される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeIdent {
    /// 合成ルート（識別子なし）
    Root,
    /// 条件ブロックの整数インデックス
    Index(i64),
    /// 表示タグのタグ名
    Name(String),
    /// 整形タグの合成 ID
    Html(String),
}

impl fmt::Display for NodeIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => f.write_str("ROOT"),
            Self::Index(idx) => write!(f, "{idx}"),
            Self::Name(name) => f.write_str(name),
            Self::Html(tag) => write!(f, "_html_{tag}"),
        }
    }
}

/// ノード種別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// 条件ブロック（合成ルートを含む）
    Conditional,
    /// 表示タグ（葉）
    Display,
    /// 整形タグ
    Formatting,
}

#[derive(Debug, Clone)]
struct Node {
    kind: NodeKind,
    ident: NodeIdent,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// 1 言語分のコンテンツツリー
///
/// `lang` が `None` のツリーが参照（正）側を表す。構築後は不変。
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    lang: Option<String>,
}

impl Tree {
    pub(super) const fn new(lang: Option<String>) -> Self {
        Self { nodes: Vec::new(), lang }
    }

    /// ノードを追加し、親の子リストへ登録する
    pub(super) fn push_node(
        &mut self,
        kind: NodeKind,
        ident: NodeIdent,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node { kind, ident, parent, children: Vec::new() });
        if let Some(parent) = parent {
            if let Some(node) = self.nodes.get_mut(parent.0) {
                node.children.push(id);
            }
        }
        id
    }

    // NodeId はこのアリーナが発行したものだけが渡ってくる
    #[allow(clippy::indexing_slicing)]
    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// ルートノード
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// このツリーがパースされた言語。参照ツリーは `None`
    #[must_use]
    pub fn lang(&self) -> Option<&str> {
        self.lang.as_deref()
    }

    /// ノードの識別子
    #[must_use]
    pub fn ident(&self, id: NodeId) -> &NodeIdent {
        &self.node(id).ident
    }

    /// ノードの種別
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind
    }

    /// ノードの子（構築時の出現順）
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.node(id).children
    }

    /// 兄弟の中から識別子が一致する子を探す
    ///
    /// 識別子は兄弟間でのみ一意であればよく、ツリー全体での一意性は
    /// 要求しない。
    #[must_use]
    pub fn child_by_ident(&self, id: NodeId, ident: &NodeIdent) -> Option<NodeId> {
        self.node(id).children.iter().copied().find(|&child| self.node(child).ident == *ident)
    }

    /// ルートから指定ノードまでの識別子チェーンを `->` で連結した文字列
    #[must_use]
    pub fn chain_text(&self, id: NodeId) -> String {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            chain.push(self.node(node_id).ident.to_string());
            current = self.node(node_id).parent;
        }
        chain.reverse();
        chain.join("->")
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    fn sample_tree() -> (Tree, NodeId) {
        let mut tree = Tree::new(None);
        let root = tree.push_node(NodeKind::Conditional, NodeIdent::Root, None);
        let conditional = tree.push_node(NodeKind::Conditional, NodeIdent::Index(1), Some(root));
        let display =
            tree.push_node(NodeKind::Display, NodeIdent::Name("X".to_string()), Some(conditional));
        (tree, display)
    }

    #[googletest::test]
    fn test_chain_text_walks_to_the_root() {
        let (tree, display) = sample_tree();

        expect_that!(tree.chain_text(display), eq("ROOT->1->X"));
        expect_that!(tree.chain_text(tree.root()), eq("ROOT"));
    }

    #[googletest::test]
    fn test_child_lookup_is_sibling_scoped() {
        let mut tree = Tree::new(None);
        let root = tree.push_node(NodeKind::Conditional, NodeIdent::Root, None);
        let first = tree.push_node(NodeKind::Conditional, NodeIdent::Index(1), Some(root));
        // 別の親の下にある同じ識別子は衝突しない
        let _nested = tree.push_node(NodeKind::Conditional, NodeIdent::Index(1), Some(first));

        expect_that!(tree.child_by_ident(root, &NodeIdent::Index(1)), some(eq(first)));
        expect_that!(tree.child_by_ident(root, &NodeIdent::Index(2)), none());
    }

    #[googletest::test]
    fn test_idents_do_not_cross_variants() {
        expect_that!(NodeIdent::Index(1), not(eq(&NodeIdent::Name("1".to_string()))));
        expect_that!(NodeIdent::Html("b".to_string()).to_string(), eq("_html_b"));
    }
}
