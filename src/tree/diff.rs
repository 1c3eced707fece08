//! 参照ツリーと翻訳ツリーの再帰的構造比較
//!
//! 比較は常に参照（正）側を基準に行う。最初に見つかった分岐点を
//! 参照側ノードの祖先チェーンつきで報告する。

use thiserror::Error;

use super::node::{
    NodeId,
    NodeKind,
    Tree,
};

/// 構造不一致
///
/// `location` は参照側ノードの祖先チェーン（ルート → 不一致ノード）。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at {location})")]
pub struct Mismatch {
    /// 人間が読むメッセージ
    pub message: String,
    /// 参照ツリー上の位置
    pub location: String,
}

/// 比較の失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    /// 構造不一致。レポートへ回収される
    #[error(transparent)]
    Mismatch(#[from] Mismatch),
    /// 参照側・翻訳側の組み合わせが不正（プログラミングエラー）
    #[error("Could not sort out the two trees into correct and lang")]
    Order,
}

/// 2 つのツリーを構造比較する
///
/// ちょうど一方が参照ツリー（`lang` = `None`）でなければならない。引数の
/// 順序は問わず、どちら向きで呼んでも参照側を基準とした同じ結果を返す。
pub fn compare(a: &Tree, b: &Tree) -> Result<(), CompareError> {
    let (correct, lang) = sort(a, b)?;
    compare_nodes(correct, correct.root(), lang, lang.root()).map_err(CompareError::Mismatch)
}

/// 参照側と翻訳側に振り分ける
fn sort<'t>(a: &'t Tree, b: &'t Tree) -> Result<(&'t Tree, &'t Tree), CompareError> {
    match (a.lang(), b.lang()) {
        (None, Some(_)) => Ok((a, b)),
        (Some(_), None) => Ok((b, a)),
        _ => Err(CompareError::Order),
    }
}

fn mismatch(correct: &Tree, at: NodeId, message: String) -> Mismatch {
    Mismatch { message, location: correct.chain_text(at) }
}

fn compare_nodes(
    correct: &Tree,
    correct_id: NodeId,
    lang: &Tree,
    lang_id: NodeId,
) -> Result<(), Mismatch> {
    let correct_ident = correct.ident(correct_id);
    let lang_ident = lang.ident(lang_id);
    if correct_ident != lang_ident {
        return Err(mismatch(
            correct,
            correct_id,
            format!("Correct ID '{correct_ident}' did not match lang ID '{lang_ident}'"),
        ));
    }

    // 表示タグは識別子の一致のみで等価（子を持たない）
    if correct.kind(correct_id) == NodeKind::Display {
        return Ok(());
    }

    // 参照側の子がすべて翻訳側にも存在すること
    for &correct_child in correct.children(correct_id) {
        let ident = correct.ident(correct_child);
        let Some(lang_child) = lang.child_by_ident(lang_id, ident) else {
            return Err(mismatch(
                correct,
                correct_id,
                format!("Missing child with id '{ident}'"),
            ));
        };
        compare_nodes(correct, correct_child, lang, lang_child)?;
    }

    // 対称に、翻訳側の余分な子を検出する
    for &lang_child in lang.children(lang_id) {
        let ident = lang.ident(lang_child);
        let Some(correct_child) = correct.child_by_ident(correct_id, ident) else {
            return Err(mismatch(
                correct,
                correct_id,
                format!("Extra child with id '{ident}'"),
            ));
        };
        compare_nodes(correct, correct_child, lang, lang_child)?;
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    const SAMPLE: &str = r#"<root><wsd-basicconditional data-idx="1"><span data-tag-name="X"/></wsd-basicconditional></root>"#;

    fn correct(markup: &str) -> Tree {
        Tree::parse(markup, None, false).unwrap()
    }

    fn lang(markup: &str) -> Tree {
        Tree::parse(markup, Some("DE".to_string()), false).unwrap()
    }

    #[googletest::test]
    fn test_identical_trees_compare_clean() {
        expect_that!(compare(&correct(SAMPLE), &lang(SAMPLE)), ok(anything()));
    }

    #[googletest::test]
    fn test_argument_order_does_not_change_the_result() {
        let reference = correct(SAMPLE);
        let translated =
            lang(r#"<root><wsd-basicconditional data-idx="1"/></root>"#);

        let forward = compare(&reference, &translated);
        let backward = compare(&translated, &reference);

        // どちら向きでも参照側を基準とした同じ不一致になる
        assert!(forward.is_err());
        expect_that!(backward, eq(&forward));
    }

    #[googletest::test]
    fn test_missing_child_is_reported_at_the_parent() {
        let result = compare(&correct(SAMPLE), &lang("<root></root>"));

        expect_that!(
            result,
            err(eq(&CompareError::Mismatch(Mismatch {
                message: "Missing child with id '1'".to_string(),
                location: "ROOT".to_string(),
            })))
        );
    }

    #[googletest::test]
    fn test_missing_display_renders_the_chain_location() {
        let result =
            compare(&correct(SAMPLE), &lang(r#"<root><wsd-basicconditional data-idx="1"/></root>"#));

        expect_that!(
            result,
            err(eq(&CompareError::Mismatch(Mismatch {
                message: "Missing child with id 'X'".to_string(),
                location: "ROOT->1".to_string(),
            })))
        );
    }

    #[googletest::test]
    fn test_extra_child_is_reported() {
        let translated = lang(
            r#"<root><wsd-basicconditional data-idx="1"><span data-tag-name="X"/><span data-tag-name="Y"/></wsd-basicconditional></root>"#,
        );

        let result = compare(&correct(SAMPLE), &translated);

        expect_that!(
            result,
            err(eq(&CompareError::Mismatch(Mismatch {
                message: "Extra child with id 'Y'".to_string(),
                location: "ROOT->1".to_string(),
            })))
        );
    }

    #[rstest]
    #[case::both_reference(None, None)]
    #[case::both_translated(Some("DE"), Some("FR"))]
    fn test_ordering_error_for_invalid_pairs(#[case] a: Option<&str>, #[case] b: Option<&str>) {
        let tree_a = Tree::parse(SAMPLE, a.map(ToString::to_string), false).unwrap();
        let tree_b = Tree::parse(SAMPLE, b.map(ToString::to_string), false).unwrap();

        assert!(matches!(compare(&tree_a, &tree_b), Err(CompareError::Order)));
    }

    #[googletest::test]
    fn test_ignore_formatting_makes_wrappers_transparent() {
        let wrapped = r#"<root><wsd-basicconditional data-idx="1"><b><span data-tag-name="X"/></b></wsd-basicconditional></root>"#;

        let with_formatting = compare(
            &Tree::parse(SAMPLE, None, false).unwrap(),
            &Tree::parse(wrapped, Some("FR".to_string()), false).unwrap(),
        );
        let without_formatting = compare(
            &Tree::parse(SAMPLE, None, true).unwrap(),
            &Tree::parse(wrapped, Some("FR".to_string()), true).unwrap(),
        );

        // 整形タグを無視しない場合は余分な子として検出される
        assert_that!(with_formatting, err(anything()));
        // 無視する場合はラッパーが消えて完全一致になる
        expect_that!(without_formatting, ok(anything()));
    }
}
