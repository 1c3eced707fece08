//! マークアップ文字列を生の要素ツリーへパースするモジュール
//!
//! テキストノードは構造比較に関与しないため保持しない。属性と要素の
//! 入れ子だけを残した [`RawElement`] を組み立てる。

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::{
    BytesStart,
    Event,
};

use super::TreeError;

/// パース済みマークアップの 1 要素
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawElement {
    /// 要素名
    pub name: String,
    /// 属性名 → 値
    pub attributes: HashMap<String, String>,
    /// 子要素（テキストは含まない）
    pub children: Vec<RawElement>,
}

impl RawElement {
    /// 属性値を取得する
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// 指定プレフィックスで始まる属性を 1 つでも持つか
    #[must_use]
    pub fn has_attribute_with_prefix(&self, prefix: &str) -> bool {
        self.attributes.keys().any(|key| key.starts_with(prefix))
    }
}

/// マークアップ文字列をパースして単一のルート要素を返す
pub fn parse_markup(input: &str) -> Result<RawElement, TreeError> {
    let mut reader = Reader::from_str(input);
    let mut stack: Vec<RawElement> = Vec::new();
    let mut root: Option<RawElement> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start)?;
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    return Err(TreeError::Parse("unexpected closing tag".to_string()));
                };
                attach(&mut stack, &mut root, element)?;
            }
            Ok(Event::Eof) => break,
            // テキスト・コメント・宣言は構造に関与しない
            Ok(_) => {}
            Err(e) => return Err(TreeError::Parse(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(TreeError::Parse("unclosed element".to_string()));
    }
    root.ok_or_else(|| TreeError::Parse("no root element found".to_string()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<RawElement, TreeError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = HashMap::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| TreeError::Parse(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value =
            attr.unescape_value().map_err(|e| TreeError::Parse(e.to_string()))?.into_owned();
        attributes.insert(key, value);
    }
    Ok(RawElement { name, attributes, children: Vec::new() })
}

/// 完成した要素を親の子リストへ、親が無ければルートへ取り付ける
fn attach(
    stack: &mut [RawElement],
    root: &mut Option<RawElement>,
    element: RawElement,
) -> Result<(), TreeError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(TreeError::Parse("multiple root elements".to_string()));
    }
    *root = Some(element);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[googletest::test]
    fn test_parse_nested_elements() {
        let root = parse_markup(
            r#"<root><wsd-basicconditional data-idx="1"><span data-tag-name="NAME"/></wsd-basicconditional></root>"#,
        )
        .unwrap();

        expect_that!(root.name.as_str(), eq("root"));
        assert_that!(root.children.len(), eq(1));
        let conditional = root.children.first().unwrap();
        expect_that!(conditional.attribute("data-idx"), some(eq("1")));
        assert_that!(conditional.children.len(), eq(1));
        let display = conditional.children.first().unwrap();
        expect_that!(display.name.as_str(), eq("span"));
        expect_that!(display.attribute("data-tag-name"), some(eq("NAME")));
    }

    #[googletest::test]
    fn test_text_nodes_are_dropped() {
        let root = parse_markup("<root>hello <b>world</b></root>").unwrap();

        assert_that!(root.children.len(), eq(1));
        expect_that!(root.children.first().unwrap().name.as_str(), eq("b"));
        expect_that!(root.children.first().unwrap().children.is_empty(), eq(true));
    }

    #[googletest::test]
    fn test_attribute_values_are_unescaped() {
        let root = parse_markup(r#"<root><span data-tag-name="a &amp; b"/></root>"#).unwrap();

        expect_that!(root.children.first().unwrap().attribute("data-tag-name"), some(eq("a & b")));
    }

    #[rstest]
    #[case::empty("")]
    #[case::unclosed("<root><b></root>")]
    #[case::garbage("not markup at all")]
    fn test_invalid_markup_is_rejected(#[case] input: &str) {
        assert!(matches!(parse_markup(input), Err(TreeError::Parse(_))));
    }
}
