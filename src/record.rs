//! Record rendering.
//!
//! Turns an [`Element`] subtree into the generic nested record consumed by
//! query front ends: an insertion-ordered JSON map per element, with the
//! structure carried under reserved keys. `_type` always holds the tag
//! name; an element with only text stores it under `_text`; an element with
//! child elements stores the ordered child sequence under a children key.
//!
//! The children key is what the two modes disagree about: canonical mode
//! uses `_children` at every level, while parent-tag ("simple") mode derives
//! the key from the parent tag (`_book`, `_tr`, `_document`), one key
//! per nesting level.
//!
//! Mixed content renders as the child sequence with raw text fragments
//! interleaved in source order. Unresolvable entity references render as
//! JSON null: an explicit absence, not an error.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::tree::{Element, XmlNode};

/// Reserved key holding the tag name.
pub const TYPE_KEY: &str = "_type";
/// Reserved key holding text-only content.
pub const TEXT_KEY: &str = "_text";
/// Children key used by canonical mode.
pub const CHILDREN_KEY: &str = "_children";

/// Children key naming scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    /// `_children` at every level.
    Canonical,
    /// `_<parent-tag>` per level ("simple" mode).
    ParentTag,
}

/// Render one element subtree as a record.
///
/// Attributes land in the map under their own names, in document order. An
/// attribute that collides with a reserved key is rejected; precedence
/// between data and structure is not something to guess at.
pub fn to_value(element: &Element, mode: KeyMode) -> Result<Value> {
    let children_key = match mode {
        KeyMode::Canonical => CHILDREN_KEY.to_string(),
        KeyMode::ParentTag => format!("_{}", element.name),
    };

    let mut map = Map::new();
    map.insert(TYPE_KEY.to_string(), Value::String(element.name.clone()));

    for (name, value) in &element.attributes {
        if name == TYPE_KEY || name == TEXT_KEY || *name == children_key {
            return Err(Error::malformed(
                format!(
                    "attribute '{name}' on element '{}' collides with a reserved record key",
                    element.name
                ),
                0,
            ));
        }
        map.insert(name.clone(), Value::String(value.clone()));
    }

    let structured = element
        .children
        .iter()
        .any(|c| matches!(c, XmlNode::Element(_) | XmlNode::EntityRef(_)));
    if structured {
        let mut sequence = Vec::with_capacity(element.children.len());
        for child in &element.children {
            sequence.push(match child {
                XmlNode::Element(e) => to_value(e, mode)?,
                XmlNode::Text(t) => Value::String(t.clone()),
                XmlNode::EntityRef(_) => Value::Null,
            });
        }
        map.insert(children_key, Value::Array(sequence));
    } else if let Some(text) = element.text() {
        map.insert(TEXT_KEY.to_string(), Value::String(text));
    }

    Ok(Value::Object(map))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Document;
    use serde_json::json;

    fn parse(xml: &str) -> Document {
        Document::parse(xml.as_bytes(), None).unwrap()
    }

    #[test]
    fn text_only_element_gets_text_key() {
        let doc = parse(r#"<child name="Neo4j">Neo4j is a graph database</child>"#);
        assert_eq!(
            to_value(&doc.root, KeyMode::Canonical).unwrap(),
            json!({"_type": "child", "name": "Neo4j", "_text": "Neo4j is a graph database"})
        );
    }

    #[test]
    fn nested_elements_get_children_key() {
        let doc = parse(
            r#"<parent name="databases"><child name="Neo4j">Neo4j is a graph database</child></parent>"#,
        );
        assert_eq!(
            to_value(&doc.root, KeyMode::Canonical).unwrap(),
            json!({
                "_type": "parent",
                "name": "databases",
                "_children": [
                    {"_type": "child", "name": "Neo4j", "_text": "Neo4j is a graph database"}
                ]
            })
        );
    }

    #[test]
    fn parent_tag_mode_derives_key_per_level() {
        let doc = parse(
            r#"<table><tr><td><img src="pix/logo-tl.gif"></img></td></tr></table>"#,
        );
        assert_eq!(
            to_value(&doc.root, KeyMode::ParentTag).unwrap(),
            json!({
                "_type": "table",
                "_table": [
                    {"_type": "tr", "_tr": [
                        {"_type": "td", "_td": [
                            {"_type": "img", "src": "pix/logo-tl.gif"}
                        ]}
                    ]}
                ]
            })
        );
    }

    #[test]
    fn empty_element_has_neither_text_nor_children() {
        let doc = parse(r#"<img src="pix/logo-tl.gif"></img>"#);
        assert_eq!(
            to_value(&doc.root, KeyMode::Canonical).unwrap(),
            json!({"_type": "img", "src": "pix/logo-tl.gif"})
        );
    }

    #[test]
    fn mixed_content_interleaves_in_source_order() {
        let doc = parse("<text>text0<mixed/>text1</text>");
        assert_eq!(
            to_value(&doc.root, KeyMode::Canonical).unwrap(),
            json!({
                "_type": "text",
                "_children": ["text0", {"_type": "mixed"}, "text1"]
            })
        );
    }

    #[test]
    fn unresolved_entity_renders_as_null() {
        let doc = parse(
            "<!DOCTYPE document SYSTEM \"gone.dtd\"><document>&header;<title>dtd 404</title></document>",
        );
        assert_eq!(
            to_value(&doc.root, KeyMode::ParentTag).unwrap(),
            json!({
                "_type": "document",
                "_document": [null, {"_type": "title", "_text": "dtd 404"}]
            })
        );
    }

    #[test]
    fn reserved_key_collision_is_rejected() {
        let doc = parse(r#"<a _type="shadow"/>"#);
        assert!(to_value(&doc.root, KeyMode::Canonical).is_err());
    }

    #[test]
    fn attribute_order_is_preserved() {
        let doc = parse(r#"<b z="1" a="2" m="3"/>"#);
        let value = to_value(&doc.root, KeyMode::Canonical).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["_type", "z", "a", "m"]);
    }
}
