//! In-memory document tree.
//!
//! The tree is the materialized form record-mode extraction works on: an
//! owned element hierarchy preserving attribute order and the source order
//! of interleaved text and child elements. It is built bottom-up by an
//! explicit stack over the event stream; each `ElementEnd` finalizes one
//! frame and attaches it to the frame below.
//!
//! Whitespace policy: whitespace-only text runs are dropped and other plain
//! text runs are normalized (trimmed, internal whitespace collapsed to a
//! single space); CDATA content is kept verbatim. Processing instructions
//! do not appear in the tree.

use crate::core::encoding;
use crate::core::entities::EntityTable;
use crate::error::{Error, Result};
use crate::reader::{EventReader, ParseEvent};

/// One child position: a nested element, a text fragment, or the marker
/// left by an entity reference whose content is unavailable.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(Element),
    Text(String),
    EntityRef(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub name: String,
    /// Attributes in document order.
    pub attributes: Vec<(String, String)>,
    /// Children in document order, text fragments interleaved.
    pub children: Vec<XmlNode>,
}

impl Element {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Concatenated direct text content, `None` when the element has no
    /// text fragments at all. Multiple fragments join with a single space.
    pub fn text(&self) -> Option<String> {
        let mut parts = self.children.iter().filter_map(|c| match c {
            XmlNode::Text(t) => Some(t.as_str()),
            _ => None,
        });
        let first = parts.next()?;
        let mut out = first.to_string();
        for part in parts {
            out.push(' ');
            out.push_str(part);
        }
        Some(out)
    }
}

/// A fully parsed document. The engine materializes one of these per call;
/// nothing is shared across invocations.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

impl Document {
    /// Parse a document from raw bytes, normalizing the encoding first.
    pub fn parse(bytes: &[u8], encoding_hint: Option<&str>) -> Result<Document> {
        Document::parse_with_entities(bytes, encoding_hint, EntityTable::new())
    }

    /// Parse with a pre-seeded entity table (trusted-DTD path).
    pub fn parse_with_entities(
        bytes: &[u8],
        encoding_hint: Option<&str>,
        entities: EntityTable,
    ) -> Result<Document> {
        let decoded = encoding::decode(bytes.to_vec(), encoding_hint)?;
        let reader = EventReader::with_entities(&decoded, entities);
        Document::from_events(reader)
    }

    /// Build the tree from an event stream.
    pub fn from_events(reader: EventReader<'_>) -> Result<Document> {
        let mut builder = TreeBuilder::new();
        for event in reader {
            builder.handle(event?)?;
        }
        builder.finish()
    }
}

/// Explicit stack of in-progress elements.
struct TreeBuilder {
    stack: Vec<Element>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn new() -> Self {
        TreeBuilder {
            stack: Vec::new(),
            root: None,
        }
    }

    fn handle(&mut self, event: ParseEvent<'_>) -> Result<()> {
        match event {
            ParseEvent::ElementStart {
                name, attributes, ..
            } => {
                self.stack.push(Element {
                    name: name.into_owned(),
                    attributes: attributes
                        .into_iter()
                        .map(crate::reader::Attribute::into_owned)
                        .collect(),
                    children: Vec::new(),
                });
            }
            ParseEvent::ElementEnd { .. } => {
                // The reader guarantees balance; the unwrap-free pop keeps
                // the invariant visible.
                let finished = self
                    .stack
                    .pop()
                    .ok_or_else(|| Error::malformed("element close without open", 0))?;
                match self.stack.last_mut() {
                    Some(parent) => parent.children.push(XmlNode::Element(finished)),
                    None => self.root = Some(finished),
                }
            }
            ParseEvent::Text { content, cdata } => {
                if let Some(top) = self.stack.last_mut() {
                    if cdata {
                        if !content.is_empty() {
                            top.children.push(XmlNode::Text(content.into_owned()));
                        }
                    } else if let Some(normalized) = normalize_text(&content) {
                        top.children.push(XmlNode::Text(normalized));
                    }
                }
            }
            ParseEvent::EntityRef { name } => {
                if let Some(top) = self.stack.last_mut() {
                    top.children.push(XmlNode::EntityRef(name));
                }
            }
            // The record shape has no representation for processing
            // instructions; graph mode consumes them from the raw events.
            ParseEvent::ProcessingInstruction { .. } => {}
            ParseEvent::DocumentEnd => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<Document> {
        match self.root {
            Some(root) => Ok(Document { root }),
            None => Err(Error::malformed("document has no root element", 0)),
        }
    }
}

/// Collapse internal whitespace runs and trim the ends. `None` when the run
/// is whitespace-only.
fn normalize_text(text: &str) -> Option<String> {
    let mut words = text.split_whitespace();
    let first = words.next()?;
    let mut out = String::with_capacity(text.len());
    out.push_str(first);
    for word in words {
        out.push(' ');
        out.push_str(word);
    }
    Some(out)
}
