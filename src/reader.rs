//! Structural event stream.
//!
//! [`EventReader`] turns raw tokens into the event sequence the builders
//! consume, enforcing the well-formedness rules that span tokens: balanced
//! tags, a single document element, nothing but prolog/epilog content
//! outside it. Self-closing elements emit `ElementStart` (flagged) followed
//! by a matching `ElementEnd`, so consumers handle exactly one shape.
//!
//! Entity handling happens here: the DOCTYPE token seeds the entity table,
//! and text runs are decoded into content pieces. A reference whose
//! declaration lives in a suppressed external DTD surfaces as
//! [`ParseEvent::EntityRef`], an explicit marker of absent content, not an
//! error.

use std::borrow::Cow;
use std::collections::VecDeque;

use tracing::debug;

pub use crate::core::attributes::Attribute;
use crate::core::attributes::parse_attributes;
use crate::core::dtd::EntityKind;
use crate::core::entities::{decode_text, EntityTable, ExpansionBudget, TextPiece};
use crate::core::tokenizer::{Token, Tokenizer};
use crate::error::{Error, Result};

/// One structural event, in strict document order.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent<'a> {
    ElementStart {
        name: Cow<'a, str>,
        attributes: Vec<Attribute<'a>>,
        self_closing: bool,
    },
    ElementEnd {
        name: Cow<'a, str>,
    },
    Text {
        content: Cow<'a, str>,
        cdata: bool,
    },
    ProcessingInstruction {
        target: Cow<'a, str>,
        data: Option<Cow<'a, str>>,
    },
    /// An entity reference whose content is unavailable by policy (external
    /// or declared only in a suppressed external subset).
    EntityRef {
        name: String,
    },
    DocumentEnd,
}

pub struct EventReader<'a> {
    tokenizer: Tokenizer<'a>,
    entities: EntityTable,
    budget: ExpansionBudget,
    /// Names of currently open elements, innermost last.
    open: Vec<&'a str>,
    root_seen: bool,
    root_closed: bool,
    doctype_seen: bool,
    finished: bool,
    pending: VecDeque<ParseEvent<'a>>,
}

impl<'a> EventReader<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        EventReader::with_entities(input, EntityTable::new())
    }

    /// Start reading with a pre-seeded entity table (the loader uses this
    /// after resolving a trusted external DTD).
    pub fn with_entities(input: &'a [u8], entities: EntityTable) -> Self {
        EventReader {
            tokenizer: Tokenizer::new(input),
            entities,
            budget: ExpansionBudget::new(),
            open: Vec::new(),
            root_seen: false,
            root_closed: false,
            doctype_seen: false,
            finished: false,
            pending: VecDeque::new(),
        }
    }

    /// Pull the next event, or `None` once `DocumentEnd` has been returned.
    pub fn next_event(&mut self) -> Result<Option<ParseEvent<'a>>> {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return Ok(Some(event));
            }
            if self.finished {
                return Ok(None);
            }
            let position = self.tokenizer.position();
            match self.tokenizer.next_token()? {
                Token::StartTag {
                    name,
                    attr_region,
                    attr_at,
                    empty,
                } => {
                    if self.root_closed {
                        return Err(Error::malformed(
                            "content after the document element",
                            position,
                        ));
                    }
                    let attributes =
                        parse_attributes(attr_region, attr_at, &self.entities, &mut self.budget)?;
                    self.root_seen = true;
                    if empty {
                        if self.open.is_empty() {
                            self.root_closed = true;
                        }
                        self.pending.push_back(ParseEvent::ElementEnd {
                            name: Cow::Borrowed(name),
                        });
                    } else {
                        self.open.push(name);
                    }
                    return Ok(Some(ParseEvent::ElementStart {
                        name: Cow::Borrowed(name),
                        attributes,
                        self_closing: empty,
                    }));
                }
                Token::EndTag { name } => match self.open.pop() {
                    Some(expected) if expected == name => {
                        if self.open.is_empty() {
                            self.root_closed = true;
                        }
                        return Ok(Some(ParseEvent::ElementEnd {
                            name: Cow::Borrowed(name),
                        }));
                    }
                    Some(expected) => {
                        return Err(Error::malformed(
                            format!("mismatched end tag: expected '</{expected}>', found '</{name}>'"),
                            position,
                        ))
                    }
                    None => {
                        return Err(Error::malformed(
                            format!("unexpected end tag '</{name}>'"),
                            position,
                        ))
                    }
                },
                Token::Text { raw, at } => {
                    if self.open.is_empty() {
                        if raw.iter().all(u8::is_ascii_whitespace) {
                            continue;
                        }
                        return Err(Error::malformed(
                            "text outside the document element",
                            at,
                        ));
                    }
                    let pieces = decode_text(raw, at, &self.entities, &mut self.budget)?;
                    for piece in pieces {
                        match piece {
                            TextPiece::Text(content) => {
                                self.pending.push_back(ParseEvent::Text {
                                    content,
                                    cdata: false,
                                });
                            }
                            TextPiece::Unresolved(name) => {
                                self.pending.push_back(ParseEvent::EntityRef { name });
                            }
                        }
                    }
                }
                Token::CData { raw, at } => {
                    if self.open.is_empty() {
                        return Err(Error::malformed(
                            "CDATA outside the document element",
                            at,
                        ));
                    }
                    let content = std::str::from_utf8(raw)
                        .map_err(|_| Error::malformed("invalid UTF-8 in CDATA", at))?;
                    return Ok(Some(ParseEvent::Text {
                        content: Cow::Borrowed(content),
                        cdata: true,
                    }));
                }
                Token::Pi { target, data } => {
                    return Ok(Some(ParseEvent::ProcessingInstruction {
                        target: Cow::Borrowed(target),
                        data: data.map(Cow::Borrowed),
                    }));
                }
                Token::XmlDecl => continue,
                Token::Doctype(doctype) => {
                    if self.doctype_seen {
                        return Err(Error::malformed("multiple DOCTYPE declarations", position));
                    }
                    if self.root_seen {
                        return Err(Error::malformed(
                            "DOCTYPE after the document element",
                            position,
                        ));
                    }
                    self.doctype_seen = true;
                    self.apply_doctype(doctype);
                }
                Token::Eof => {
                    if let Some(unclosed) = self.open.last() {
                        return Err(Error::malformed(
                            format!("unclosed element '<{unclosed}>'"),
                            position,
                        ));
                    }
                    if !self.root_seen {
                        return Err(Error::malformed("document has no root element", position));
                    }
                    self.finished = true;
                    return Ok(Some(ParseEvent::DocumentEnd));
                }
            }
        }
    }

    fn apply_doctype(&mut self, doctype: crate::core::dtd::Doctype) {
        for decl in doctype.declarations {
            match decl.kind {
                EntityKind::Internal(value) => self.entities.declare_internal(&decl.name, value),
                EntityKind::External => self.entities.declare_external(&decl.name),
            }
        }
        if let Some(id) = doctype.external_id {
            debug!(
                system_id = %id.system_id,
                "external DTD subset declared; external resolution suppressed"
            );
            self.entities.set_external_subset();
        }
    }
}

impl<'a> Iterator for EventReader<'a> {
    type Item = Result<ParseEvent<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_event().transpose()
    }
}
