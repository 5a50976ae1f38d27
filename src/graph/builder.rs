//! Event-driven graph construction.
//!
//! Walks the parse events once, maintaining three pieces of mutable state:
//! a stack of open frames (the Document node at the bottom), a cursor to
//! the previously created node for the document-order `NEXT` chain, and a
//! cursor to the previously created content leaf for the global content
//! chain. The content-chain cursor deliberately lives on the builder, not
//! on any frame: the chain crosses tree levels freely.
//!
//! Structural edges connect tags only. `FIRST_CHILD_OF` is emitted when a
//! parent sees its first child tag, `NEXT_SIBLING` links consecutive child
//! tags, and `LAST_CHILD_OF` is emitted exactly once when the parent
//! closes, which is what makes the one-outgoing-edge-per-type invariant
//! hold by construction.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::GraphConfig;
use crate::error::Result;
use crate::reader::{EventReader, ParseEvent};

use super::store::{GraphStore, NodeId, NodeLabel, RelType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tokenize {
    Words,
    Characters,
}

struct Frame {
    node: NodeId,
    last_child: Option<NodeId>,
}

pub struct GraphBuilder<'s, S: GraphStore> {
    store: &'s mut S,
    tokenize: Tokenize,
    chain: Option<RelType>,
    filter_leading: bool,
    stack: Vec<Frame>,
    last_node: Option<NodeId>,
    last_leaf: Option<NodeId>,
    nodes_created: usize,
}

impl<'s, S: GraphStore> GraphBuilder<'s, S> {
    pub fn new(store: &'s mut S, config: &GraphConfig) -> Self {
        let (tokenize, chain) = if config.connect_characters {
            if config.create_next_word_relationships {
                warn!("connectCharacters and createNextWordRelationships both set; character mode wins");
            }
            (Tokenize::Characters, Some(RelType::NextChar))
        } else if config.create_next_word_relationships {
            (Tokenize::Words, Some(RelType::NextWord))
        } else {
            (Tokenize::Words, None)
        };
        GraphBuilder {
            store,
            tokenize,
            chain,
            filter_leading: config.filter_leading_whitespace,
            stack: Vec::new(),
            last_node: None,
            last_leaf: None,
            nodes_created: 0,
        }
    }

    /// Consume the event stream and return the Document node handle.
    /// Mutations already applied are not rolled back on error; that is the
    /// store's transaction boundary.
    pub fn run(mut self, reader: EventReader<'_>) -> Result<NodeId> {
        let document = self.create_node(NodeLabel::Document, Map::new());
        self.stack.push(Frame {
            node: document,
            last_child: None,
        });
        for event in reader {
            self.handle(event?);
        }
        self.close_frame(); // the document frame
        debug!(nodes = self.nodes_created, "graph import complete");
        Ok(document)
    }

    fn handle(&mut self, event: ParseEvent<'_>) {
        match event {
            ParseEvent::ElementStart {
                name, attributes, ..
            } => {
                let mut properties = Map::new();
                properties.insert("_name".to_string(), Value::String(name.into_owned()));
                for attr in attributes {
                    // An attribute literally named `_name` must not clobber
                    // the tag name.
                    if attr.name != "_name" {
                        properties
                            .insert(attr.name.into_owned(), Value::String(attr.value.into_owned()));
                    }
                }
                let id = self.create_node(NodeLabel::Tag, properties);
                self.link_into_parent(id);
                self.stack.push(Frame {
                    node: id,
                    last_child: None,
                });
            }
            ParseEvent::ElementEnd { .. } => self.close_frame(),
            ParseEvent::Text { content, .. } => self.handle_text(&content),
            ParseEvent::ProcessingInstruction { target, data } => {
                let mut properties = Map::new();
                properties.insert("target".to_string(), Value::String(target.into_owned()));
                if let Some(data) = data {
                    properties.insert("data".to_string(), Value::String(data.into_owned()));
                }
                // A processing instruction sits in the NEXT chain at its
                // document position but is not a structural child.
                self.create_node(NodeLabel::ProcessingInstruction, properties);
            }
            // Suppressed entity content: nothing to create.
            ParseEvent::EntityRef { .. } => {}
            ParseEvent::DocumentEnd => {}
        }
    }

    fn handle_text(&mut self, run: &str) {
        let run = if self.filter_leading {
            run.trim_start()
        } else {
            run
        };
        if run.is_empty() {
            return;
        }
        match self.tokenize {
            Tokenize::Words => {
                for word in run.split_whitespace() {
                    let mut properties = Map::new();
                    properties.insert("text".to_string(), Value::String(word.to_string()));
                    let id = self.create_node(NodeLabel::Word, properties);
                    self.link_into_content_chain(id);
                }
            }
            Tokenize::Characters => {
                let mut properties = Map::new();
                properties.insert("text".to_string(), Value::String(run.to_string()));
                let id = self.create_node(NodeLabel::Characters, properties);
                self.link_into_content_chain(id);
            }
        }
    }

    /// Create a node and thread it onto the document-order NEXT chain.
    fn create_node(&mut self, label: NodeLabel, properties: Map<String, Value>) -> NodeId {
        let id = self.store.create_node(label, properties);
        if let Some(previous) = self.last_node {
            self.store.create_relationship(previous, id, RelType::Next);
        }
        self.last_node = Some(id);
        self.nodes_created += 1;
        id
    }

    /// Register a new tag under the innermost open frame.
    fn link_into_parent(&mut self, id: NodeId) {
        if let Some(parent) = self.stack.last_mut() {
            match parent.last_child {
                None => self
                    .store
                    .create_relationship(parent.node, id, RelType::FirstChildOf),
                Some(previous) => self
                    .store
                    .create_relationship(previous, id, RelType::NextSibling),
            }
            parent.last_child = Some(id);
        }
    }

    fn link_into_content_chain(&mut self, id: NodeId) {
        if let Some(rel) = self.chain {
            if let Some(previous) = self.last_leaf {
                self.store.create_relationship(previous, id, rel);
            }
        }
        self.last_leaf = Some(id);
    }

    fn close_frame(&mut self) {
        if let Some(frame) = self.stack.pop() {
            if let Some(last) = frame.last_child {
                self.store
                    .create_relationship(frame.node, last, RelType::LastChildOf);
            }
        }
    }
}
