//! Graph storage collaborator interface.
//!
//! The engine only needs two operations from a store: create a labeled node
//! with properties, create a typed relationship between two node handles.
//! [`MemoryGraph`] is the reference implementation: enough for tests and
//! for embedders that want to inspect the mutation stream before applying
//! it elsewhere.

use serde_json::{Map, Value};

/// Store-assigned node handle. Opaque to the builder beyond identity.
pub type NodeId = usize;

/// Node kinds produced by the import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Document,
    ProcessingInstruction,
    Tag,
    Word,
    Characters,
}

impl NodeLabel {
    /// Label string as it appears in the store.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeLabel::Document => "XmlDocument",
            NodeLabel::ProcessingInstruction => "XmlProcessingInstruction",
            NodeLabel::Tag => "XmlTag",
            NodeLabel::Word => "XmlWord",
            NodeLabel::Characters => "XmlCharacters",
        }
    }
}

/// Relationship types produced by the import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelType {
    /// Parent tag → its first structural child.
    FirstChildOf,
    /// Parent tag → its last structural child.
    LastChildOf,
    /// Tag → the immediately following sibling tag.
    NextSibling,
    /// Depth-first document-order successor, any node kind.
    Next,
    /// Content chain between word nodes.
    NextWord,
    /// Content chain between character-run nodes.
    NextChar,
}

impl RelType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelType::FirstChildOf => "FIRST_CHILD_OF",
            RelType::LastChildOf => "LAST_CHILD_OF",
            RelType::NextSibling => "NEXT_SIBLING",
            RelType::Next => "NEXT",
            RelType::NextWord => "NEXT_WORD",
            RelType::NextChar => "NEXT_CHAR",
        }
    }
}

/// The write interface the builder drives. One import call is expected to
/// run inside a single store transaction supplied by the caller; the
/// builder never retries or rolls back.
pub trait GraphStore {
    fn create_node(&mut self, label: NodeLabel, properties: Map<String, Value>) -> NodeId;
    fn create_relationship(&mut self, from: NodeId, to: NodeId, rel: RelType);
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub label: NodeLabel,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relationship {
    pub from: NodeId,
    pub to: NodeId,
    pub rel: RelType,
}

/// In-memory store: ids are vector indices, relationships a flat list.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    nodes: Vec<NodeRecord>,
    relationships: Vec<Relationship>,
}

impl MemoryGraph {
    pub fn new() -> Self {
        MemoryGraph::default()
    }

    pub fn nodes(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id)
    }

    pub fn count_nodes(&self, label: NodeLabel) -> usize {
        self.nodes.iter().filter(|n| n.label == label).count()
    }

    pub fn count_relationships(&self, rel: RelType) -> usize {
        self.relationships.iter().filter(|r| r.rel == rel).count()
    }

    /// Outgoing neighbors of `id` over `rel`, in creation order.
    pub fn outgoing(&self, id: NodeId, rel: RelType) -> Vec<NodeId> {
        self.relationships
            .iter()
            .filter(|r| r.from == id && r.rel == rel)
            .map(|r| r.to)
            .collect()
    }

    /// Largest outgoing fan-out over `rel` across all nodes. The structural
    /// invariant tests pin this to 1.
    pub fn max_outgoing(&self, rel: RelType) -> usize {
        (0..self.nodes.len())
            .map(|id| self.outgoing(id, rel).len())
            .max()
            .unwrap_or(0)
    }

    /// Follow single outgoing `rel` edges from `start` until the chain ends.
    /// Returns the visited nodes including `start`.
    pub fn chain(&self, start: NodeId, rel: RelType) -> Vec<NodeId> {
        let mut path = vec![start];
        let mut current = start;
        while let Some(&next) = self.outgoing(current, rel).first() {
            path.push(next);
            current = next;
        }
        path
    }
}

impl GraphStore for MemoryGraph {
    fn create_node(&mut self, label: NodeLabel, properties: Map<String, Value>) -> NodeId {
        self.nodes.push(NodeRecord { label, properties });
        self.nodes.len() - 1
    }

    fn create_relationship(&mut self, from: NodeId, to: NodeId, rel: RelType) {
        self.relationships.push(Relationship { from, to, rel });
    }
}
