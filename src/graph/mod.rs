//! Graph-mode output.
//!
//! Instead of materializing a record tree, graph mode streams node and
//! relationship creation requests into a [`GraphStore`] while the document
//! is parsed. The store collaborator owns identity assignment and the
//! transaction boundary; the builder owns document order and the structural
//! invariants (one outgoing edge per relationship type per node).

pub mod builder;
pub mod store;

pub use builder::GraphBuilder;
pub use store::{GraphStore, MemoryGraph, NodeId, NodeLabel, NodeRecord, Relationship, RelType};
