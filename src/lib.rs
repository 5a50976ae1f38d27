//! xmlgrove - XML ingestion into nested records or graph structures
//!
//! The pipeline, leaves first:
//!
//! ```text
//! SourceReader ──> encoding ──> Tokenizer ──> EventReader ──┬──> TreeBuilder ──> path select ──> records
//!                                                           └──> GraphBuilder ──> GraphStore
//! ```
//!
//! Record mode returns one insertion-ordered JSON map per matched subtree,
//! with structure under the reserved `_type` / `_text` / `_children` keys
//! (or per-parent keys in simple mode). Graph mode streams typed nodes and
//! ordered relationships into a [`GraphStore`] instead.
//!
//! The parser is hardened by default: external DTDs and external entities
//! are never fetched, unresolvable references surface as explicit absence
//! markers, and entity expansion is bounded.
//!
//! ```
//! let records = xmlgrove::parse_str(
//!     r#"<catalog><book id="b1"><title>First</title></book></catalog>"#,
//!     "/catalog/book",
//!     &xmlgrove::LoadConfig::default(),
//! )
//! .unwrap();
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0]["id"], "b1");
//! ```
//!
//! Each invocation is synchronous and owns all of its state; the only
//! process-wide piece is the compiled path-expression cache.

pub mod config;
mod core;
pub mod error;
pub mod graph;
pub mod path;
pub mod reader;
pub mod record;
pub mod source;
pub mod tree;

use serde_json::{Map, Value};
use tracing::warn;

pub use crate::core::entities::EntityTable;
pub use config::{GraphConfig, LoadConfig};
pub use error::{Error, Result};
pub use graph::{GraphBuilder, GraphStore, MemoryGraph, NodeId};
pub use reader::{Attribute, EventReader, ParseEvent};
pub use record::KeyMode;
pub use source::{DefaultSourceReader, Locator, SourceReader};
pub use tree::{Document, Element, XmlNode};

/// Load a document from a locator and return one record per path match.
///
/// An empty or `/` path yields a single record for the whole document.
/// With `failOnError: false`, read failures and ill-formed documents yield
/// one empty record instead of an error.
pub fn load(locator: &str, path: &str, config: &LoadConfig) -> Result<Vec<Value>> {
    load_with(&DefaultSourceReader, locator, path, config)
}

/// [`load`] with a caller-supplied source reader.
pub fn load_with<R: SourceReader>(
    source: &R,
    locator: &str,
    path: &str,
    config: &LoadConfig,
) -> Result<Vec<Value>> {
    // Path errors are independent of fail-soft mode: report before reading.
    let expr = path::compile(path)?;
    let locator = Locator::parse(locator);
    let outcome = load_document(source, &locator, config)
        .and_then(|doc| render_matches(&doc, &expr, config));
    soften_records(outcome, config)
}

/// Parse an in-memory XML string and return one record per path match.
///
/// No source reader is involved, so the trust flag has nothing to resolve
/// external DTDs against: they stay suppressed.
pub fn parse_str(xml: &str, path: &str, config: &LoadConfig) -> Result<Vec<Value>> {
    let expr = path::compile(path)?;
    let outcome = Document::parse(xml.as_bytes(), config.encoding.as_deref())
        .and_then(|doc| render_matches(&doc, &expr, config));
    soften_records(outcome, config)
}

/// Import a document from a locator into a graph store. Returns the
/// Document node handle, or `None` when a fail-soft error occurred before
/// or during the build (partial mutations are the store transaction's
/// concern, not the engine's).
pub fn import<S: GraphStore>(
    locator: &str,
    config: &GraphConfig,
    store: &mut S,
) -> Result<Option<NodeId>> {
    import_with(&DefaultSourceReader, locator, config, store)
}

/// [`import`] with a caller-supplied source reader.
pub fn import_with<R: SourceReader, S: GraphStore>(
    source: &R,
    locator: &str,
    config: &GraphConfig,
    store: &mut S,
) -> Result<Option<NodeId>> {
    let locator = Locator::parse(locator);
    let outcome = import_document(source, &locator, config, store);
    soften_import(outcome, config)
}

/// Import an in-memory XML string into a graph store.
pub fn import_str<S: GraphStore>(
    xml: &str,
    config: &GraphConfig,
    store: &mut S,
) -> Result<Option<NodeId>> {
    let reader = EventReader::new(xml.as_bytes());
    let outcome = GraphBuilder::new(store, config).run(reader);
    soften_import(outcome, config)
}

fn load_document<R: SourceReader>(
    source: &R,
    locator: &Locator,
    config: &LoadConfig,
) -> Result<Document> {
    let bytes = source.open(locator)?;
    let entities = seed_entities(source, locator, &bytes, config.trusted)?;
    Document::parse_with_entities(&bytes, config.encoding.as_deref(), entities)
}

fn import_document<R: SourceReader, S: GraphStore>(
    source: &R,
    locator: &Locator,
    config: &GraphConfig,
    store: &mut S,
) -> Result<NodeId> {
    let bytes = source.open(locator)?;
    let entities = seed_entities(source, locator, &bytes, config.trusted)?;
    let decoded = crate::core::encoding::decode(bytes, config.encoding.as_deref())?;
    let reader = EventReader::with_entities(&decoded, entities);
    GraphBuilder::new(store, config).run(reader)
}

/// On the trust path, resolve the external DTD through the source reader
/// (relative to the document locator) and collect its entity declarations.
/// Untrusted documents get an empty table; the parser then suppresses
/// external resolution entirely.
fn seed_entities<R: SourceReader>(
    source: &R,
    locator: &Locator,
    bytes: &[u8],
    trusted: bool,
) -> Result<EntityTable> {
    let mut table = EntityTable::new();
    if !trusted {
        return Ok(table);
    }
    if let Some(system_id) = crate::core::dtd::external_system_id(bytes) {
        let dtd_locator = locator.sibling(&system_id);
        let dtd_bytes = source.open(&dtd_locator)?;
        let subset = String::from_utf8(dtd_bytes)
            .map_err(|_| Error::malformed("external DTD is not valid UTF-8", 0))?;
        for decl in crate::core::dtd::parse_subset(&subset) {
            match decl.kind {
                crate::core::dtd::EntityKind::Internal(value) => {
                    table.declare_internal(&decl.name, value)
                }
                crate::core::dtd::EntityKind::External => table.declare_external(&decl.name),
            }
        }
    }
    Ok(table)
}

fn render_matches(doc: &Document, expr: &path::PathExpr, config: &LoadConfig) -> Result<Vec<Value>> {
    let mode = if config.simple_mode {
        KeyMode::ParentTag
    } else {
        KeyMode::Canonical
    };
    path::select(&doc.root, expr)
        .into_iter()
        .map(|element| record::to_value(element, mode))
        .collect()
}

fn soften_records(outcome: Result<Vec<Value>>, config: &LoadConfig) -> Result<Vec<Value>> {
    match outcome {
        Err(error) if !config.fail_on_error && error.is_soft_failure() => {
            warn!(%error, "load failed; returning an empty record (failOnError=false)");
            Ok(vec![Value::Object(Map::new())])
        }
        other => other,
    }
}

fn soften_import(outcome: Result<NodeId>, config: &GraphConfig) -> Result<Option<NodeId>> {
    match outcome {
        Ok(id) => Ok(Some(id)),
        Err(error) if !config.fail_on_error && error.is_soft_failure() => {
            warn!(%error, "import failed; yielding no document handle (failOnError=false)");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
