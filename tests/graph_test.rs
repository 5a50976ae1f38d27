//! Graph-mode import: node counts, structural invariants, and the global
//! content chain, on a fixture whose counts are known by inspection:
//! 2 processing instructions, 10 tags, 5 text runs, 17 words.

use xmlgrove::graph::{MemoryGraph, NodeLabel, RelType};
use xmlgrove::{import, GraphConfig};

const JOURNAL: &str = "tests/fixtures/journal.xml";

fn import_journal(config: &GraphConfig) -> (MemoryGraph, usize) {
    let mut graph = MemoryGraph::new();
    let root = import(JOURNAL, config, &mut graph).unwrap().unwrap();
    (graph, root)
}

fn word_config() -> GraphConfig {
    GraphConfig {
        create_next_word_relationships: true,
        filter_leading_whitespace: true,
        ..Default::default()
    }
}

fn char_config() -> GraphConfig {
    GraphConfig {
        connect_characters: true,
        filter_leading_whitespace: true,
        ..Default::default()
    }
}

#[test]
fn node_counts_in_word_mode() {
    let (graph, _) = import_journal(&word_config());
    assert_eq!(graph.count_nodes(NodeLabel::Document), 1);
    assert_eq!(graph.count_nodes(NodeLabel::ProcessingInstruction), 2);
    assert_eq!(graph.count_nodes(NodeLabel::Tag), 10);
    assert_eq!(graph.count_nodes(NodeLabel::Word), 17);
    assert_eq!(graph.count_nodes(NodeLabel::Characters), 0);
}

#[test]
fn node_counts_in_character_mode() {
    let (graph, _) = import_journal(&char_config());
    assert_eq!(graph.count_nodes(NodeLabel::Document), 1);
    assert_eq!(graph.count_nodes(NodeLabel::ProcessingInstruction), 2);
    assert_eq!(graph.count_nodes(NodeLabel::Tag), 10);
    assert_eq!(graph.count_nodes(NodeLabel::Characters), 5);
    assert_eq!(graph.count_nodes(NodeLabel::Word), 0);
}

#[test]
fn switching_modes_changes_only_the_leaf_kind() {
    let (words, _) = import_journal(&word_config());
    let (chars, _) = import_journal(&char_config());
    for label in [
        NodeLabel::Document,
        NodeLabel::ProcessingInstruction,
        NodeLabel::Tag,
    ] {
        assert_eq!(words.count_nodes(label), chars.count_nodes(label));
    }
}

#[test]
fn no_node_has_more_than_one_outgoing_edge_per_type() {
    let (graph, _) = import_journal(&word_config());
    for rel in [
        RelType::FirstChildOf,
        RelType::LastChildOf,
        RelType::NextSibling,
        RelType::Next,
        RelType::NextWord,
    ] {
        assert!(
            graph.max_outgoing(rel) <= 1,
            "more than one outgoing {} edge",
            rel.as_str()
        );
    }
}

#[test]
fn next_chain_visits_every_node_once() {
    let (graph, root) = import_journal(&word_config());
    let chain = graph.chain(root, RelType::Next);
    assert_eq!(chain.len(), graph.nodes().len());
}

#[test]
fn word_chain_is_one_path_over_all_words() {
    let (graph, _) = import_journal(&word_config());
    assert_eq!(
        graph.count_relationships(RelType::NextWord),
        graph.count_nodes(NodeLabel::Word) - 1
    );

    // The chain starts at the first word in reading order and covers all
    // word nodes.
    let first_word = graph
        .nodes()
        .iter()
        .position(|n| n.label == NodeLabel::Word)
        .unwrap();
    let chain = graph.chain(first_word, RelType::NextWord);
    assert_eq!(chain.len(), graph.count_nodes(NodeLabel::Word));

    let words: Vec<&str> = chain
        .iter()
        .map(|&id| graph.node(id).unwrap().properties["text"].as_str().unwrap())
        .collect();
    assert_eq!(&words[..2], ["Field", "Notes"]);
    assert_eq!(words.last(), Some(&"dusk"));
}

#[test]
fn character_chain_spans_runs_across_nesting() {
    let (graph, _) = import_journal(&char_config());
    assert_eq!(
        graph.count_relationships(RelType::NextChar),
        graph.count_nodes(NodeLabel::Characters) - 1
    );
    let first = graph
        .nodes()
        .iter()
        .position(|n| n.label == NodeLabel::Characters)
        .unwrap();
    let chain = graph.chain(first, RelType::NextChar);
    let runs: Vec<&str> = chain
        .iter()
        .map(|&id| graph.node(id).unwrap().properties["text"].as_str().unwrap())
        .collect();
    assert_eq!(
        runs,
        [
            "Field Notes",
            "M. Humboldt",
            "Clear skies over the valley",
            "Wind from the north",
            "Rain began at dusk"
        ]
    );
}

#[test]
fn tag_nodes_carry_name_and_attributes() {
    let (graph, root) = import_journal(&word_config());
    let journal = graph.outgoing(root, RelType::FirstChildOf)[0];
    assert_eq!(graph.node(journal).unwrap().properties["_name"], "journal");

    // journal -> header first, body last
    let header = graph.outgoing(journal, RelType::FirstChildOf)[0];
    let body = graph.outgoing(journal, RelType::LastChildOf)[0];
    assert_eq!(graph.node(header).unwrap().properties["_name"], "header");
    assert_eq!(graph.node(body).unwrap().properties["_name"], "body");
    assert_eq!(graph.outgoing(header, RelType::NextSibling), vec![body]);

    let first_section = graph.outgoing(body, RelType::FirstChildOf)[0];
    let section = graph.node(first_section).unwrap();
    assert_eq!(section.properties["_name"], "section");
    assert_eq!(section.properties["name"], "morning");
}

#[test]
fn fail_soft_import_yields_no_handle() {
    let config = GraphConfig {
        fail_on_error: false,
        ..Default::default()
    };
    let mut graph = MemoryGraph::new();
    let handle = import("tests/fixtures/absent.xml", &config, &mut graph).unwrap();
    assert!(handle.is_none());
    assert!(graph.nodes().is_empty());
}

#[test]
fn missing_source_propagates_by_default() {
    let mut graph = MemoryGraph::new();
    assert!(import("tests/fixtures/absent.xml", &GraphConfig::default(), &mut graph).is_err());
}
