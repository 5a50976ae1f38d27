//! Loader and importer configuration.
//!
//! Option names use camelCase in their serialized form so a caller-supplied
//! JSON map (the shape query front ends pass around) deserializes directly.

use serde::Deserialize;

/// Options for record-mode loading ([`crate::load`] / [`crate::parse_str`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoadConfig {
    /// When false, read failures and ill-formed documents yield a single
    /// empty record instead of an error. Security violations and invalid
    /// path expressions are never softened.
    pub fail_on_error: bool,
    /// Name each element's children key after the parent tag (`_book`,
    /// `_tr`, ...) instead of the canonical `_children`.
    pub simple_mode: bool,
    /// Trust the document: resolve an external DTD through the source
    /// reader and honor its entity declarations. Off by default; external
    /// resolution is then suppressed outright.
    pub trusted: bool,
    /// Character encoding to assume when the input carries no BOM.
    pub encoding: Option<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        LoadConfig {
            fail_on_error: true,
            simple_mode: false,
            trusted: false,
            encoding: None,
        }
    }
}

/// Options for graph-mode import ([`crate::import`] / [`crate::import_str`]).
///
/// The two relationship flags select the tokenization mode: word-level nodes
/// chained by `NEXT_WORD`, or one `Characters` node per text run chained by
/// `NEXT_CHAR`. With neither flag set, word nodes are created without a
/// content chain.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
    pub create_next_word_relationships: bool,
    pub connect_characters: bool,
    /// Trim leading whitespace from each text run before tokenizing.
    pub filter_leading_whitespace: bool,
    /// When false, import failures yield no result handle (the store's
    /// transaction boundary decides what happens to partial mutations).
    pub fail_on_error: bool,
    pub trusted: bool,
    pub encoding: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        GraphConfig {
            create_next_word_relationships: false,
            connect_characters: false,
            filter_leading_whitespace: false,
            fail_on_error: true,
            trusted: false,
            encoding: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_config_from_camel_case_map() {
        let cfg: LoadConfig =
            serde_json::from_str(r#"{"failOnError": false, "simpleMode": true}"#).unwrap();
        assert!(!cfg.fail_on_error);
        assert!(cfg.simple_mode);
        assert!(!cfg.trusted);
    }

    #[test]
    fn graph_config_defaults() {
        let cfg: GraphConfig = serde_json::from_str("{}").unwrap();
        assert!(!cfg.create_next_word_relationships);
        assert!(!cfg.connect_characters);
        assert!(!cfg.filter_leading_whitespace);
    }
}
