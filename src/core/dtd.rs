//! DOCTYPE handling.
//!
//! The parser reads DOCTYPE declarations for one purpose only: collecting
//! general entity declarations. Internal-subset entities become replacement
//! text in the [`EntityTable`](super::entities::EntityTable); anything with
//! an external identifier is recorded by name and never fetched here.
//! Resolving a trusted external subset is the loader's job, which reuses
//! [`parse_subset`] on whatever bytes the source reader returns.

use crate::core::scanner::{is_name_char, is_name_start, Scanner};
use crate::error::{Error, Result};

/// Parsed DOCTYPE declaration.
#[derive(Debug, Clone)]
pub struct Doctype {
    /// Declared document element name.
    pub name: String,
    /// External subset identifier, if declared.
    pub external_id: Option<ExternalId>,
    /// Entity declarations from the internal subset, in order.
    pub declarations: Vec<EntityDecl>,
}

#[derive(Debug, Clone)]
pub struct ExternalId {
    pub public_id: Option<String>,
    pub system_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityDecl {
    pub name: String,
    pub kind: EntityKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityKind {
    /// `<!ENTITY name "replacement">`
    Internal(String),
    /// `<!ENTITY name SYSTEM "uri">` (optionally PUBLIC); content is external.
    External,
}

/// Parse the content of a DOCTYPE declaration: everything between
/// `<!DOCTYPE` and its closing `>`. `at` is the absolute offset of the
/// declaration, used for error positions.
pub fn parse_doctype(content: &[u8], at: usize) -> Result<Doctype> {
    let mut s = Scanner::new(content);
    s.skip_whitespace();
    let name = s
        .read_name()
        .ok_or_else(|| Error::malformed("DOCTYPE requires a name", at))?;
    let name = name_to_string(name, at)?;
    s.skip_whitespace();

    let mut external_id = None;
    if s.starts_with(b"SYSTEM") {
        s.advance(6);
        s.skip_whitespace();
        let system_id = read_quoted(&mut s, at)?;
        external_id = Some(ExternalId {
            public_id: None,
            system_id,
        });
    } else if s.starts_with(b"PUBLIC") {
        s.advance(6);
        s.skip_whitespace();
        let public_id = read_quoted(&mut s, at)?;
        s.skip_whitespace();
        let system_id = read_quoted(&mut s, at)?;
        external_id = Some(ExternalId {
            public_id: Some(public_id),
            system_id,
        });
    }

    s.skip_whitespace();
    let mut declarations = Vec::new();
    if s.peek() == Some(b'[') {
        s.advance(1);
        let start = s.position();
        let end = s
            .find_byte(b']')
            .ok_or_else(|| Error::malformed("unterminated DOCTYPE internal subset", at))?;
        let subset = std::str::from_utf8(s.slice(start, end))
            .map_err(|_| Error::malformed("invalid UTF-8 in DOCTYPE", at))?;
        declarations = parse_subset(subset);
    }

    Ok(Doctype {
        name,
        external_id,
        declarations,
    })
}

/// Scan subset text (internal, or the body of a trusted external DTD) for
/// `<!ENTITY name ...>` declarations. Parameter entities, element/attlist
/// declarations, comments, and processing instructions are skipped; only
/// general entities matter to this engine.
pub fn parse_subset(subset: &str) -> Vec<EntityDecl> {
    let mut declarations = Vec::new();
    let bytes = subset.as_bytes();
    let mut s = Scanner::new(bytes);
    while let Some(hit) = s.find_sequence(b"<!ENTITY") {
        s.set_position(hit + 8);
        s.skip_whitespace();
        // `%` introduces a parameter entity; not used for content.
        if s.peek() == Some(b'%') {
            skip_declaration(&mut s);
            continue;
        }
        let Some(raw_name) = s.read_name() else {
            skip_declaration(&mut s);
            continue;
        };
        let Ok(name) = std::str::from_utf8(raw_name) else {
            skip_declaration(&mut s);
            continue;
        };
        let name = name.to_string();
        s.skip_whitespace();
        match s.peek() {
            Some(b'"') | Some(b'\'') => {
                if let Ok(value) = read_quoted(&mut s, 0) {
                    declarations.push(EntityDecl {
                        name,
                        kind: EntityKind::Internal(value),
                    });
                }
            }
            _ if s.starts_with(b"SYSTEM") || s.starts_with(b"PUBLIC") => {
                declarations.push(EntityDecl {
                    name,
                    kind: EntityKind::External,
                });
            }
            _ => {}
        }
        skip_declaration(&mut s);
    }
    declarations
}

/// Pre-scan a document for a DOCTYPE external SYSTEM identifier without
/// running the full tokenizer. Used by the loader on the trust path to know
/// what to fetch before parsing begins.
pub fn external_system_id(xml: &[u8]) -> Option<String> {
    let s = Scanner::new(xml);
    let start = s.find_sequence(b"<!DOCTYPE")?;
    // Only the prolog may precede a DOCTYPE. A `<` followed by a name-start
    // byte before the match means the document element has begun and the
    // match is ordinary content.
    let element_started = xml[..start]
        .windows(2)
        .any(|w| w[0] == b'<' && is_name_start(w[1]));
    if element_started {
        return None;
    }
    let content_start = start + 9;
    let mut pos = content_start;
    let mut quote: Option<u8> = None;
    let mut in_subset = false;
    while pos < xml.len() {
        let b = xml[pos];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'[' => in_subset = true,
                b']' => in_subset = false,
                b'>' if !in_subset => {
                    let doctype = parse_doctype(&xml[content_start..pos], start).ok()?;
                    return doctype.external_id.map(|id| id.system_id);
                }
                _ => {}
            },
        }
        pos += 1;
    }
    None
}

fn skip_declaration(s: &mut Scanner<'_>) {
    if let Some(end) = s.find_byte(b'>') {
        s.set_position(end + 1);
    } else {
        s.set_position(s.position() + s.remaining().len());
    }
}

fn read_quoted(s: &mut Scanner<'_>, at: usize) -> Result<String> {
    let quote = match s.peek() {
        Some(q @ (b'"' | b'\'')) => q,
        _ => return Err(Error::malformed("expected quoted literal in DOCTYPE", at)),
    };
    s.advance(1);
    let start = s.position();
    let end = s
        .find_byte(quote)
        .ok_or_else(|| Error::malformed("unterminated literal in DOCTYPE", at))?;
    let value = std::str::from_utf8(s.slice(start, end))
        .map_err(|_| Error::malformed("invalid UTF-8 in DOCTYPE", at))?
        .to_string();
    s.set_position(end + 1);
    Ok(value)
}

fn name_to_string(name: &[u8], at: usize) -> Result<String> {
    debug_assert!(name.first().copied().is_some_and(is_name_start));
    debug_assert!(name.iter().copied().all(is_name_char));
    std::str::from_utf8(name)
        .map(str::to_string)
        .map_err(|_| Error::malformed("invalid UTF-8 in DOCTYPE name", at))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doctype_with_internal_entities() {
        let content = br#" catalog [
            <!ENTITY pub "public domain">
            <!ENTITY % param "ignored">
            <!ENTITY logo SYSTEM "logo.gif">
        ]"#;
        let doctype = parse_doctype(content, 0).unwrap();
        assert_eq!(doctype.name, "catalog");
        assert!(doctype.external_id.is_none());
        assert_eq!(
            doctype.declarations,
            vec![
                EntityDecl {
                    name: "pub".into(),
                    kind: EntityKind::Internal("public domain".into()),
                },
                EntityDecl {
                    name: "logo".into(),
                    kind: EntityKind::External,
                },
            ]
        );
    }

    #[test]
    fn doctype_with_system_id() {
        let doctype = parse_doctype(br#" document SYSTEM "missing.dtd""#, 0).unwrap();
        assert_eq!(doctype.name, "document");
        assert_eq!(doctype.external_id.unwrap().system_id, "missing.dtd");
    }

    #[test]
    fn doctype_with_public_id() {
        let doctype =
            parse_doctype(br#" html PUBLIC "-//W3C//DTD XHTML 1.0//EN" "xhtml1.dtd""#, 0).unwrap();
        let id = doctype.external_id.unwrap();
        assert_eq!(id.public_id.as_deref(), Some("-//W3C//DTD XHTML 1.0//EN"));
        assert_eq!(id.system_id, "xhtml1.dtd");
    }

    #[test]
    fn prescan_finds_system_id() {
        let xml = br#"<?xml version="1.0"?>
<!DOCTYPE document SYSTEM "notes.dtd">
<document/>"#;
        assert_eq!(external_system_id(xml), Some("notes.dtd".into()));
    }

    #[test]
    fn prescan_ignores_doctype_lookalike_in_content() {
        let xml = b"<doc>not a <!DOCTYPE here</doc>";
        assert_eq!(external_system_id(xml), None);
    }
}
