//! Pull tokenizer for XML markup.
//!
//! Splits the decoded input into raw tokens: tags, text runs, CDATA,
//! processing instructions, and the DOCTYPE. Entity decoding and
//! well-formedness of the element structure happen one layer up in the
//! event reader; this layer is responsible for markup boundaries and for
//! failing fast on unterminated constructs.
//!
//! Comments are consumed here and never surface. The XML declaration is
//! recognized (and constrained to the start of the document) but its
//! pseudo-attributes are not interpreted; encoding is handled before the
//! tokenizer ever sees the bytes.

use crate::core::dtd::{self, Doctype};
use crate::core::scanner::{is_name_start, Scanner};
use crate::error::{Error, Result};

#[derive(Debug)]
pub enum Token<'a> {
    /// `<name ...>` or `<name .../>`. The attribute region is raw bytes;
    /// `attr_at` is its absolute offset for error reporting.
    StartTag {
        name: &'a str,
        attr_region: &'a [u8],
        attr_at: usize,
        empty: bool,
    },
    /// `</name>`
    EndTag { name: &'a str },
    /// Raw character data between markup. Undecoded; may be whitespace-only.
    Text { raw: &'a [u8], at: usize },
    /// `<![CDATA[...]]>` content, verbatim.
    CData { raw: &'a [u8], at: usize },
    /// `<?target data?>`
    Pi {
        target: &'a str,
        data: Option<&'a str>,
    },
    /// `<?xml ...?>` at the very start of the document.
    XmlDecl,
    /// `<!DOCTYPE ...>`, already parsed into its useful parts.
    Doctype(Doctype),
    Eof,
}

pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
        }
    }

    /// Byte offset of the next unconsumed input.
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    pub fn next_token(&mut self) -> Result<Token<'a>> {
        loop {
            if self.scanner.is_eof() {
                return Ok(Token::Eof);
            }
            if self.scanner.peek() == Some(b'<') {
                match self.parse_markup()? {
                    Some(token) => return Ok(token),
                    None => continue, // comment, consumed silently
                }
            } else {
                return self.parse_text();
            }
        }
    }

    fn parse_text(&mut self) -> Result<Token<'a>> {
        let start = self.scanner.position();
        let end = self
            .scanner
            .find_byte(b'<')
            .unwrap_or(start + self.scanner.remaining().len());
        let raw = self.scanner.slice(start, end);
        self.scanner.set_position(end);
        Ok(Token::Text { raw, at: start })
    }

    fn parse_markup(&mut self) -> Result<Option<Token<'a>>> {
        let start = self.scanner.position();
        self.scanner.advance(1); // consume '<'
        match self.scanner.peek() {
            Some(b'/') => self.parse_end_tag(start).map(Some),
            Some(b'!') => self.parse_bang(start),
            Some(b'?') => self.parse_pi(start).map(Some),
            Some(b) if is_name_start(b) => self.parse_start_tag(start).map(Some),
            _ => Err(Error::malformed("invalid markup after '<'", start)),
        }
    }

    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>> {
        let name = self.read_name_str(start)?;
        let attr_at = self.scanner.position();
        let end = self
            .scanner
            .find_tag_end()
            .ok_or_else(|| Error::malformed(format!("unterminated start tag '<{name}'"), start))?;

        // Attribute region must be separated from the name by whitespace
        // (or be empty / just the self-closing slash).
        let mut region = self.scanner.slice(attr_at, end);
        let empty = region.ends_with(b"/");
        if empty {
            region = &region[..region.len() - 1];
        }
        if let Some(&first) = region.first() {
            if !matches!(first, b' ' | b'\t' | b'\n' | b'\r') {
                return Err(Error::malformed(
                    format!("invalid character after element name '{name}'"),
                    attr_at,
                ));
            }
        }

        self.scanner.set_position(end + 1);
        Ok(Token::StartTag {
            name,
            attr_region: region,
            attr_at,
            empty,
        })
    }

    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>> {
        self.scanner.advance(1); // consume '/'
        let name = self.read_name_str(start)?;
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(Error::malformed(
                format!("malformed end tag '</{name}'"),
                start,
            ));
        }
        self.scanner.advance(1);
        Ok(Token::EndTag { name })
    }

    fn parse_bang(&mut self, start: usize) -> Result<Option<Token<'a>>> {
        self.scanner.advance(1); // consume '!'
        if self.scanner.starts_with(b"--") {
            self.scanner.advance(2);
            let close = self
                .scanner
                .find_sequence(b"-->")
                .ok_or_else(|| Error::malformed("unterminated comment", start))?;
            self.scanner.set_position(close + 3);
            return Ok(None);
        }
        if self.scanner.starts_with(b"[CDATA[") {
            self.scanner.advance(7);
            let content_start = self.scanner.position();
            let close = self
                .scanner
                .find_sequence(b"]]>")
                .ok_or_else(|| Error::malformed("unterminated CDATA section", start))?;
            let raw = self.scanner.slice(content_start, close);
            self.scanner.set_position(close + 3);
            return Ok(Some(Token::CData {
                raw,
                at: content_start,
            }));
        }
        if self.scanner.starts_with(b"DOCTYPE") {
            self.scanner.advance(7);
            return self.parse_doctype(start).map(Some);
        }
        Err(Error::malformed("unrecognized markup declaration", start))
    }

    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>> {
        let content_start = self.scanner.position();
        // Scan for the closing '>' outside quotes and outside the internal
        // subset brackets.
        let mut quote: Option<u8> = None;
        let mut in_subset = false;
        while let Some(b) = self.scanner.peek() {
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None => match b {
                    b'"' | b'\'' => quote = Some(b),
                    b'[' => in_subset = true,
                    b']' => in_subset = false,
                    b'>' if !in_subset => {
                        let content = self.scanner.slice(content_start, self.scanner.position());
                        self.scanner.advance(1);
                        let doctype = dtd::parse_doctype(content, start)?;
                        return Ok(Token::Doctype(doctype));
                    }
                    _ => {}
                },
            }
            self.scanner.advance(1);
        }
        Err(Error::malformed("unterminated DOCTYPE declaration", start))
    }

    fn parse_pi(&mut self, start: usize) -> Result<Token<'a>> {
        self.scanner.advance(1); // consume '?'
        let target = self.read_name_str(start)?;
        let close = self
            .scanner
            .find_sequence(b"?>")
            .ok_or_else(|| Error::malformed("unterminated processing instruction", start))?;
        let data_raw = self.scanner.slice(self.scanner.position(), close);
        self.scanner.set_position(close + 2);

        if target.eq_ignore_ascii_case("xml") {
            if target == "xml" && start == 0 {
                return Ok(Token::XmlDecl);
            }
            return Err(Error::malformed(
                "'xml' is a reserved processing-instruction target",
                start,
            ));
        }

        let data = std::str::from_utf8(data_raw)
            .map_err(|_| Error::malformed("invalid UTF-8 in processing instruction", start))?;
        let data = data.trim();
        Ok(Token::Pi {
            target,
            data: (!data.is_empty()).then_some(data),
        })
    }

    fn read_name_str(&mut self, at: usize) -> Result<&'a str> {
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| Error::malformed("expected a name", at))?;
        std::str::from_utf8(name).map_err(|_| Error::malformed("invalid UTF-8 in name", at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &[u8]) -> Vec<String> {
        let mut t = Tokenizer::new(input);
        let mut out = Vec::new();
        loop {
            match t.next_token().unwrap() {
                Token::Eof => break,
                Token::StartTag { name, empty, .. } => {
                    out.push(format!("start:{name}{}", if empty { "/" } else { "" }))
                }
                Token::EndTag { name } => out.push(format!("end:{name}")),
                Token::Text { raw, .. } => {
                    out.push(format!("text:{}", String::from_utf8_lossy(raw)))
                }
                Token::CData { raw, .. } => {
                    out.push(format!("cdata:{}", String::from_utf8_lossy(raw)))
                }
                Token::Pi { target, .. } => out.push(format!("pi:{target}")),
                Token::XmlDecl => out.push("xmldecl".into()),
                Token::Doctype(d) => out.push(format!("doctype:{}", d.name)),
            }
        }
        out
    }

    #[test]
    fn element_with_text() {
        assert_eq!(
            tokens(b"<a>hi</a>"),
            vec!["start:a", "text:hi", "end:a"]
        );
    }

    #[test]
    fn self_closing_and_comment() {
        assert_eq!(
            tokens(b"<a><!-- ignored --><b/></a>"),
            vec!["start:a", "start:b/", "end:a"]
        );
    }

    #[test]
    fn prolog_pieces() {
        assert_eq!(
            tokens(b"<?xml version=\"1.0\"?><?style sheet?><!DOCTYPE r><r/>"),
            vec!["xmldecl", "pi:style", "doctype:r", "start:r/"]
        );
    }

    #[test]
    fn cdata_preserves_markup_characters() {
        assert_eq!(
            tokens(b"<a><![CDATA[5 < 6 & more]]></a>"),
            vec!["start:a", "cdata:5 < 6 & more", "end:a"]
        );
    }

    #[test]
    fn unterminated_tag_is_malformed() {
        let mut t = Tokenizer::new(b"<a ");
        assert!(matches!(
            t.next_token(),
            Err(Error::MalformedDocument { .. })
        ));
    }

    #[test]
    fn unterminated_comment_is_malformed() {
        let mut t = Tokenizer::new(b"<a><!-- no close");
        t.next_token().unwrap();
        assert!(t.next_token().is_err());
    }

    #[test]
    fn reserved_pi_target_rejected_midstream() {
        let mut t = Tokenizer::new(b"<a><?XML data?></a>");
        t.next_token().unwrap();
        assert!(t.next_token().is_err());
    }

    #[test]
    fn gt_inside_quoted_attribute_value() {
        assert_eq!(
            tokens(b"<a title=\"x > y\">t</a>"),
            vec!["start:a", "text:t", "end:a"]
        );
    }
}
