//! Attribute parsing.
//!
//! Attributes arrive as the raw byte range between the element name and the
//! closing `>`. Parsing enforces the well-formedness rules the builders rely
//! on: quoted values, unique names, decoded entity references.

use std::borrow::Cow;

use crate::core::entities::{decode_attr_value, EntityTable, ExpansionBudget};
use crate::core::scanner::Scanner;
use crate::error::{Error, Result};

/// A decoded attribute. Document order is preserved by the containing Vec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub name: Cow<'a, str>,
    pub value: Cow<'a, str>,
}

impl<'a> Attribute<'a> {
    pub fn into_owned(self) -> (String, String) {
        (self.name.into_owned(), self.value.into_owned())
    }
}

/// Parse the attribute region of a start tag. `at` is the absolute offset of
/// the region, used for error positions.
pub fn parse_attributes<'a>(
    raw: &'a [u8],
    at: usize,
    entities: &EntityTable,
    budget: &mut ExpansionBudget,
) -> Result<Vec<Attribute<'a>>> {
    let mut attributes: Vec<Attribute<'a>> = Vec::new();
    let mut s = Scanner::new(raw);
    loop {
        s.skip_whitespace();
        if s.is_eof() {
            break;
        }
        let name_at = at + s.position();
        let name = s
            .read_name()
            .ok_or_else(|| Error::malformed("expected attribute name", name_at))?;
        let name = std::str::from_utf8(name)
            .map_err(|_| Error::malformed("invalid UTF-8 in attribute name", name_at))?;

        s.skip_whitespace();
        if s.peek() != Some(b'=') {
            return Err(Error::malformed(
                format!("attribute '{name}' is missing '='"),
                name_at,
            ));
        }
        s.advance(1);
        s.skip_whitespace();

        let quote = match s.peek() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(Error::malformed(
                    format!("attribute '{name}' value must be quoted"),
                    at + s.position(),
                ))
            }
        };
        s.advance(1);
        let value_start = s.position();
        let value_end = s.find_byte(quote).ok_or_else(|| {
            Error::malformed(
                format!("unterminated value for attribute '{name}'"),
                name_at,
            )
        })?;
        let raw_value = s.slice(value_start, value_end);
        s.set_position(value_end + 1);

        if attributes.iter().any(|a| a.name == name) {
            return Err(Error::malformed(
                format!("duplicate attribute '{name}'"),
                name_at,
            ));
        }
        let value = decode_attr_value(raw_value, at + value_start, entities, budget)?;
        attributes.push(Attribute {
            name: Cow::Borrowed(name),
            value,
        });
    }
    Ok(attributes)
}
