//! Path expression grammar.
//!
//! ```text
//! path      := '/'? | '/'? step ('/' step)*
//! step      := '.' | name predicate*
//! predicate := '[' '@' name ('=' literal)? ']'
//!            | '[' name '=' literal ']'
//! literal   := '"' ... '"' | "'" ... "'"
//! ```
//!
//! An empty expression or a bare `/` selects the whole document.

use crate::error::{Error, Result};

/// A compiled path expression. No steps means "whole document".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub test: StepTest,
    pub predicates: Vec<Predicate>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepTest {
    /// Match child elements by tag name.
    Name(String),
    /// `.`: keep the context node.
    Current,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `[@name="value"]`
    AttrEquals { name: String, value: String },
    /// `[@name]`
    AttrExists { name: String },
    /// `[child="value"]`: a child element with matching text content.
    ChildTextEquals { name: String, value: String },
}

pub fn parse(expression: &str) -> Result<PathExpr> {
    let mut p = Parser {
        expression,
        rest: expression.trim(),
    };
    p.parse_path()
}

struct Parser<'a> {
    expression: &'a str,
    rest: &'a str,
}

impl<'a> Parser<'a> {
    fn parse_path(&mut self) -> Result<PathExpr> {
        if self.rest.is_empty() || self.rest == "/" {
            return Ok(PathExpr { steps: Vec::new() });
        }
        self.eat('/');

        let mut steps = Vec::new();
        loop {
            steps.push(self.parse_step()?);
            if !self.eat('/') {
                break;
            }
        }
        if !self.rest.is_empty() {
            return Err(self.error(format!("unexpected trailing input {:?}", self.rest)));
        }
        Ok(PathExpr { steps })
    }

    fn parse_step(&mut self) -> Result<Step> {
        if self.eat('.') {
            return Ok(Step {
                test: StepTest::Current,
                predicates: Vec::new(),
            });
        }
        let name = self
            .take_name()
            .ok_or_else(|| self.error("expected an element name or '.'"))?;
        let mut predicates = Vec::new();
        while self.eat('[') {
            predicates.push(self.parse_predicate()?);
        }
        Ok(Step {
            test: StepTest::Name(name),
            predicates,
        })
    }

    fn parse_predicate(&mut self) -> Result<Predicate> {
        let predicate = if self.eat('@') {
            let name = self
                .take_name()
                .ok_or_else(|| self.error("expected an attribute name after '@'"))?;
            if self.eat('=') {
                let value = self.take_literal()?;
                Predicate::AttrEquals { name, value }
            } else {
                Predicate::AttrExists { name }
            }
        } else {
            let name = self
                .take_name()
                .ok_or_else(|| self.error("expected a name inside '[...]'"))?;
            if !self.eat('=') {
                return Err(self.error("child-element predicates require '=\"value\"'"));
            }
            let value = self.take_literal()?;
            Predicate::ChildTextEquals { name, value }
        };
        if !self.eat(']') {
            return Err(self.error("unterminated predicate, expected ']'"));
        }
        Ok(predicate)
    }

    fn take_name(&mut self) -> Option<String> {
        let end = self
            .rest
            .char_indices()
            .find(|(_, c)| !is_name_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        if end == 0 || !self.rest.chars().next().is_some_and(is_name_start) {
            return None;
        }
        let (name, rest) = self.rest.split_at(end);
        self.rest = rest;
        Some(name.to_string())
    }

    fn take_literal(&mut self) -> Result<String> {
        let quote = match self.rest.chars().next() {
            Some(q @ ('"' | '\'')) => q,
            _ => return Err(self.error("expected a quoted literal")),
        };
        let body = &self.rest[1..];
        let end = body
            .find(quote)
            .ok_or_else(|| self.error("unterminated string literal"))?;
        let value = body[..end].to_string();
        self.rest = &body[end + 1..];
        Ok(value)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.rest.starts_with(c) {
            self.rest = &self.rest[c.len_utf8()..];
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::InvalidPathExpression {
            expression: self.expression.to_string(),
            message: message.into(),
        }
    }
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '.' | '-' | '_' | ':')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_document_forms() {
        assert!(parse("").unwrap().steps.is_empty());
        assert!(parse("/").unwrap().steps.is_empty());
    }

    #[test]
    fn plain_steps() {
        let expr = parse("/catalog/book/author").unwrap();
        let names: Vec<_> = expr
            .steps
            .iter()
            .map(|s| match &s.test {
                StepTest::Name(n) => n.as_str(),
                StepTest::Current => ".",
            })
            .collect();
        assert_eq!(names, ["catalog", "book", "author"]);
    }

    #[test]
    fn attribute_equality_predicate() {
        let expr = parse(r#"/catalog/book[@id="bk102"]/author"#).unwrap();
        assert_eq!(
            expr.steps[1].predicates,
            vec![Predicate::AttrEquals {
                name: "id".into(),
                value: "bk102".into()
            }]
        );
    }

    #[test]
    fn child_text_predicate_and_current_step() {
        let expr = parse(r#"/catalog/book[title="Maeve Ascendant"]/."#).unwrap();
        assert_eq!(
            expr.steps[1].predicates,
            vec![Predicate::ChildTextEquals {
                name: "title".into(),
                value: "Maeve Ascendant".into()
            }]
        );
        assert_eq!(expr.steps[2].test, StepTest::Current);
    }

    #[test]
    fn attribute_existence_predicate() {
        let expr = parse("/book[@id]").unwrap();
        assert_eq!(
            expr.steps[0].predicates,
            vec![Predicate::AttrExists { name: "id".into() }]
        );
    }

    #[test]
    fn single_quoted_literals() {
        let expr = parse("/book[genre='Computer']").unwrap();
        assert_eq!(
            expr.steps[0].predicates,
            vec![Predicate::ChildTextEquals {
                name: "genre".into(),
                value: "Computer".into()
            }]
        );
    }

    #[test]
    fn rejected_expressions() {
        for bad in ["//a", "/a[", "/a[@]", "/a[b]", "/a/..", "/a]", "/a[b=Computer]"] {
            assert!(parse(bad).is_err(), "expected {bad:?} to be rejected");
        }
    }

    #[test]
    fn relative_paths_parse() {
        assert_eq!(parse("catalog/book").unwrap().steps.len(), 2);
    }
}
