//! Path evaluation.
//!
//! A single depth-first pass over the element tree. Each step narrows the
//! context set; matches come out in document order because children are
//! visited in document order and the context set never reorders.

use crate::tree::Element;

use super::parser::{PathExpr, Predicate, Step, StepTest};

/// Select the subtree roots matched by `expr`. No match yields an empty
/// vector, never an error.
pub fn select<'a>(root: &'a Element, expr: &PathExpr) -> Vec<&'a Element> {
    let mut steps = expr.steps.iter();
    let mut context: Vec<&'a Element> = match steps.next() {
        None => return vec![root],
        // The first step runs against the document itself: a name step
        // matches the document element, `.` keeps it.
        Some(step) => match &step.test {
            StepTest::Current if passes(root, &step.predicates) => vec![root],
            StepTest::Name(name) if root.name == *name && passes(root, &step.predicates) => {
                vec![root]
            }
            _ => Vec::new(),
        },
    };

    for step in steps {
        let mut next = Vec::new();
        for node in context {
            apply_step(node, step, &mut next);
        }
        context = next;
    }
    context
}

fn apply_step<'a>(node: &'a Element, step: &Step, out: &mut Vec<&'a Element>) {
    match &step.test {
        StepTest::Current => {
            if passes(node, &step.predicates) {
                out.push(node);
            }
        }
        StepTest::Name(name) => {
            for child in node.child_elements() {
                if child.name == *name && passes(child, &step.predicates) {
                    out.push(child);
                }
            }
        }
    }
}

fn passes(element: &Element, predicates: &[Predicate]) -> bool {
    predicates.iter().all(|p| match p {
        Predicate::AttrEquals { name, value } => element.attribute(name) == Some(value.as_str()),
        Predicate::AttrExists { name } => element.attribute(name).is_some(),
        Predicate::ChildTextEquals { name, value } => element
            .child_elements()
            .any(|c| c.name == *name && c.text().as_deref() == Some(value.as_str())),
    })
}

#[cfg(test)]
mod tests {
    use super::super::parser::parse;
    use super::*;
    use crate::tree::Document;

    const CATALOG: &str = r#"<catalog>
        <book id="b1"><title>First</title><genre>Fantasy</genre></book>
        <book id="b2"><title>Second</title><genre>Computer</genre></book>
        <book id="b3"><title>Third</title><genre>Computer</genre></book>
    </catalog>"#;

    fn doc() -> Document {
        Document::parse(CATALOG.as_bytes(), None).unwrap()
    }

    fn ids<'a>(matches: &[&'a Element]) -> Vec<&'a str> {
        matches.iter().filter_map(|e| e.attribute("id")).collect()
    }

    #[test]
    fn whole_document_selection() {
        let d = doc();
        let matches = select(&d.root, &parse("/").unwrap());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "catalog");
    }

    #[test]
    fn name_steps_descend() {
        let d = doc();
        let matches = select(&d.root, &parse("/catalog/book").unwrap());
        assert_eq!(ids(&matches), ["b1", "b2", "b3"]);
    }

    #[test]
    fn attr_predicate_narrows() {
        let d = doc();
        let matches = select(&d.root, &parse(r#"/catalog/book[@id="b2"]/title"#).unwrap());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].text().as_deref(), Some("Second"));
    }

    #[test]
    fn child_text_predicate_in_document_order() {
        let d = doc();
        let matches = select(&d.root, &parse(r#"/catalog/book[genre="Computer"]"#).unwrap());
        assert_eq!(ids(&matches), ["b2", "b3"]);
    }

    #[test]
    fn current_step_returns_the_matched_element() {
        let d = doc();
        let matches = select(&d.root, &parse(r#"/catalog/book[title="Third"]/."#).unwrap());
        assert_eq!(ids(&matches), ["b3"]);
    }

    #[test]
    fn no_match_is_empty_not_error() {
        let d = doc();
        assert!(select(&d.root, &parse("/catalog/magazine").unwrap()).is_empty());
        assert!(select(&d.root, &parse("/wrongroot/book").unwrap()).is_empty());
    }
}
