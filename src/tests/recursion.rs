use std::fs;

use crate::nodes::Item;
use crate::{Options, Parser};

fn anchors_and_breaks(doc: &crate::nodes::NodeRef<crate::nodes::Document>) -> Vec<String> {
    doc.borrow()
        .items
        .iter()
        .filter_map(|i| match i {
            Item::Anchor(a) => Some(format!("anchor:{}", a.borrow().label)),
            Item::PageBreak(_) => Some("break".to_string()),
            _ => None,
        })
        .collect()
}

fn recursive_parser() -> Parser {
    let mut options = Options::default();
    options.parse.recursive = true;
    Parser::new(options)
}

#[test]
fn follows_relative_links() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(dir.path().join("a.md"), "first [next](b.md)\n").unwrap();
    fs::write(dir.path().join("b.md"), "# Second\n").unwrap();

    let parser = recursive_parser();
    let doc = parser.parse_file(&dir.path().join("a.md").to_string_lossy());

    let shape = anchors_and_breaks(&doc);

    assert_eq!(shape.len(), 3);
    assert!(shape[0].starts_with("anchor:") && shape[0].ends_with("a.md"));
    assert_eq!(shape[1], "break");
    assert!(shape[2].starts_with("anchor:") && shape[2].ends_with("b.md"));

    // The second file's heading made it into the document.
    assert!(doc
        .borrow()
        .items
        .iter()
        .any(|i| matches!(i, Item::Heading(_))));
}

#[test]
fn cycles_are_parsed_once() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(dir.path().join("a.md"), "[to b](b.md)\n").unwrap();
    fs::write(dir.path().join("b.md"), "[back](a.md)\n").unwrap();

    let parser = recursive_parser();
    let doc = parser.parse_file(&dir.path().join("a.md").to_string_lossy());

    let anchors = doc
        .borrow()
        .items
        .iter()
        .filter(|i| matches!(i, Item::Anchor(_)))
        .count();

    assert_eq!(anchors, 2);
}

#[test]
fn wrong_extension_is_skipped() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(dir.path().join("a.md"), "[conf](b.toml)\n").unwrap();
    fs::write(dir.path().join("b.toml"), "not markdown\n").unwrap();

    let parser = recursive_parser();
    let doc = parser.parse_file(&dir.path().join("a.md").to_string_lossy());

    let anchors = doc
        .borrow()
        .items
        .iter()
        .filter(|i| matches!(i, Item::Anchor(_)))
        .count();

    assert_eq!(anchors, 1);
}

#[test]
fn missing_file_yields_empty_document() {
    let parser = recursive_parser();
    let doc = parser.parse_file("/definitely/not/here.md");

    assert!(doc.borrow().items.is_empty());
}

#[test]
fn non_recursive_parser_keeps_one_file() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(dir.path().join("a.md"), "[next](b.md)\n").unwrap();
    fs::write(dir.path().join("b.md"), "other\n").unwrap();

    let parser = Parser::new(Options::default());
    let doc = parser.parse_file(&dir.path().join("a.md").to_string_lossy());

    let anchors = doc
        .borrow()
        .items
        .iter()
        .filter(|i| matches!(i, Item::Anchor(_)))
        .count();

    assert_eq!(anchors, 1);
}

#[test]
fn label_keys_include_the_file_path() {
    let dir = tempfile::tempdir().unwrap();

    fs::write(dir.path().join("a.md"), "# Title\n").unwrap();

    let parser = Parser::new(Options::default());
    let doc = parser.parse_file(&dir.path().join("a.md").to_string_lossy());

    let d = doc.borrow();

    assert!(d
        .labeled_headings
        .keys()
        .all(|k| k.starts_with("#") && k.contains("a.md")));
}
