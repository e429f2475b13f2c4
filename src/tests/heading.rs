use super::*;
use crate::nodes::{Item, Pos};

#[test]
fn atx_levels() {
    let doc = parse("# one\n## two\n### three\n#### four\n##### five\n###### six\n");

    for (idx, item) in body(&doc).iter().enumerate() {
        match item {
            Item::Heading(h) => assert_eq!(h.borrow().level, idx as i64 + 1),
            other => panic!("expected heading, got {:?}", other),
        }
    }
}

#[test]
fn seven_hashes_is_a_paragraph() {
    let doc = parse("####### nope\n");

    assert!(matches!(body(&doc)[0], Item::Paragraph(_)));
}

#[test]
fn atx_heading_with_label() {
    // "## headig {#heading} ##"
    let doc = parse("## headig {#heading} ##\n");

    let h = match &body(&doc)[0] {
        Item::Heading(h) => h.clone(),
        other => panic!("expected heading, got {:?}", other),
    };

    let h = h.borrow();

    assert_eq!(h.level, 2);
    assert!(h.label.as_deref().unwrap().starts_with("#heading"));
    assert_eq!(h.label_pos, Pos::new(10, 0, 19, 0));

    assert_eq!(h.delims.len(), 2);
    assert_eq!(h.delims[0], Pos::new(0, 0, 1, 0));
    assert_eq!(h.delims[1], Pos::new(21, 0, 22, 0));

    let text = h.text.clone().unwrap();
    assert_eq!(plain_text(&text), "headig ");

    assert!(doc
        .borrow()
        .labeled_headings
        .keys()
        .any(|k| k.starts_with("#heading")));
}

#[test]
fn auto_generated_label_with_case_variants() {
    let doc = parse("# My Heading\n");

    let h = match &body(&doc)[0] {
        Item::Heading(h) => h.clone(),
        other => panic!("expected heading, got {:?}", other),
    };

    assert_eq!(h.borrow().label.as_deref(), Some("#My-Heading/"));
    assert_eq!(
        h.borrow().label_variants,
        vec!["#My-Heading/".to_string(), "#my-heading/".to_string()]
    );

    let d = doc.borrow();
    assert!(d.labeled_headings.contains_key("#My-Heading/"));
    assert!(d.labeled_headings.contains_key("#my-heading/"));
}

#[test]
fn slug_drops_punctuation() {
    let doc = parse("# a, b & c!\n");

    let h = match &body(&doc)[0] {
        Item::Heading(h) => h.clone(),
        other => panic!("expected heading, got {:?}", other),
    };

    // Letters, digits, '-' and '_' survive; whitespace becomes '-'.
    assert_eq!(h.borrow().label.as_deref(), Some("#a-b--c/"));
}

#[test]
fn setext_level_one() {
    let doc = parse("Title\n=====\n");

    let h = match &body(&doc)[0] {
        Item::Heading(h) => h.clone(),
        other => panic!("expected heading, got {:?}", other),
    };

    let h = h.borrow();
    assert_eq!(h.level, 1);
    assert_eq!(plain_text(&h.text.clone().unwrap()), "Title");
    assert_eq!(h.delims.len(), 1);
    assert_eq!(h.delims[0], Pos::new(0, 1, 4, 1));
}

#[test]
fn setext_level_two() {
    let doc = parse("Title\n---\n");

    match &body(&doc)[0] {
        Item::Heading(h) => assert_eq!(h.borrow().level, 2),
        other => panic!("expected heading, got {:?}", other),
    }
}

#[test]
fn setext_replaces_the_paragraph() {
    let doc = parse("Title\n===\n");

    // The promoted paragraph must not survive next to the heading.
    assert_eq!(body(&doc).len(), 1);
}

#[test]
fn closing_sequence_requires_space() {
    let doc = parse("# heading#\n");

    let h = match &body(&doc)[0] {
        Item::Heading(h) => h.clone(),
        other => panic!("expected heading, got {:?}", other),
    };

    let h = h.borrow();
    assert_eq!(h.delims.len(), 1);
    assert_eq!(plain_text(&h.text.clone().unwrap()), "heading#");
}

#[test]
fn heading_inside_blockquote() {
    let doc = parse("> # quoted\n");

    match &body(&doc)[0] {
        Item::Blockquote(b) => {
            assert!(matches!(b.borrow().items[0], Item::Heading(_)));
        }
        other => panic!("expected blockquote, got {:?}", other),
    }
}
