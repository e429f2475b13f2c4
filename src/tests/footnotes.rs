use super::*;
use crate::nodes::Item;

#[test]
fn definition_is_registered_not_emitted() {
    let doc = parse("[^note]: the note\n");

    assert_eq!(body(&doc).len(), 0);

    let d = doc.borrow();
    assert_eq!(d.footnotes.len(), 1);

    let f = d.footnotes.get("#^NOTE/").expect("normalized key");

    let f_borrow = f.borrow();
    match &f_borrow.items[0] {
        Item::Paragraph(p) => assert_eq!(plain_text(p), "the note"),
        other => panic!("expected paragraph in footnote, got {:?}", other),
    }
}

#[test]
fn reference_resolves_even_before_definition() {
    let doc = parse("see [^a]\n\n[^a]: below\n");
    let p = paragraph_at(&doc, 0);

    let has_ref = p
        .borrow()
        .items
        .iter()
        .any(|i| matches!(i, Item::FootnoteReference(_)));

    assert!(has_ref);

    let p_borrow = p.borrow();
    match p_borrow
        .items
        .iter()
        .find_map(|i| match i {
            Item::FootnoteReference(r) => Some(r.clone()),
            _ => None,
        }) {
        Some(r) => assert_eq!(r.borrow().id, "#^A/"),
        None => unreachable!(),
    }
}

#[test]
fn definition_spans_indented_continuation() {
    let doc = parse("[^n]: first\n\n    second\n");

    let d = doc.borrow();
    let f = d.footnotes.get("#^N/").expect("definition");

    let paragraphs = f
        .borrow()
        .items
        .iter()
        .filter(|i| matches!(i, Item::Paragraph(_)))
        .count();

    assert_eq!(paragraphs, 2);
}

#[test]
fn label_with_whitespace_is_not_a_footnote() {
    // It is, however, a perfectly fine reference-link definition.
    let doc = parse("[^a b]: no\n");

    assert!(doc.borrow().footnotes.is_empty());
    assert!(doc.borrow().labeled_links.contains_key("#^A B/"));
}

#[test]
fn unknown_reference_stays_text() {
    let doc = parse("[^missing]\n");
    let p = paragraph_at(&doc, 0);

    assert!(p
        .borrow()
        .items
        .iter()
        .all(|i| matches!(i, Item::Text(_))));
}

#[test]
fn id_position_is_recorded() {
    let doc = parse("[^x]: note\n");

    let d = doc.borrow();
    let f = d.footnotes.get("#^X/").unwrap();
    let pos = f.borrow().id_pos;

    assert_eq!(pos.start_col, 0);
    assert_eq!(pos.end_col, 4);
}
