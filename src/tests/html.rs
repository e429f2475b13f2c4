use super::*;
use crate::nodes::Item;

fn raw_html_at(doc: &crate::nodes::NodeRef<crate::nodes::Document>, idx: usize) -> crate::nodes::NodeRef<crate::nodes::RawHtml> {
    match &body(doc)[idx] {
        Item::RawHtml(h) => h.clone(),
        other => panic!("expected raw html, got {:?}", other),
    }
}

#[test]
fn block_rule_six_closes_on_blank_line() {
    let doc = parse("<div>\nfoo\n</div>\n\npara\n");
    let items = body(&doc);

    assert_eq!(items.len(), 2);

    let h = raw_html_at(&doc, 0);
    assert_eq!(h.borrow().text, "<div>\nfoo\n</div>");

    assert!(matches!(items[1], Item::Paragraph(_)));
}

#[test]
fn block_rule_one_pre() {
    let doc = parse("<pre>\nkeep\n</pre>\ntext\n");
    let h = raw_html_at(&doc, 0);

    assert_eq!(h.borrow().text, "<pre>\nkeep\n</pre>");
}

#[test]
fn block_rule_two_comment() {
    let doc = parse("<!-- a comment -->\n");
    let h = raw_html_at(&doc, 0);

    assert_eq!(h.borrow().text, "<!-- a comment -->");
}

#[test]
fn block_rule_three_processing_instruction() {
    let doc = parse("<?php echo 1; ?>\n");

    assert!(matches!(body(&doc)[0], Item::RawHtml(_)));
}

#[test]
fn rule_seven_does_not_interrupt_paragraph() {
    let doc = parse("text\n<custom>\n");
    let items = body(&doc);

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Item::Paragraph(_)));
}

#[test]
fn rule_six_interrupts_paragraph() {
    let doc = parse("text\n<div>\n");
    let items = body(&doc);

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Item::Paragraph(_)));
    assert!(matches!(items[1], Item::RawHtml(_)));
}

#[test]
fn inline_open_tag() {
    let doc = parse("a <b>bold</b> c\n");
    let p = paragraph_at(&doc, 0);
    let items = p.borrow().items.clone();

    let raws: Vec<String> = items
        .iter()
        .filter_map(|i| match i {
            Item::RawHtml(h) => Some(h.borrow().text.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(raws, vec!["<b>".to_string(), "</b>".to_string()]);
}

#[test]
fn inline_tag_with_attributes() {
    let doc = parse("x <a href=\"y\" data-n='1'> z\n");
    let p = paragraph_at(&doc, 0);

    assert!(p
        .borrow()
        .items
        .iter()
        .any(|i| matches!(i, Item::RawHtml(_))));
}

#[test]
fn inline_comment() {
    let doc = parse("a <!-- hi --> b\n");
    let p = paragraph_at(&doc, 0);

    let raw = p
        .borrow()
        .items
        .iter()
        .find_map(|i| match i {
            Item::RawHtml(h) => Some(h.borrow().text.clone()),
            _ => None,
        })
        .expect("inline comment parsed");

    assert_eq!(raw, "<!-- hi -->");
}

#[test]
fn malformed_tag_is_text() {
    let doc = parse("1 < 2 and 2 <3\n");
    let p = paragraph_at(&doc, 0);

    assert!(p.borrow().items.iter().all(|i| matches!(i, Item::Text(_))));
    assert_eq!(plain_text(&p), "1 < 2 and 2 <3");
}

#[test]
fn raw_html_passes_through_renderer() {
    assert_html("a <b>x</b>\n", "<p>a <b>x</b></p>\n");
}
