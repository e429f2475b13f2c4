use super::*;
use crate::nodes::Item;

fn quote_at(doc: &crate::nodes::NodeRef<crate::nodes::Document>, idx: usize) -> crate::nodes::NodeRef<crate::nodes::Blockquote> {
    match &body(doc)[idx] {
        Item::Blockquote(b) => b.clone(),
        other => panic!("expected blockquote, got {:?}", other),
    }
}

#[test]
fn simple_blockquote() {
    let doc = parse("> quote\n");
    let q = quote_at(&doc, 0);
    let q = q.borrow();

    assert_eq!(q.items.len(), 1);

    match &q.items[0] {
        Item::Paragraph(p) => assert_eq!(plain_text(p), "quote"),
        other => panic!("expected paragraph, got {:?}", other),
    }

    assert_eq!(q.delims.len(), 1);
    assert_eq!(q.delims[0].start_col, 0);
    assert_eq!(q.delims[0].start_line, 0);
}

#[test]
fn multi_line_blockquote() {
    let doc = parse("> a\n> b\n");
    let q = quote_at(&doc, 0);

    assert_eq!(q.borrow().items.len(), 1);
    assert_eq!(q.borrow().delims.len(), 2);
}

#[test]
fn lazy_continuation_line() {
    let doc = parse("> a\nb\n");
    let q = quote_at(&doc, 0);
    let q = q.borrow();

    assert_eq!(q.items.len(), 1);

    match &q.items[0] {
        Item::Paragraph(p) => {
            assert_eq!(plain_text(p), "ab");
            assert_eq!(p.borrow().items.len(), 2);
        }
        other => panic!("expected paragraph, got {:?}", other),
    }
}

#[test]
fn nested_blockquote() {
    let doc = parse("> > deep\n");
    let q = quote_at(&doc, 0);
    let q = q.borrow();

    match &q.items[0] {
        Item::Blockquote(inner) => {
            assert!(matches!(inner.borrow().items[0], Item::Paragraph(_)));
        }
        other => panic!("expected nested blockquote, got {:?}", other),
    }
}

#[test]
fn blank_line_ends_the_quote() {
    let doc = parse("> a\n\nafter\n");
    let items = body(&doc);

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Item::Blockquote(_)));
    assert!(matches!(items[1], Item::Paragraph(_)));
}

#[test]
fn up_to_three_leading_spaces() {
    let doc = parse("   > ok\n");

    assert!(matches!(body(&doc)[0], Item::Blockquote(_)));
}

#[test]
fn four_leading_spaces_is_code() {
    let doc = parse("    > code\n");

    assert!(matches!(body(&doc)[0], Item::Code(_)));
}

#[test]
fn blockquote_with_list() {
    let doc = parse("> - a\n> - b\n");
    let q = quote_at(&doc, 0);

    assert!(matches!(q.borrow().items[0], Item::List(_)));
}

#[test]
fn blockquote_html() {
    assert_html("> a\n", "<blockquote>\n<p>a</p>\n</blockquote>\n");
}
