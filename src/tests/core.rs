use super::*;
use crate::nodes::{Item, TextOpts};
use crate::render_document;

#[test]
fn empty_input() {
    let doc = parse("");

    assert_eq!(body(&doc).len(), 0);
}

#[test]
fn single_paragraph() {
    let doc = parse("hello\n");
    let p = paragraph_at(&doc, 0);

    assert_eq!(plain_text(&p), "hello");

    let pos = p.borrow().pos;
    assert_eq!(pos.start_line, 0);
    assert_eq!(pos.start_col, 0);
}

#[test]
fn paragraph_of_two_lines() {
    let doc = parse("a\nb\n");
    let p = paragraph_at(&doc, 0);

    let items = p.borrow().items.clone();
    assert_eq!(items.len(), 2);

    match (&items[0], &items[1]) {
        (Item::Text(a), Item::Text(b)) => {
            assert_eq!(a.borrow().text, "a");
            assert_eq!(b.borrow().text, "b");
            assert_eq!(a.borrow().pos.start_line, 0);
            assert_eq!(b.borrow().pos.start_line, 1);
        }
        other => panic!("unexpected items: {:?}", other),
    }
}

#[test]
fn two_paragraphs() {
    let doc = parse("one\n\ntwo\n");

    assert_eq!(body(&doc).len(), 2);
    assert_eq!(plain_text(&paragraph_at(&doc, 0)), "one");
    assert_eq!(plain_text(&paragraph_at(&doc, 1)), "two");
}

#[test]
fn thematic_break() {
    let doc = parse("***\n");

    assert!(matches!(body(&doc)[0], Item::HorizontalLine(_)));
}

#[test]
fn thematic_break_interrupts_paragraph() {
    let doc = parse("text\n***\nmore\n");
    let items = body(&doc);

    assert_eq!(items.len(), 3);
    assert!(matches!(items[0], Item::Paragraph(_)));
    assert!(matches!(items[1], Item::HorizontalLine(_)));
    assert!(matches!(items[2], Item::Paragraph(_)));
}

#[test]
fn backslash_escape_is_removed() {
    let doc = parse("\\*not emphasized\\*\n");
    let p = paragraph_at(&doc, 0);

    assert_eq!(plain_text(&p), "*not emphasized*");

    for item in &p.borrow().items {
        assert!(item.opts().is_none());
    }
}

#[test]
fn entity_replacement() {
    let doc = parse("a &amp; b &#65; &#x42;\n");
    let p = paragraph_at(&doc, 0);

    assert_eq!(plain_text(&p), "a & b A B");
}

#[test]
fn nul_becomes_replacement_char() {
    let doc = parse("a\u{0}b\n");
    let p = paragraph_at(&doc, 0);

    assert_eq!(plain_text(&p), "a\u{FFFD}b");
}

#[test]
fn hard_line_break_with_spaces() {
    let doc = parse("a  \nb\n");
    let p = paragraph_at(&doc, 0);

    let items = p.borrow().items.clone();
    assert_eq!(items.len(), 3);
    assert!(matches!(items[0], Item::Text(_)));
    assert!(matches!(items[1], Item::LineBreak(_)));
    assert!(matches!(items[2], Item::Text(_)));
}

#[test]
fn hard_line_break_with_backslash() {
    let doc = parse("a\\\nb\n");
    let p = paragraph_at(&doc, 0);

    assert!(p
        .borrow()
        .items
        .iter()
        .any(|i| matches!(i, Item::LineBreak(_))));
}

#[test]
fn no_hard_break_on_last_line() {
    let doc = parse("a\\\n");
    let p = paragraph_at(&doc, 0);

    assert!(!p
        .borrow()
        .items
        .iter()
        .any(|i| matches!(i, Item::LineBreak(_))));
}

#[test]
fn clone_is_equivalent() {
    let md = "# Head {#h}\n\npara with **bold** and `code`\n\n- [x] task\n\n> quote\n\n\
              | a | b |\n| - | - |\n| c | d |\n\n[^f]\n\n[^f]: note\n";

    let options = Options::default();
    let doc = parse(md);
    let clone = doc.borrow().deep_clone();

    pretty_assertions::assert_eq!(
        render_document(&doc, &options),
        render_document(&clone, &options)
    );
}

#[test]
fn clone_repopulates_heading_map() {
    let doc = parse("# Title\n");
    let clone = doc.borrow().deep_clone();

    assert_eq!(
        clone.borrow().labeled_headings.len(),
        doc.borrow().labeled_headings.len()
    );

    for key in doc.borrow().labeled_headings.keys() {
        assert!(clone.borrow().labeled_headings.contains_key(key));
    }
}

#[test]
fn opts_bitmask_combines() {
    let doc = parse("***both***\n");
    let p = paragraph_at(&doc, 0);
    let p = p.borrow();

    match &p.items[0] {
        Item::Text(t) => {
            let t = t.borrow();
            assert_eq!(t.text, "both");
            assert!(t.opts.contains(TextOpts::BOLD));
            assert!(t.opts.contains(TextOpts::ITALIC));
        }
        other => panic!("expected text, got {:?}", other),
    }
}

#[test]
fn commonmark_preset_has_no_gfm() {
    let mut options = Options::default();
    options.parse.pipeline = crate::PipelinePreset::CommonMark;

    let doc = crate::parse_document("www.google.com\n", &options);
    let items = doc.borrow().items.clone();

    match &items[1] {
        Item::Paragraph(p) => {
            assert!(p
                .borrow()
                .items
                .iter()
                .all(|i| matches!(i, Item::Text(_))));
        }
        other => panic!("expected paragraph, got {:?}", other),
    }
}
