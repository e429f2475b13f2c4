use super::*;
use crate::nodes::{Item, Pos};

fn code_at(doc: &crate::nodes::NodeRef<crate::nodes::Document>, idx: usize) -> crate::nodes::NodeRef<crate::nodes::Code> {
    match &body(doc)[idx] {
        Item::Code(c) => c.clone(),
        other => panic!("expected code, got {:?}", other),
    }
}

#[test]
fn fenced_code_with_info() {
    let doc = parse("```rust\nlet x = 1;\n```\n");
    let c = code_at(&doc, 0);
    let c = c.borrow();

    assert!(c.is_fenced);
    assert!(!c.is_inline);
    assert_eq!(c.syntax, "rust");
    assert_eq!(c.text, "let x = 1;");
    assert_eq!(c.start_delim, Pos::new(0, 0, 2, 0));
    assert_eq!(c.end_delim, Pos::new(0, 2, 2, 2));
}

#[test]
fn fenced_code_multiline_body() {
    let doc = parse("```\na\n\nb\n```\n");
    let c = code_at(&doc, 0);

    assert_eq!(c.borrow().text, "a\n\nb");
}

#[test]
fn tilde_fence_unclosed_survives_to_eof() {
    let doc = parse("~~~\nabc\ndef\n");
    let c = code_at(&doc, 0);
    let c = c.borrow();

    assert!(c.is_fenced);
    assert_eq!(c.text, "abc\ndef");
    assert!(c.end_delim.is_null());
    assert_eq!(c.pos.end_line, 2);
}

#[test]
fn closing_fence_must_be_long_enough() {
    let doc = parse("````\ncode\n```\n````\n");
    let c = code_at(&doc, 0);

    assert_eq!(c.borrow().text, "code\n```");
}

#[test]
fn backtick_opener_cannot_contain_backtick() {
    let doc = parse("``` `\ntext\n");

    // The opener is rejected, so this is a paragraph.
    assert!(matches!(body(&doc)[0], Item::Paragraph(_)));
}

#[test]
fn fence_info_is_unescaped_and_decoded() {
    let doc = parse("```a\\&b&amp;c\nx\n```\n");
    let c = code_at(&doc, 0);

    assert_eq!(c.borrow().syntax, "a&b&c");
}

#[test]
fn indented_code() {
    let doc = parse("    code\n");
    let c = code_at(&doc, 0);
    let c = c.borrow();

    assert!(!c.is_fenced);
    assert!(!c.is_inline);
    assert_eq!(c.text, "code");
}

#[test]
fn indented_code_keeps_internal_blank_lines() {
    let doc = parse("    a\n\n    b\n");
    let c = code_at(&doc, 0);

    assert_eq!(c.borrow().text, "a\n\nb");
}

#[test]
fn inline_code_span() {
    let doc = parse("`code`\n");
    let p = paragraph_at(&doc, 0);

    let p = p.borrow();
    match &p.items[0] {
        Item::Code(c) => {
            let c = c.borrow();
            assert!(c.is_inline);
            assert_eq!(c.text, "code");
            assert_eq!(c.start_delim, Pos::new(0, 0, 0, 0));
            assert_eq!(c.end_delim, Pos::new(5, 0, 5, 0));
            assert_eq!(c.pos, Pos::new(1, 0, 4, 0));
        }
        other => panic!("expected inline code, got {:?}", other),
    }
}

#[test]
fn inline_code_with_inner_backtick() {
    let doc = parse("``a`b``\n");
    let p = paragraph_at(&doc, 0);

    let p = p.borrow();
    match &p.items[0] {
        Item::Code(c) => assert_eq!(c.borrow().text, "a`b"),
        other => panic!("expected inline code, got {:?}", other),
    }
}

#[test]
fn inline_code_strips_one_surrounding_space() {
    let doc = parse("` code `\n");
    let p = paragraph_at(&doc, 0);

    let p = p.borrow();
    match &p.items[0] {
        Item::Code(c) => assert_eq!(c.borrow().text, "code"),
        other => panic!("expected inline code, got {:?}", other),
    }
}

#[test]
fn unmatched_backticks_are_literal() {
    let doc = parse("a `b\n");
    let p = paragraph_at(&doc, 0);

    assert_eq!(plain_text(&p), "a `b");
}

#[test]
fn code_html() {
    assert_html(
        "```rust\nlet x = 1;\n```\n",
        "<pre><code class=\"language-rust\">let x = 1;\n</code></pre>\n",
    );
    assert_html("`a < b`\n", "<p><code>a &lt; b</code></p>\n");
}
