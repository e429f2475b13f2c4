use super::*;
use crate::nodes::{Item, Pos};

#[test]
fn inline_math() {
    let doc = parse("$x^2$\n");
    let p = paragraph_at(&doc, 0);

    let p = p.borrow();
    match &p.items[0] {
        Item::Math(m) => {
            let m = m.borrow();
            assert!(m.is_inline);
            assert_eq!(m.expr, "x^2");
            assert_eq!(m.start_delim, Pos::new(0, 0, 0, 0));
            assert_eq!(m.end_delim, Pos::new(4, 0, 4, 0));
        }
        other => panic!("expected math, got {:?}", other),
    }
}

#[test]
fn display_math() {
    let doc = parse("$$y^2$$\n");
    let p = paragraph_at(&doc, 0);

    let p = p.borrow();
    match &p.items[0] {
        Item::Math(m) => {
            let m = m.borrow();
            assert!(!m.is_inline);
            assert_eq!(m.expr, "y^2");
        }
        other => panic!("expected math, got {:?}", other),
    }
}

#[test]
fn math_amid_text() {
    let doc = parse("before $a+b$ after\n");
    let p = paragraph_at(&doc, 0);
    let items = p.borrow().items.clone();

    assert_eq!(items.len(), 3);
    assert!(matches!(items[0], Item::Text(_)));
    assert!(matches!(items[1], Item::Math(_)));
    assert!(matches!(items[2], Item::Text(_)));
}

#[test]
fn math_strips_symmetric_backticks() {
    let doc = parse("$`x`$\n");
    let p = paragraph_at(&doc, 0);

    let p = p.borrow();
    match &p.items[0] {
        Item::Math(m) => assert_eq!(m.borrow().expr, "x"),
        other => panic!("expected math, got {:?}", other),
    }
}

#[test]
fn unclosed_dollar_is_literal() {
    let doc = parse("a $b c\n");
    let p = paragraph_at(&doc, 0);

    assert_eq!(plain_text(&p), "a $b c");
}

#[test]
fn escaped_dollar_is_literal() {
    let doc = parse("\\$2+2\\$\n");
    let p = paragraph_at(&doc, 0);

    assert_eq!(plain_text(&p), "$2+2$");
}

#[test]
fn math_fence_lowers_to_display_math() {
    let doc = parse("```math\na^2 + b^2\n```\n");

    let p = match &body(&doc)[0] {
        Item::Paragraph(p) => p.clone(),
        other => panic!("expected wrapping paragraph, got {:?}", other),
    };

    let items = p.borrow().items.clone();
    assert_eq!(items.len(), 1);

    match &items[0] {
        Item::Math(m) => {
            let m = m.borrow();
            assert!(!m.is_inline);
            assert!(m.is_fenced_code);
            assert_eq!(m.expr, "a^2 + b^2");
        }
        other => panic!("expected math, got {:?}", other),
    }
}

#[test]
fn math_fence_is_case_insensitive() {
    let doc = parse("```MATH\nx\n```\n");

    match &body(&doc)[0] {
        Item::Paragraph(p) => {
            assert!(matches!(p.borrow().items[0], Item::Math(_)));
        }
        other => panic!("expected wrapping paragraph, got {:?}", other),
    }
}

#[test]
fn math_html() {
    assert_html(
        "$x$\n",
        "<p><code data-math-style=\"inline\">x</code></p>\n",
    );
}
