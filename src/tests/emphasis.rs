use super::*;
use crate::nodes::{Item, Pos, StyleDelim, TextOpts};

fn text_at(doc: &crate::nodes::NodeRef<crate::nodes::Document>, idx: usize) -> crate::nodes::NodeRef<crate::nodes::Text> {
    let p = paragraph_at(doc, 0);
    let items = p.borrow().items.clone();

    match &items[idx] {
        Item::Text(t) => t.clone(),
        other => panic!("expected text at {}, got {:?}", idx, other),
    }
}

#[test]
fn simple_emphasis() {
    let doc = parse("*em*\n");
    let t = text_at(&doc, 0);
    let t = t.borrow();

    assert_eq!(t.text, "em");
    assert_eq!(t.opts, TextOpts::ITALIC);
    assert_eq!(t.open_styles.len(), 1);
    assert_eq!(t.close_styles.len(), 1);
}

#[test]
fn simple_strong() {
    let doc = parse("**strong**\n");
    let t = text_at(&doc, 0);
    let t = t.borrow();

    assert_eq!(t.text, "strong");
    assert_eq!(t.opts, TextOpts::BOLD);
    assert_eq!(t.open_styles[0], StyleDelim::new(TextOpts::BOLD, 0, 0, 1, 0));
    assert_eq!(t.close_styles[0], StyleDelim::new(TextOpts::BOLD, 8, 0, 9, 0));
}

#[test]
fn underscore_emphasis() {
    let doc = parse("_em_\n");
    let t = text_at(&doc, 0);

    assert_eq!(t.borrow().opts, TextOpts::ITALIC);
}

#[test]
fn underscore_not_intraword() {
    let doc = parse("intra_word_stays\n");
    let p = paragraph_at(&doc, 0);

    assert_eq!(plain_text(&p), "intra_word_stays");
    assert!(p.borrow().items.iter().all(|i| i.opts().is_none()));
}

#[test]
fn nested_italic_in_bold() {
    // "**Some* text**"
    let doc = parse("**Some* text**\n");
    let p = paragraph_at(&doc, 0);
    assert_eq!(p.borrow().items.len(), 3);

    {
        let t = text_at(&doc, 0);
        let t = t.borrow();
        assert_eq!(t.text, "Some");
        assert_eq!(t.opts, TextOpts::ITALIC);
        assert_eq!(
            t.open_styles.to_vec(),
            vec![
                StyleDelim::new(TextOpts::ITALIC, 0, 0, 0, 0),
                StyleDelim::new(TextOpts::ITALIC, 1, 0, 1, 0),
            ]
        );
        assert_eq!(
            t.close_styles.to_vec(),
            vec![StyleDelim::new(TextOpts::ITALIC, 6, 0, 6, 0)]
        );
    }

    {
        let t = text_at(&doc, 1);
        let t = t.borrow();
        assert_eq!(t.text, " text");
        assert_eq!(t.opts, TextOpts::ITALIC);
        assert_eq!(
            t.close_styles.to_vec(),
            vec![StyleDelim::new(TextOpts::ITALIC, 12, 0, 12, 0)]
        );
    }

    {
        let t = text_at(&doc, 2);
        let t = t.borrow();
        assert_eq!(t.text, "*");
        assert!(t.opts.is_none());
        assert_eq!(t.pos, Pos::new(13, 0, 13, 0));
    }
}

#[test]
fn tricky_emphasis_257() {
    // "**_some_* text*"
    let doc = parse("**_some_* text*\n");
    let p = paragraph_at(&doc, 0);
    assert_eq!(p.borrow().items.len(), 2);

    {
        let t = text_at(&doc, 0);
        let t = t.borrow();
        assert_eq!(t.text, "some");
        assert_eq!(t.opts, TextOpts::ITALIC);
        assert_eq!(t.open_styles.len(), 3);
        assert_eq!(t.open_styles[0].pos, Pos::new(0, 0, 0, 0));
        assert_eq!(t.open_styles[1].pos, Pos::new(1, 0, 1, 0));
        assert_eq!(t.open_styles[2].pos, Pos::new(2, 0, 2, 0));
        assert_eq!(t.close_styles.len(), 2);
        assert_eq!(t.close_styles[0].pos, Pos::new(7, 0, 7, 0));
        assert_eq!(t.close_styles[1].pos, Pos::new(8, 0, 8, 0));
    }

    {
        let t = text_at(&doc, 1);
        let t = t.borrow();
        assert_eq!(t.text, " text");
        assert_eq!(t.opts, TextOpts::ITALIC);
        assert!(t.open_styles.is_empty());
        assert_eq!(t.close_styles.len(), 1);
        assert_eq!(t.close_styles[0].pos, Pos::new(14, 0, 14, 0));
    }
}

#[test]
fn strikethrough_run() {
    // "~~text~~text~~"
    let doc = parse("~~text~~text~~\n");
    let p = paragraph_at(&doc, 0);
    assert_eq!(p.borrow().items.len(), 2);

    {
        let t = text_at(&doc, 0);
        let t = t.borrow();
        assert_eq!(t.pos, Pos::new(2, 0, 5, 0));
        assert_eq!(t.opts, TextOpts::STRIKETHROUGH);
        assert_eq!(t.open_styles.len(), 1);
        assert_eq!(t.close_styles.len(), 1);
    }

    {
        let t = text_at(&doc, 1);
        let t = t.borrow();
        assert_eq!(t.pos, Pos::new(8, 0, 13, 0));
        assert!(t.opts.is_none());
        assert!(t.open_styles.is_empty());
        assert!(t.close_styles.is_empty());
    }
}

#[test]
fn strikethrough_three_tildes_is_literal() {
    let doc = parse("~~~stay~~~ here\n");

    // A tilde fence at the start of a line opens fenced code instead.
    assert!(matches!(body(&doc)[0], Item::Code(_)));
}

#[test]
fn single_tilde_strikethrough() {
    let doc = parse("a ~x~ b\n");
    let t = text_at(&doc, 1);

    assert_eq!(t.borrow().text, "x");
    assert_eq!(t.borrow().opts, TextOpts::STRIKETHROUGH);
}

#[test]
fn rule_of_three() {
    let doc = parse("*a**b*\n");
    let p = paragraph_at(&doc, 0);

    // The double run cannot pair with either single run (rule of 3), so
    // it stays literal inside the emphasis.
    assert_eq!(plain_text(&p), "a**b");
}

#[test]
fn html_output() {
    assert_html("*a*\n", "<p><em>a</em></p>\n");
    assert_html("**a**\n", "<p><strong>a</strong></p>\n");
    assert_html("~~a~~\n", "<p><del>a</del></p>\n");
}
