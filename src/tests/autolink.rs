use super::*;
use crate::nodes::{Item, Pos};

fn first_link(doc: &crate::nodes::NodeRef<crate::nodes::Document>) -> crate::nodes::NodeRef<crate::nodes::Link> {
    let p = paragraph_at(doc, 0);
    let items = p.borrow().items.clone();

    items
        .iter()
        .find_map(|i| match i {
            Item::Link(l) => Some(l.clone()),
            _ => None,
        })
        .expect("a link in the first paragraph")
}

#[test]
fn angle_autolink_uri() {
    let doc = parse("<https://example.com/a?b=c>\n");
    let l = first_link(&doc);
    let l = l.borrow();

    assert_eq!(l.url, "https://example.com/a?b=c");
    assert_eq!(l.pos, Pos::new(0, 0, 26, 0));
}

#[test]
fn angle_autolink_email_gets_mailto() {
    let doc = parse("<user@example.com>\n");
    let l = first_link(&doc);

    assert_eq!(l.borrow().url, "mailto:user@example.com");
}

#[test]
fn angle_autolink_requires_scheme() {
    let doc = parse("<not a link>\n");
    let p = paragraph_at(&doc, 0);

    assert!(!p.borrow().items.iter().any(|i| matches!(i, Item::Link(_))));
}

#[test]
fn gfm_www_autolink() {
    // Scenario: bare "www.google.com" becomes an http link.
    let doc = parse("www.google.com\n");
    let l = first_link(&doc);
    let l = l.borrow();

    assert_eq!(l.url, "http://www.google.com");
    assert_eq!(l.pos, Pos::new(0, 0, 13, 0));
    assert_eq!(l.text_pos, Pos::new(0, 0, 13, 0));
}

#[test]
fn gfm_http_autolink() {
    let doc = parse("see https://rust-lang.org now\n");
    let l = first_link(&doc);

    assert_eq!(l.borrow().url, "https://rust-lang.org");
}

#[test]
fn gfm_autolink_strips_trailing_punctuation() {
    let doc = parse("go to www.example.com.\n");
    let l = first_link(&doc);

    assert_eq!(l.borrow().url, "http://www.example.com");

    let p = paragraph_at(&doc, 0);
    let last = p.borrow().items.last().cloned().unwrap();

    match last {
        Item::Text(t) => assert!(t.borrow().text.ends_with('.')),
        other => panic!("expected trailing text, got {:?}", other),
    }
}

#[test]
fn gfm_autolink_balances_parens() {
    let doc = parse("www.example.com/a_(b)\n");
    let l = first_link(&doc);

    assert_eq!(l.borrow().url, "http://www.example.com/a_(b)");
}

#[test]
fn gfm_bare_email() {
    let doc = parse("mail me@example.com please\n");
    let l = first_link(&doc);

    assert_eq!(l.borrow().url, "mailto:me@example.com");
}

#[test]
fn gfm_rejects_bad_email_labels() {
    // Leading '-' in a domain label fails the RFC-lite check.
    let doc = parse("x me@-bad.com y\n");
    let p = paragraph_at(&doc, 0);

    assert!(!p.borrow().items.iter().any(|i| matches!(i, Item::Link(_))));
}

#[test]
fn gfm_autolink_needs_allowed_prefix() {
    // After a letter it is not an autolink boundary.
    let doc = parse("xwww.example.com\n");
    let p = paragraph_at(&doc, 0);

    assert!(!p.borrow().items.iter().any(|i| matches!(i, Item::Link(_))));
}

#[test]
fn xmpp_is_left_alone() {
    let doc = parse("xmpp:user@host.com\n");
    let p = paragraph_at(&doc, 0);

    assert!(!p.borrow().items.iter().any(|i| matches!(i, Item::Link(_))));
}

#[test]
fn autolink_html() {
    assert_html(
        "<https://example.com>\n",
        "<p><a href=\"https://example.com\">https://example.com</a></p>\n",
    );
}
