use super::*;
use ntest::timeout;

#[test]
#[timeout(10000)]
fn nested_brackets() {
    let md = format!("{}a{}\n", "[".repeat(500), "]".repeat(500));

    let doc = parse(&md);

    assert_eq!(body(&doc).len(), 1);
}

#[test]
#[timeout(10000)]
fn many_emphasis_candidates() {
    let md = format!("{}\n", "*a ".repeat(1000));

    parse(&md);
}

#[test]
#[timeout(10000)]
fn many_backtick_runs() {
    let md = format!("{}\n", "`a` ".repeat(1000));

    let doc = parse(&md);
    let p = paragraph_at(&doc, 0);

    let spans = p
        .borrow()
        .items
        .iter()
        .filter(|i| matches!(i, crate::nodes::Item::Code(_)))
        .count();

    assert_eq!(spans, 1000);
}

#[test]
#[timeout(10000)]
fn deeply_nested_blockquotes() {
    let md = format!("{} x\n", "> ".repeat(128).trim_end());

    parse(&md);
}

#[test]
#[timeout(10000)]
fn unclosed_links_with_emphasis() {
    let md = format!("{}\n", "[ *a* ".repeat(500));

    parse(&md);
}
