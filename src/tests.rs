mod autolink;
mod blockquote;
mod code;
mod core;
mod emphasis;
mod footnotes;
mod front_matter;
mod heading;
mod html;
mod links;
mod list;
mod math;
mod pathological;
mod recursion;
mod sourcepos;
mod table;
mod tasklist;

pub use crate::nodes::{Document, Item, NodeRef, Paragraph};
pub use crate::{markdown_to_html, parse_document, Options};

/// Parse with default options (empty path and file name, so label keys
/// end in `/`).
pub fn parse(md: &str) -> NodeRef<Document> {
    parse_document(md, &Options::default())
}

/// Document items with the leading per-file anchor stripped.
pub fn body(doc: &NodeRef<Document>) -> Vec<Item> {
    let items = doc.borrow().items.clone();

    assert!(
        matches!(items.first(), Some(Item::Anchor(_))),
        "the first item of a parsed file is its anchor"
    );

    items[1..].to_vec()
}

/// The nth body item, downcast to a paragraph.
pub fn paragraph_at(doc: &NodeRef<Document>, idx: usize) -> NodeRef<Paragraph> {
    match &body(doc)[idx] {
        Item::Paragraph(p) => p.clone(),
        other => panic!("expected a paragraph, got {:?}", other),
    }
}

#[track_caller]
pub fn assert_html(md: &str, expected: &str) {
    pretty_assertions::assert_eq!(markdown_to_html(md, &Options::default()), expected);
}

/// The concatenated plain text of a paragraph's `Text` children.
pub fn plain_text(p: &NodeRef<Paragraph>) -> String {
    let mut out = String::new();

    for item in &p.borrow().items {
        if let Item::Text(t) = item {
            out.push_str(&t.borrow().text);
        }
    }

    out
}
