use super::*;
use crate::nodes::Item;

fn link_at(
    doc: &crate::nodes::NodeRef<crate::nodes::Document>,
    para: usize,
    idx: usize,
) -> crate::nodes::NodeRef<crate::nodes::Link> {
    let p = paragraph_at(doc, para);
    let items = p.borrow().items.clone();

    match &items[idx] {
        Item::Link(l) => l.clone(),
        other => panic!("expected link, got {:?}", other),
    }
}

#[test]
fn inline_link() {
    let doc = parse("[text](https://example.com)\n");
    let l = link_at(&doc, 0, 0);
    let l = l.borrow();

    assert_eq!(l.url, "https://example.com");
    assert_eq!(l.text, "text");

    let p = l.p.clone().unwrap();
    assert_eq!(plain_text(&p), "text");
}

#[test]
fn inline_link_with_title() {
    let doc = parse("[a](https://e.com \"title\")\n");
    let l = link_at(&doc, 0, 0);

    assert_eq!(l.borrow().url, "https://e.com");
}

#[test]
fn inline_link_angle_destination() {
    let doc = parse("[a](<https://e.com/with space>)\n");
    let l = link_at(&doc, 0, 0);

    assert_eq!(l.borrow().url, "https://e.com/with space");
}

#[test]
fn image() {
    let doc = parse("![alt](image.png)\n");
    let p = paragraph_at(&doc, 0);
    let p = p.borrow();

    match &p.items[0] {
        Item::Image(i) => {
            let i = i.borrow();
            assert_eq!(i.url, "image.png");
            assert_eq!(i.text, "alt");
        }
        other => panic!("expected image, got {:?}", other),
    }
}

#[test]
fn image_inside_link_is_lifted() {
    let doc = parse("[![alt](img.png)](https://e.com)\n");
    let l = link_at(&doc, 0, 0);
    let l = l.borrow();

    assert_eq!(l.url, "https://e.com");

    let img = l.img.clone().expect("embedded image on the link");
    assert_eq!(img.borrow().url, "img.png");
}

#[test]
fn reference_definition_and_shortcut() {
    let doc = parse("[foo]: /url\n\n[foo]\n");

    {
        let d = doc.borrow();
        assert_eq!(d.labeled_links.len(), 1);

        let def = d.labeled_links.get("#FOO/").expect("definition registered");
        assert_eq!(def.borrow().url, "/url");
    }

    // The definition does not appear as content.
    assert_eq!(body(&doc).len(), 1);

    let l = link_at(&doc, 0, 0);
    assert_eq!(l.borrow().url, "#FOO/");
}

#[test]
fn reference_definition_label_is_case_folded() {
    let doc = parse("[F\u{00F6}\u{00D6}]: /url\n");

    let d = doc.borrow();
    assert_eq!(d.labeled_links.len(), 1);
    assert!(d.labeled_links.contains_key("#F\u{00D6}\u{00D6}/"));
}

#[test]
fn full_reference_link() {
    let doc = parse("[ref]: /target\n\n[text][ref]\n");
    let l = link_at(&doc, 0, 0);

    assert_eq!(l.borrow().text, "text");
}

#[test]
fn collapsed_reference_link() {
    let doc = parse("[label]: /target\n\n[label][]\n");
    let l = link_at(&doc, 0, 0);

    assert_eq!(l.borrow().url, "#LABEL/");
}

#[test]
fn undefined_shortcut_stays_text() {
    let doc = parse("[nothing]\n");
    let p = paragraph_at(&doc, 0);

    assert!(p.borrow().items.iter().all(|i| matches!(i, Item::Text(_))));
    assert_eq!(plain_text(&p), "[nothing]");
}

#[test]
fn definition_with_title_on_next_line() {
    let doc = parse("[foo]: /url\n\"title\"\n");

    assert!(doc.borrow().labeled_links.contains_key("#FOO/"));
}

#[test]
fn broken_definition_reverts_to_paragraph() {
    // Nested brackets make every definition attempt fail; everything
    // stays paragraph content and no definition is recorded.
    let md = "[*[*[*[*[foo]*]*]*]*]: bar\n[*[*[*[foo]*]*]*]: bar\n";
    let doc = parse(md);

    assert!(doc.borrow().labeled_links.is_empty());

    let items = body(&doc);
    assert_eq!(items.len(), 1);

    match &items[0] {
        Item::Paragraph(p) => {
            let pos = p.borrow().pos;
            assert_eq!(pos.start_line, 0);
            assert_eq!(pos.end_line, 1);
        }
        other => panic!("expected paragraph, got {:?}", other),
    }
}

#[test]
fn definition_without_url_reverts() {
    let doc = parse("[foo]:\n");

    assert!(doc.borrow().labeled_links.is_empty());
    assert_eq!(body(&doc).len(), 1);
}

#[test]
fn openers_inside_completed_link_deactivate() {
    // CommonMark's active-link rule: no link inside a link.
    let doc = parse("[a [b](u1)](u2)\n");
    let p = paragraph_at(&doc, 0);

    let links: Vec<_> = p
        .borrow()
        .items
        .iter()
        .filter(|i| matches!(i, Item::Link(_)))
        .cloned()
        .collect();

    assert_eq!(links.len(), 1);
}

#[test]
fn link_html() {
    assert_html(
        "[text](https://example.com)\n",
        "<p><a href=\"https://example.com\">text</a></p>\n",
    );
    assert_html(
        "![alt](i.png)\n",
        "<p><img src=\"i.png\" alt=\"alt\" style=\"max-width:100%;\" /></p>\n",
    );
}
