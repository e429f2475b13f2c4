use super::*;
use crate::nodes::Item;

#[test]
fn yaml_header_at_file_start() {
    // "---\nid: 1\n...\ntext\n"
    let doc = parse("---\nid: 1\n...\ntext\n");
    let items = body(&doc);

    assert_eq!(items.len(), 2);

    match &items[0] {
        Item::YamlHeader(y) => {
            let y = y.borrow();
            assert_eq!(y.yaml, "id: 1");
            assert_eq!(y.start_delim.start_line, 0);
            assert_eq!(y.end_delim.start_line, 2);
        }
        other => panic!("expected yaml header, got {:?}", other),
    }

    match &items[1] {
        Item::Paragraph(p) => assert_eq!(plain_text(p), "text"),
        other => panic!("expected paragraph, got {:?}", other),
    }
}

#[test]
fn dash_delimited_end() {
    let doc = parse("---\na: b\nc: d\n---\n");

    match &body(&doc)[0] {
        Item::YamlHeader(y) => assert_eq!(y.borrow().yaml, "a: b\nc: d"),
        other => panic!("expected yaml header, got {:?}", other),
    }
}

#[test]
fn not_at_start_is_not_yaml() {
    let doc = parse("para\n\n---\nx: y\n---\n");

    assert!(body(&doc)
        .iter()
        .all(|i| !matches!(i, Item::YamlHeader(_))));
}

#[test]
fn unterminated_opener_is_not_yaml() {
    let doc = parse("---\njust text\n");

    assert!(body(&doc)
        .iter()
        .all(|i| !matches!(i, Item::YamlHeader(_))));
}

#[test]
fn leading_blank_lines_are_allowed() {
    let doc = parse("\n---\nk: v\n---\nrest\n");

    assert!(body(&doc)
        .iter()
        .any(|i| matches!(i, Item::YamlHeader(_))));
}
