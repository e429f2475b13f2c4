use super::*;
use crate::nodes::{Item, ListType, OrderedListPreState};

fn list_at(doc: &crate::nodes::NodeRef<crate::nodes::Document>, idx: usize) -> crate::nodes::NodeRef<crate::nodes::List> {
    match &body(doc)[idx] {
        Item::List(l) => l.clone(),
        other => panic!("expected list, got {:?}", other),
    }
}

fn items_of(list: &crate::nodes::NodeRef<crate::nodes::List>) -> Vec<crate::nodes::NodeRef<crate::nodes::ListItem>> {
    list.borrow()
        .items
        .iter()
        .map(|i| match i {
            Item::ListItem(li) => li.clone(),
            other => panic!("a list contains only list items, got {:?}", other),
        })
        .collect()
}

#[test]
fn unordered_list() {
    let doc = parse("- a\n- b\n");
    let list = list_at(&doc, 0);
    let items = items_of(&list);

    assert_eq!(items.len(), 2);

    for li in &items {
        assert_eq!(li.borrow().list_type, ListType::Unordered);
        assert!(matches!(li.borrow().items[0], Item::Paragraph(_)));
    }
}

#[test]
fn ordered_list_numbers() {
    let doc = parse("3. a\n4. b\n");
    let list = list_at(&doc, 0);
    let items = items_of(&list);

    assert_eq!(items[0].borrow().list_type, ListType::Ordered);
    assert_eq!(items[0].borrow().start_number, 3);
    assert_eq!(
        items[0].borrow().ordered_pre_state,
        OrderedListPreState::Continue
    );
    assert_eq!(items[1].borrow().start_number, 4);
}

#[test]
fn ordered_list_starting_at_one() {
    let doc = parse("1. a\n2. b\n");
    let list = list_at(&doc, 0);
    let items = items_of(&list);

    assert_eq!(
        items[0].borrow().ordered_pre_state,
        OrderedListPreState::Start
    );
    assert_eq!(
        items[1].borrow().ordered_pre_state,
        OrderedListPreState::Continue
    );
}

#[test]
fn ordered_marker_paren() {
    let doc = parse("1) a\n");
    let list = list_at(&doc, 0);
    let items = items_of(&list);

    assert_eq!(items[0].borrow().list_type, ListType::Ordered);
}

#[test]
fn nested_list() {
    let doc = parse("- a\n  - b\n");
    let list = list_at(&doc, 0);
    let items = items_of(&list);

    assert_eq!(items.len(), 1);

    let inner: Vec<_> = items[0]
        .borrow()
        .items
        .iter()
        .filter(|i| matches!(i, Item::List(_)))
        .cloned()
        .collect();

    assert_eq!(inner.len(), 1);
}

#[test]
fn list_item_with_continuation_paragraph() {
    let doc = parse("- a\n\n  b\n");
    let list = list_at(&doc, 0);
    let items = items_of(&list);

    assert_eq!(items.len(), 1);

    let paragraphs = items[0]
        .borrow()
        .items
        .iter()
        .filter(|i| matches!(i, Item::Paragraph(_)))
        .count();

    assert_eq!(paragraphs, 2);
}

#[test]
fn marker_change_forces_new_list() {
    let doc = parse("- a\n+ b\n");
    let items = body(&doc);

    let lists = items
        .iter()
        .filter(|i| matches!(i, Item::List(_)))
        .count();

    assert_eq!(lists, 2);
}

#[test]
fn list_does_not_interrupt_paragraph_unless_number_one() {
    let doc = parse("text\n2. item\n");
    let items = body(&doc);

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Item::Paragraph(_)));
}

#[test]
fn dash_item_numbered_one_interrupts_paragraph() {
    let doc = parse("text\n1. item\n");
    let items = body(&doc);

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Item::Paragraph(_)));
    assert!(matches!(items[1], Item::List(_)));
}

#[test]
fn marker_delim_position() {
    let doc = parse("10. ten\n");
    let list = list_at(&doc, 0);
    let items = items_of(&list);

    let delim = items[0].borrow().delim;
    assert_eq!(delim.start_col, 0);
    assert_eq!(delim.end_col, 2);
}

#[test]
fn list_html() {
    assert_html("- a\n- b\n", "<ul>\n<li><p>a</p>\n</li>\n<li><p>b</p>\n</li>\n</ul>\n");
}
