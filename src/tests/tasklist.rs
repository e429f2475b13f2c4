use super::*;
use crate::nodes::{Item, Pos};

fn first_item(doc: &crate::nodes::NodeRef<crate::nodes::Document>) -> crate::nodes::NodeRef<crate::nodes::ListItem> {
    match &body(doc)[0] {
        Item::List(l) => match &l.borrow().items[0] {
            Item::ListItem(li) => li.clone(),
            other => panic!("expected list item, got {:?}", other),
        },
        other => panic!("expected list, got {:?}", other),
    }
}

#[test]
fn checked_task_item() {
    // "- [x] done"
    let doc = parse("- [x] done\n");
    let li = first_item(&doc);

    {
        let li = li.borrow();
        assert!(li.is_task_list);
        assert!(li.is_checked);
        assert_eq!(li.task_delim, Pos::new(2, 0, 4, 0));
    }

    let li_borrow = li.borrow();
    match &li_borrow.items[0] {
        Item::Paragraph(p) => assert_eq!(plain_text(p), "done"),
        other => panic!("expected paragraph, got {:?}", other),
    }
}

#[test]
fn unchecked_task_item() {
    let doc = parse("- [ ] todo\n");
    let li = first_item(&doc);

    assert!(li.borrow().is_task_list);
    assert!(!li.borrow().is_checked);
}

#[test]
fn capital_x_counts_as_checked() {
    let doc = parse("- [X] done\n");
    let li = first_item(&doc);

    assert!(li.borrow().is_checked);
}

#[test]
fn bad_marker_is_not_a_task() {
    let doc = parse("- [y] nope\n");
    let li = first_item(&doc);

    assert!(!li.borrow().is_task_list);

    let li_borrow = li.borrow();
    match &li_borrow.items[0] {
        Item::Paragraph(p) => assert_eq!(plain_text(p), "[y] nope"),
        other => panic!("expected paragraph, got {:?}", other),
    }
}

#[test]
fn tasklist_html() {
    assert_html(
        "- [x] done\n",
        "<ul>\n<li><input type=\"checkbox\" checked=\"\" disabled=\"\" /> <p>done</p>\n</li>\n</ul>\n",
    );
}
