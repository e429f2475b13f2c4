use super::*;
use crate::nodes::{Item, TableAlignment};

fn table_at(doc: &crate::nodes::NodeRef<crate::nodes::Document>, idx: usize) -> crate::nodes::NodeRef<crate::nodes::Table> {
    match &body(doc)[idx] {
        Item::Table(t) => t.clone(),
        other => panic!("expected table, got {:?}", other),
    }
}

fn cell_text(cell: &crate::nodes::NodeRef<crate::nodes::TableCell>) -> String {
    let mut out = String::new();

    for item in &cell.borrow().items {
        if let Item::Text(t) = item {
            out.push_str(&t.borrow().text);
        }
    }

    out
}

#[test]
fn basic_table() {
    let doc = parse("| a | b |\n| --- | --- |\n| c | d |\n");
    let t = table_at(&doc, 0);
    let t = t.borrow();

    assert_eq!(t.columns_count(), 2);
    assert_eq!(t.rows.len(), 2);

    let header = t.rows[0].borrow();
    assert_eq!(header.cells.len(), 2);
    assert_eq!(cell_text(&header.cells[0]), "a");
    assert_eq!(cell_text(&header.cells[1]), "b");

    let row = t.rows[1].borrow();
    assert_eq!(cell_text(&row.cells[0]), "c");
    assert_eq!(cell_text(&row.cells[1]), "d");
}

#[test]
fn alignments() {
    let doc = parse("| a | b | c | d |\n| :-- | :-: | --: | --- |\n");
    let t = table_at(&doc, 0);

    assert_eq!(
        t.borrow().aligns,
        vec![
            TableAlignment::Left,
            TableAlignment::Center,
            TableAlignment::Right,
            TableAlignment::Left,
        ]
    );
}

#[test]
fn excess_cells_are_dropped() {
    let doc = parse("| a | b |\n| - | - |\n| c | d | e |\n");
    let t = table_at(&doc, 0);

    assert_eq!(t.borrow().rows[1].borrow().cells.len(), 2);
}

#[test]
fn table_without_leading_pipe() {
    let doc = parse("a | b\n- | -\nc | d\n");
    let t = table_at(&doc, 0);

    assert_eq!(t.borrow().columns_count(), 2);
    assert_eq!(t.borrow().rows.len(), 2);
}

#[test]
fn mismatched_delimiter_row_becomes_paragraph() {
    let doc = parse("| a | b |\nplain text\n");
    let items = body(&doc);

    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Item::Paragraph(_)));
}

#[test]
fn wrong_column_count_becomes_paragraph() {
    let doc = parse("| a | b |\n| --- |\n");

    assert!(body(&doc)
        .iter()
        .all(|i| !matches!(i, Item::Table(_))));
}

#[test]
fn blank_line_ends_the_table() {
    let doc = parse("| a |\n| - |\n| b |\n\ntext\n");
    let items = body(&doc);

    assert_eq!(items.len(), 2);
    assert!(matches!(items[0], Item::Table(_)));
    assert!(matches!(items[1], Item::Paragraph(_)));
}

#[test]
fn escaped_pipe_in_code_span_is_not_a_separator() {
    let doc = parse("| `a\\|b` |\n| --- |\n");
    let t = table_at(&doc, 0);
    let t = t.borrow();

    assert_eq!(t.columns_count(), 1);

    let header = t.rows[0].borrow();
    let cell = header.cells[0].borrow();

    match &cell.items[0] {
        Item::Code(c) => assert_eq!(c.borrow().text, "a|b"),
        other => panic!("expected code in cell, got {:?}", other),
    }
}

#[test]
fn table_inside_blockquote() {
    let doc = parse("> | a |\n> | - |\n");

    match &body(&doc)[0] {
        Item::Blockquote(b) => {
            assert!(b
                .borrow()
                .items
                .iter()
                .any(|i| matches!(i, Item::Table(_))));
        }
        other => panic!("expected blockquote, got {:?}", other),
    }
}

#[test]
fn table_html() {
    assert_html(
        "| a |\n| --- |\n| b |\n",
        "<table>\n<thead>\n<tr>\n<th>a</th>\n</tr>\n</thead>\n<tbody>\n<tr>\n<td>b</td>\n</tr>\n</tbody>\n</table>\n",
    );
}
