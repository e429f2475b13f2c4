use super::*;
use crate::nodes::{Item, Pos};
use crate::strings::case_folded_upper;

fn assert_complete(pos: &Pos, what: &str) {
    assert!(
        pos.start_line >= 0 && pos.start_col >= 0 && pos.end_line >= 0 && pos.end_col >= 0,
        "{} has incomplete position: {:?}",
        what,
        pos
    );

    assert!(
        (pos.start_line, pos.start_col) <= (pos.end_line, pos.end_col),
        "{} has inverted position: {:?}",
        what,
        pos
    );
}

fn walk(items: &[Item], check: &mut dyn FnMut(&Item)) {
    for item in items {
        check(item);

        match item {
            Item::Paragraph(p) => walk(&p.borrow().items, check),
            Item::Blockquote(b) => walk(&b.borrow().items, check),
            Item::List(l) => walk(&l.borrow().items, check),
            Item::ListItem(l) => walk(&l.borrow().items, check),
            Item::Footnote(f) => walk(&f.borrow().items, check),
            Item::Heading(h) => {
                if let Some(text) = h.borrow().text.clone() {
                    walk(&text.borrow().items, check);
                }
            }
            Item::Table(t) => {
                for row in &t.borrow().rows {
                    for cell in &row.borrow().cells {
                        walk(&cell.borrow().items, check);
                    }
                }
            }
            _ => {}
        }
    }
}

const COMPOSITE: &str = "\
# Heading {#h}

para with **bold**, `code`, $m$, [link](https://e.com) and www.x.com text

> quote
> with [^fn]

- item one
- [x] item two

| a | b |
| - | - |
| c | d |

```rust
fenced
```

    indented

***

[^fn]: the footnote
";

#[test]
fn every_produced_item_has_complete_positions() {
    let doc = parse(COMPOSITE);

    let mut count = 0;

    walk(&body(&doc), &mut |item| {
        // Anchors and page breaks are synthetic and carry no position.
        if matches!(item, Item::Anchor(_) | Item::PageBreak(_)) {
            return;
        }

        count += 1;
        assert_complete(&item.pos(), &format!("{:?}", item));
    });

    assert!(count > 15, "walked only {} items", count);
}

#[test]
fn inline_children_are_ordered_by_position() {
    let doc = parse("a **b** `c` [d](u) e\n");
    let p = paragraph_at(&doc, 0);

    let mut last = Pos::new(-1, 0, -1, 0);

    for item in &p.borrow().items {
        let pos = item.pos();

        assert!(
            (pos.start_line, pos.start_col) >= (last.start_line, last.start_col),
            "items out of order: {:?} after {:?}",
            pos,
            last
        );

        last = pos;
    }
}

#[test]
fn label_normalization_is_idempotent() {
    for s in ["Foo Bar", "ÄÖÜ", "mIxEd CaSe", "ß sharp"] {
        let once = case_folded_upper(s);
        let twice = case_folded_upper(&once);

        assert_eq!(once, twice);
    }
}

#[test]
fn blocks_cover_their_children() {
    let doc = parse("> a\n> b\n");

    match &body(&doc)[0] {
        Item::Blockquote(b) => {
            let parent = b.borrow().pos;

            for child in &b.borrow().items {
                let child_pos = child.pos();

                assert!(child_pos.start_line >= parent.start_line);
                assert!(child_pos.end_line <= parent.end_line);
            }
        }
        other => panic!("expected blockquote, got {:?}", other),
    }
}
