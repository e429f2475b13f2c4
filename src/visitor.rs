//! Walking a parsed [`Document`].
//!
//! [`Visitor`] mirrors the document's structure with one hook per node
//! type; the `walk_*` helpers implement the default traversal order so
//! that implementors can override a hook and still delegate the walk.

use crate::nodes::{
    Anchor, Blockquote, Code, Document, Footnote, FootnoteReference, Heading, HorizontalLine,
    Image, Item, LineBreak, Link, List, ListItem, Math, NodeRef, Paragraph, RawHtml, Table,
    TableCell, Text, YamlHeader,
};

/// Hooks over every node type, with the default walk built in.
#[allow(unused_variables)]
pub trait Visitor {
    /// Called between inline items that sit on different source lines.
    fn on_add_line_ending(&mut self) {}

    /// Textual content.
    fn on_text(&mut self, t: &NodeRef<Text>) {}

    /// Math expression.
    fn on_math(&mut self, m: &NodeRef<Math>) {}

    /// Hard line break.
    fn on_line_break(&mut self, b: &NodeRef<LineBreak>) {}

    /// Paragraph; `wrap` is false for link/image descriptions.
    fn on_paragraph(&mut self, p: &NodeRef<Paragraph>, wrap: bool) {
        walk_paragraph(self, p);
    }

    /// Heading.
    fn on_heading(&mut self, h: &NodeRef<Heading>) {
        if let Some(text) = h.borrow().text.clone() {
            self.on_paragraph(&text, false);
        }
    }

    /// Code block.
    fn on_code(&mut self, c: &NodeRef<Code>) {}

    /// Inline code span.
    fn on_inline_code(&mut self, c: &NodeRef<Code>) {}

    /// Blockquote.
    fn on_blockquote(&mut self, b: &NodeRef<Blockquote>) {
        walk_block_items(self, &b.borrow().items);
    }

    /// List.
    fn on_list(&mut self, l: &NodeRef<List>) {
        let mut first = true;
        for item in &l.borrow().items {
            if let Item::ListItem(li) = item {
                self.on_list_item(li, first);
                first = false;
            }
        }
    }

    /// List item.
    fn on_list_item(&mut self, i: &NodeRef<ListItem>, first: bool) {
        walk_block_items(self, &i.borrow().items);
    }

    /// Table.
    fn on_table(&mut self, t: &NodeRef<Table>) {
        for row in &t.borrow().rows {
            for cell in &row.borrow().cells {
                self.on_table_cell(cell);
            }
        }
    }

    /// Table cell.
    fn on_table_cell(&mut self, c: &NodeRef<TableCell>) {
        walk_inline_items(self, &c.borrow().items);
    }

    /// Per-file anchor.
    fn on_anchor(&mut self, a: &NodeRef<Anchor>) {}

    /// Raw HTML (block or inline).
    fn on_raw_html(&mut self, h: &NodeRef<RawHtml>) {}

    /// Thematic break.
    fn on_horizontal_line(&mut self, h: &NodeRef<HorizontalLine>) {}

    /// Link.
    fn on_link(&mut self, l: &NodeRef<Link>) {}

    /// Image.
    fn on_image(&mut self, i: &NodeRef<Image>) {}

    /// Footnote reference.
    fn on_footnote_ref(&mut self, r: &NodeRef<FootnoteReference>) {}

    /// Footnote definition.
    fn on_footnote(&mut self, f: &NodeRef<Footnote>) {
        walk_block_items(self, &f.borrow().items);
    }

    /// YAML front matter.
    fn on_yaml_header(&mut self, y: &NodeRef<YamlHeader>) {}

    /// Page break between files.
    fn on_page_break(&mut self) {}

    /// Walk a whole document in source order.
    fn process(&mut self, doc: &NodeRef<Document>) {
        let items = doc.borrow().items.clone();
        walk_block_items(self, &items);
    }
}

/// Dispatch block-level items in order.
pub fn walk_block_items<V: Visitor + ?Sized>(v: &mut V, items: &[Item]) {
    for item in items {
        match item {
            Item::Heading(h) => v.on_heading(h),
            Item::Paragraph(p) => v.on_paragraph(p, true),
            Item::Code(c) => v.on_code(c),
            Item::Blockquote(b) => v.on_blockquote(b),
            Item::List(l) => v.on_list(l),
            Item::Table(t) => v.on_table(t),
            Item::Anchor(a) => v.on_anchor(a),
            Item::RawHtml(h) => v.on_raw_html(h),
            Item::HorizontalLine(h) => v.on_horizontal_line(h),
            Item::PageBreak(_) => v.on_page_break(),
            Item::YamlHeader(y) => v.on_yaml_header(y),
            Item::Footnote(f) => v.on_footnote(f),
            _ => {}
        }
    }
}

/// Dispatch inline items in order, emitting line endings between items on
/// different source lines.
pub fn walk_inline_items<V: Visitor + ?Sized>(v: &mut V, items: &[Item]) {
    let mut l = items.first().map(|i| i.pos().start_line).unwrap_or(-1);

    for item in items {
        if item.pos().start_line != l {
            v.on_add_line_ending();
        }

        l = item.pos().end_line;

        match item {
            Item::Text(t) => v.on_text(t),
            Item::Code(c) => v.on_inline_code(c),
            Item::Link(link) => v.on_link(link),
            Item::Image(i) => v.on_image(i),
            Item::Math(m) => v.on_math(m),
            Item::LineBreak(b) => v.on_line_break(b),
            Item::FootnoteReference(r) => v.on_footnote_ref(r),
            Item::RawHtml(h) => v.on_raw_html(h),
            _ => {}
        }
    }
}

/// The default paragraph walk.
pub fn walk_paragraph<V: Visitor + ?Sized>(v: &mut V, p: &NodeRef<Paragraph>) {
    walk_inline_items(v, &p.borrow().items);
}
