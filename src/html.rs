//! The HTML rendering visitor.
//!
//! Renders a parsed [`Document`] to HTML: headings carry their label as
//! `id`, reference links are resolved through the document's maps, and
//! footnotes are collected and emitted at the end. A caller-supplied
//! item → id map may decorate arbitrary items.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::nodes::{
    Anchor, Code, Document, FootnoteReference, Heading, HorizontalLine, Image, Item, LineBreak,
    Link, List, ListItem, ListType, Math, NodeRef, Paragraph, RawHtml, StyleDelim, Table,
    TableAlignment, TableCell, TextOpts,
};
use crate::parser::Options;
use crate::visitor::{walk_block_items, walk_paragraph, Visitor};

/// Map from an item (keyed by node identity, see [`item_key`]) to the
/// `id` attribute the renderer should give it.
pub type IdsMap = FxHashMap<usize, String>;

/// Identity key of a shared node handle, for use in an [`IdsMap`].
pub fn item_key<T>(node: &NodeRef<T>) -> usize {
    Rc::as_ptr(node) as *const () as usize
}

/// Escape text content for HTML.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());

    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }

    out
}

struct FootnoteStuff {
    id: String,
    note: NodeRef<crate::nodes::Footnote>,
    count: i64,
}

/// HTML renderer. One-shot: build, call [`HtmlRenderer::to_html`].
pub struct HtmlRenderer<'a> {
    options: &'a Options,
    ids_map: Option<&'a IdsMap>,
    doc: Option<NodeRef<Document>>,
    anchors: Vec<String>,
    fns: Vec<FootnoteStuff>,
    html: String,
}

impl<'a> HtmlRenderer<'a> {
    /// Renderer with the given options and no extra ids.
    pub fn new(options: &'a Options) -> Self {
        HtmlRenderer {
            options,
            ids_map: None,
            doc: None,
            anchors: Vec::new(),
            fns: Vec::new(),
            html: String::new(),
        }
    }

    /// Attach a caller-supplied item → id map.
    pub fn with_ids_map(mut self, ids_map: &'a IdsMap) -> Self {
        self.ids_map = Some(ids_map);
        self
    }

    /// Render the document.
    pub fn to_html(mut self, doc: &NodeRef<Document>) -> String {
        self.doc = Some(Rc::clone(doc));

        self.anchors = doc
            .borrow()
            .items
            .iter()
            .filter_map(|i| match i {
                Item::Anchor(a) => Some(a.borrow().label.clone()),
                _ => None,
            })
            .collect();

        if self.options.render.wrapped_in_article {
            self.html.push_str("<article class=\"markdown-body\">");
        }

        self.process(doc);

        self.render_footnotes();

        if self.options.render.wrapped_in_article {
            self.html.push_str("</article>\n");
        }

        self.html
    }

    fn doc(&self) -> NodeRef<Document> {
        self.doc.clone().expect("renderer is processing a document")
    }

    fn print_custom_id<T>(&mut self, node: &NodeRef<T>) {
        if let Some(map) = self.ids_map {
            if let Some(id) = map.get(&item_key(node)) {
                self.html.push_str(" id=\"");
                self.html.push_str(id);
                self.html.push('"');
            }
        }
    }

    fn open_styles(&mut self, styles: &[StyleDelim]) {
        for s in styles {
            match s.style {
                TextOpts::BOLD => self.html.push_str("<strong>"),
                TextOpts::ITALIC => self.html.push_str("<em>"),
                TextOpts::STRIKETHROUGH => self.html.push_str("<del>"),
                _ => {}
            }
        }
    }

    fn close_styles(&mut self, styles: &[StyleDelim]) {
        for s in styles {
            match s.style {
                TextOpts::BOLD => self.html.push_str("</strong>"),
                TextOpts::ITALIC => self.html.push_str("</em>"),
                TextOpts::STRIKETHROUGH => self.html.push_str("</del>"),
                _ => {}
            }
        }
    }

    /// Resolve a link URL through reference links, file anchors and
    /// labeled headings.
    fn resolve_url(&self, url: &str) -> String {
        let doc = self.doc();
        let doc = doc.borrow();

        let mut url = url.to_string();

        if let Some(l) = doc.labeled_links.get(&url) {
            url = l.borrow().url.clone();
        }

        if self.anchors.contains(&url) {
            return format!("#{}", url);
        }

        if url.starts_with('#') {
            if let Some(h) = doc.labeled_headings.get(&url) {
                if let Some(label) = &h.borrow().label {
                    return label.clone();
                }
            } else if let Some(Item::Anchor(a)) = doc.items.first() {
                // Cross-file label that was never defined: keep only the
                // fragment part.
                let label = a.borrow().label.clone();
                if let Some(sp) = label.rfind('/') {
                    let path = &label[..sp];
                    if let Some(p) = url.find(path) {
                        url.truncate(p.saturating_sub(1));
                    }
                }
            }
        }

        url
    }

    fn render_footnotes(&mut self) {
        if self.fns.is_empty() {
            return;
        }

        self.html.push_str("\n<section class=\"footnotes\"><ol>");

        let fns = std::mem::take(&mut self.fns);

        for f in &fns {
            self.html.push_str("\n<li id=\"");
            self.html.push_str(&f.id);
            self.html.push_str("\">");

            let items = f.note.borrow().items.clone();
            walk_block_items(self, &items);

            for i in 0..f.count.max(1) {
                self.html.push_str("<a href=\"#ref-");
                self.html.push_str(&f.id);
                self.html.push('-');
                self.html.push_str(&(i + 1).to_string());
                self.html.push_str("\">");

                if self.options.render.footnote_back_link_content.is_empty() {
                    self.html.push('\u{21A9}');
                } else {
                    let content = self.options.render.footnote_back_link_content.clone();
                    self.html.push_str(&content);
                }

                self.html.push_str("</a>");
            }

            self.html.push_str("</li>");
        }

        self.html.push_str("\n</ol></section>\n");
    }
}

impl<'a> Visitor for HtmlRenderer<'a> {
    fn on_add_line_ending(&mut self) {
        self.html.push('\n');
    }

    fn on_text(&mut self, t: &NodeRef<crate::nodes::Text>) {
        let t = t.borrow();

        self.open_styles(&t.open_styles);
        self.html.push_str(&escape_html(&t.text));
        self.close_styles(&t.close_styles);
    }

    fn on_math(&mut self, m: &NodeRef<Math>) {
        let (open, close, expr, inline) = {
            let m = m.borrow();
            (
                m.open_styles.clone(),
                m.close_styles.clone(),
                m.expr.clone(),
                m.is_inline,
            )
        };

        self.open_styles(&open);

        self.html.push_str(if inline {
            "<code data-math-style=\"inline\">"
        } else {
            "<code data-math-style=\"display\">"
        });
        self.html.push_str(&escape_html(&expr));
        self.html.push_str("</code>");

        self.close_styles(&close);
    }

    fn on_line_break(&mut self, _b: &NodeRef<LineBreak>) {
        self.html.push_str("<br />");
    }

    fn on_paragraph(&mut self, p: &NodeRef<Paragraph>, wrap: bool) {
        if wrap {
            self.html.push_str("<p");
            self.print_custom_id(p);
            self.html.push('>');
        }

        walk_paragraph(self, p);

        if wrap {
            self.html.push_str("</p>\n");
        }
    }

    fn on_heading(&mut self, h: &NodeRef<Heading>) {
        let (level, label, text) = {
            let h = h.borrow();
            (h.level.clamp(1, 6), h.label.clone(), h.text.clone())
        };

        self.html.push_str(&format!("<h{}", level));

        if let Some(label) = label {
            self.html.push_str(" id=\"");
            self.html.push_str(&label);
            self.html.push('"');
        }

        self.html.push('>');

        if let Some(text) = text {
            walk_paragraph(self, &text);
        }

        self.html.push_str(&format!("</h{}>\n", level));
    }

    fn on_code(&mut self, c: &NodeRef<Code>) {
        let c = c.borrow();

        self.html.push_str("<pre><code");

        if !c.syntax.is_empty() {
            self.html.push_str(" class=\"language-");
            self.html.push_str(&escape_html(&c.syntax));
            self.html.push('"');
        }

        self.html.push('>');
        self.html.push_str(&escape_html(&c.text));
        self.html.push_str("\n</code></pre>\n");
    }

    fn on_inline_code(&mut self, c: &NodeRef<Code>) {
        let c = c.borrow();

        self.open_styles(&c.open_styles);
        self.html.push_str("<code>");
        self.html.push_str(&escape_html(&c.text));
        self.html.push_str("</code>");
        self.close_styles(&c.close_styles);
    }

    fn on_blockquote(&mut self, b: &NodeRef<crate::nodes::Blockquote>) {
        self.html.push_str("<blockquote");
        self.print_custom_id(b);
        self.html.push_str(">\n");

        walk_block_items(self, &b.borrow().items.clone());

        self.html.push_str("</blockquote>\n");
    }

    fn on_list(&mut self, l: &NodeRef<List>) {
        let items = l.borrow().items.clone();

        let ordered = items.iter().any(|i| {
            matches!(i, Item::ListItem(li) if li.borrow().list_type == ListType::Ordered)
        });

        let start = items
            .iter()
            .find_map(|i| match i {
                Item::ListItem(li) => Some(li.borrow().start_number),
                _ => None,
            })
            .unwrap_or(1);

        if ordered {
            if start != 1 {
                self.html
                    .push_str(&format!("<ol start=\"{}\">\n", start));
            } else {
                self.html.push_str("<ol>\n");
            }
        } else {
            self.html.push_str("<ul>\n");
        }

        let mut first = true;
        for item in &items {
            if let Item::ListItem(li) = item {
                self.on_list_item(li, first);
                first = false;
            }
        }

        self.html
            .push_str(if ordered { "</ol>\n" } else { "</ul>\n" });
    }

    fn on_list_item(&mut self, i: &NodeRef<ListItem>, _first: bool) {
        let (is_task, is_checked, items) = {
            let li = i.borrow();
            (li.is_task_list, li.is_checked, li.items.clone())
        };

        self.html.push_str("<li");
        self.print_custom_id(i);
        self.html.push('>');

        if is_task {
            self.html.push_str("<input type=\"checkbox\"");

            if is_checked {
                self.html.push_str(" checked=\"\"");
            }

            self.html.push_str(" disabled=\"\" /> ");
        }

        walk_block_items(self, &items);

        self.html.push_str("</li>\n");
    }

    fn on_table(&mut self, t: &NodeRef<Table>) {
        let (rows, aligns) = {
            let t = t.borrow();
            (t.rows.clone(), t.aligns.clone())
        };

        if rows.is_empty() {
            return;
        }

        let align_attr = |a: TableAlignment| match a {
            TableAlignment::Left => "",
            TableAlignment::Center => " align=\"center\"",
            TableAlignment::Right => " align=\"right\"",
        };

        self.html.push_str("<table>\n<thead>\n<tr>\n");

        for (idx, cell) in rows[0].borrow().cells.iter().enumerate() {
            self.html.push_str("<th");
            self.html
                .push_str(align_attr(aligns.get(idx).copied().unwrap_or_default()));
            self.html.push('>');
            self.on_table_cell(cell);
            self.html.push_str("</th>\n");
        }

        self.html.push_str("</tr>\n</thead>\n<tbody>\n");

        for row in rows.iter().skip(1) {
            self.html.push_str("<tr>\n");

            for (idx, cell) in row.borrow().cells.iter().enumerate() {
                self.html.push_str("<td");
                self.html
                    .push_str(align_attr(aligns.get(idx).copied().unwrap_or_default()));
                self.html.push('>');
                self.on_table_cell(cell);
                self.html.push_str("</td>\n");
            }

            self.html.push_str("</tr>\n");
        }

        self.html.push_str("</tbody>\n</table>\n");
    }

    fn on_table_cell(&mut self, c: &NodeRef<TableCell>) {
        crate::visitor::walk_inline_items(self, &c.borrow().items.clone());
    }

    fn on_anchor(&mut self, a: &NodeRef<Anchor>) {
        if self.options.render.wrapped_in_article {
            self.html.push_str("\n<div id=\"");
            self.html.push_str(&a.borrow().label);
            self.html.push_str("\"></div>\n");
        }
    }

    fn on_raw_html(&mut self, h: &NodeRef<RawHtml>) {
        let h = h.borrow();

        self.open_styles(&h.open_styles);
        self.html.push_str(&h.text);
        self.close_styles(&h.close_styles);
    }

    fn on_horizontal_line(&mut self, _h: &NodeRef<HorizontalLine>) {
        self.html.push_str("<hr />\n");
    }

    fn on_link(&mut self, l: &NodeRef<Link>) {
        let (open, close, url, text, p, img) = {
            let l = l.borrow();
            (
                l.open_styles.clone(),
                l.close_styles.clone(),
                l.url.clone(),
                l.text.clone(),
                l.p.clone(),
                l.img.clone(),
            )
        };

        let url = self.resolve_url(&url);

        self.open_styles(&open);

        self.html.push_str("<a href=\"");
        self.html.push_str(&escape_html(&url));
        self.html.push('"');
        self.print_custom_id(l);
        self.html.push('>');

        if let Some(p) = p.filter(|p| !p.borrow().is_empty()) {
            self.on_paragraph(&p, false);
        } else if let Some(img) = img {
            self.on_image(&img);
        } else if !text.is_empty() {
            self.html.push_str(&escape_html(&text));
        } else {
            self.html.push_str(&escape_html(&url));
        }

        self.html.push_str("</a>");

        self.close_styles(&close);
    }

    fn on_image(&mut self, i: &NodeRef<Image>) {
        let i = i.borrow();

        self.open_styles(&i.open_styles);

        self.html.push_str("<img src=\"");
        self.html.push_str(&escape_html(&i.url));
        self.html.push_str("\" alt=\"");
        self.html.push_str(&escape_html(&i.text));
        self.html.push_str("\" style=\"max-width:100%;\" />");

        self.close_styles(&i.close_styles);
    }

    fn on_footnote_ref(&mut self, r: &NodeRef<FootnoteReference>) {
        let (open, close, id) = {
            let r = r.borrow();
            (r.open_styles.clone(), r.close_styles.clone(), r.id.clone())
        };

        let note = self.doc().borrow().footnotes.get(&id).cloned();

        if let Some(note) = note {
            let idx = self.fns.iter().position(|f| f.id == id);

            let number = match idx {
                Some(i) => {
                    self.fns[i].count += 1;
                    i + 1
                }
                None => {
                    self.fns.push(FootnoteStuff {
                        id: id.clone(),
                        note,
                        count: 1,
                    });
                    self.fns.len()
                }
            };

            self.open_styles(&open);

            self.html.push_str("<sup><a href=\"#");
            self.html.push_str(&id);
            self.html.push_str("\" id=\"ref-");
            self.html.push_str(&id);
            self.html.push('-');
            self.html
                .push_str(&self.fns[number - 1].count.to_string());
            self.html.push_str("\">");
            self.html.push_str(&number.to_string());
            self.html.push_str("</a></sup>");

            self.close_styles(&close);
        }
    }

    fn on_page_break(&mut self) {
        self.html.push_str("\n<hr class=\"page-break\" />\n");
    }
}

/// Render a parsed document to an HTML string.
pub fn render_document(doc: &NodeRef<Document>, options: &Options) -> String {
    HtmlRenderer::new(options).to_html(doc)
}

/// Render a parsed document with an item → id map.
pub fn render_document_with_ids(
    doc: &NodeRef<Document>,
    options: &Options,
    ids_map: &IdsMap,
) -> String {
    HtmlRenderer::new(options).with_ids_map(ids_map).to_html(doc)
}
