//! The Markdown document tree.
//!
//! Every node carries a source [`Pos`]; nodes that take part in inline
//! emphasis additionally carry a [`TextOpts`] bitmask and ordered lists of
//! opening/closing [`StyleDelim`]s.
//!
//! Nodes are shared `Rc<RefCell<T>>` handles: items are reachable both from
//! the block tree and from the [`Document`] label maps, and block parsers
//! keep extending a node after it has been attached to its parent.

use std::cell::RefCell;
use std::ops::{BitOr, BitOrAssign};
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Shared handle to a document node.
pub type NodeRef<T> = Rc<RefCell<T>>;

/// Wrap a node value into a shared handle.
pub fn node<T>(value: T) -> NodeRef<T> {
    Rc::new(RefCell::new(value))
}

/// Source position of an item: `(start_line, start_col)`–`(end_line,
/// end_col)`, zero-based, `-1` marking an unset field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    /// Start column.
    pub start_col: i64,
    /// Start line.
    pub start_line: i64,
    /// End column (inclusive).
    pub end_col: i64,
    /// End line (inclusive).
    pub end_line: i64,
}

impl Default for Pos {
    fn default() -> Self {
        Pos {
            start_col: -1,
            start_line: -1,
            end_col: -1,
            end_line: -1,
        }
    }
}

impl Pos {
    /// Position with all four fields set.
    pub fn new(start_col: i64, start_line: i64, end_col: i64, end_line: i64) -> Self {
        Pos {
            start_col,
            start_line,
            end_col,
            end_line,
        }
    }

    /// The unset position.
    pub fn null() -> Self {
        Pos::default()
    }

    /// Whether no field has been set yet.
    pub fn is_null(&self) -> bool {
        self.start_col == -1 && self.start_line == -1 && self.end_col == -1 && self.end_line == -1
    }

    /// `true` when `what` lies entirely inside `self`.
    pub fn contains(&self, what: &Pos) -> bool {
        what.start_line >= self.start_line
            && what.end_line <= self.end_line
            && (what.start_line != self.start_line || what.start_col >= self.start_col)
            && (what.end_line != self.end_line || what.end_col <= self.end_col)
    }
}

/// Inline style options, ORed together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextOpts(pub u8);

impl TextOpts {
    /// No styling.
    pub const NONE: TextOpts = TextOpts(0);
    /// Bold (strong emphasis).
    pub const BOLD: TextOpts = TextOpts(1);
    /// Italic (emphasis).
    pub const ITALIC: TextOpts = TextOpts(2);
    /// GFM strikethrough.
    pub const STRIKETHROUGH: TextOpts = TextOpts(4);

    /// Whether all bits of `other` are set.
    pub fn contains(&self, other: TextOpts) -> bool {
        self.0 & other.0 == other.0
    }

    /// Whether no style bit is set.
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TextOpts {
    type Output = TextOpts;

    fn bitor(self, rhs: TextOpts) -> TextOpts {
        TextOpts(self.0 | rhs.0)
    }
}

impl BitOrAssign for TextOpts {
    fn bitor_assign(&mut self, rhs: TextOpts) {
        self.0 |= rhs.0;
    }
}

/// One emphasis delimiter run (an opener or a closer), with the style it
/// contributes and its exact source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleDelim {
    /// Style contributed by this run.
    pub style: TextOpts,
    /// Position of the run.
    pub pos: Pos,
}

impl StyleDelim {
    /// Delimiter with the given style and position.
    pub fn new(
        style: TextOpts,
        start_col: i64,
        start_line: i64,
        end_col: i64,
        end_line: i64,
    ) -> Self {
        StyleDelim {
            style,
            pos: Pos::new(start_col, start_line, end_col, end_line),
        }
    }
}

/// Ordering used when merging resolved emphasis delimiters back into the
/// paragraph; unset positions sort last.
pub fn style_delim_before(a: &StyleDelim, b: &StyleDelim) -> bool {
    if a.pos.start_line != -1 && b.pos.start_line == -1 {
        true
    } else if a.pos.start_line == -1 && b.pos.start_line != -1 {
        false
    } else {
        a.pos.start_line < b.pos.start_line
            || (a.pos.start_line == b.pos.start_line && a.pos.start_col < b.pos.start_col)
    }
}

/// List of emphasis delimiters attached to one item.
pub type Styles = SmallVec<[StyleDelim; 2]>;

/// Alignment of one table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableAlignment {
    /// `:---` or `---`.
    #[default]
    Left,
    /// `:---:`.
    Center,
    /// `---:`.
    Right,
}

/// Kind of a list item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListType {
    /// `1.` / `1)` markers.
    Ordered,
    /// `-` / `+` / `*` markers.
    #[default]
    Unordered,
}

/// Whether an ordered list item starts its list or continues one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderedListPreState {
    /// First item of its list.
    #[default]
    Start,
    /// Subsequent item.
    Continue,
}

/// Pseudo-item marking the start of one parsed file inside a (possibly
/// multi-file) [`Document`]. The label is the file's anchor path.
#[derive(Debug, Default, Clone)]
pub struct Anchor {
    /// Source position.
    pub pos: Pos,
    /// Anchor path of the file.
    pub label: String,
}

/// Pseudo-item separating two parsed files. The last file of a document is
/// not followed by one.
#[derive(Debug, Default, Clone)]
pub struct PageBreak {
    /// Source position.
    pub pos: Pos,
}

/// Thematic break (`***`, `---`, `___`).
#[derive(Debug, Default, Clone)]
pub struct HorizontalLine {
    /// Source position.
    pub pos: Pos,
}

/// Textual content.
#[derive(Debug, Default, Clone)]
pub struct Text {
    /// Source position.
    pub pos: Pos,
    /// Effective styles.
    pub opts: TextOpts,
    /// Emphasis runs opening on this item.
    pub open_styles: Styles,
    /// Emphasis runs closing on this item.
    pub close_styles: Styles,
    /// The text.
    pub text: String,
}

/// Hard line break (two trailing spaces or a trailing backslash).
#[derive(Debug, Default, Clone)]
pub struct LineBreak {
    /// Source position.
    pub pos: Pos,
    /// Effective styles.
    pub opts: TextOpts,
    /// Emphasis runs opening on this item.
    pub open_styles: Styles,
    /// Emphasis runs closing on this item.
    pub close_styles: Styles,
}

/// Raw HTML, either a block or an inline island.
#[derive(Debug, Default, Clone)]
pub struct RawHtml {
    /// Source position.
    pub pos: Pos,
    /// Effective styles.
    pub opts: TextOpts,
    /// Emphasis runs opening on this item.
    pub open_styles: Styles,
    /// Emphasis runs closing on this item.
    pub close_styles: Styles,
    /// The raw HTML substring.
    pub text: String,
}

/// Block of inline items; also used as heading text and link/image
/// descriptions.
#[derive(Debug, Default, Clone)]
pub struct Paragraph {
    /// Source position.
    pub pos: Pos,
    /// Inline children in source order.
    pub items: Vec<Item>,
}

impl Paragraph {
    /// Whether the paragraph has no children.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// ATX or setext heading.
#[derive(Debug, Default, Clone)]
pub struct Heading {
    /// Source position.
    pub pos: Pos,
    /// Level, 1–6.
    pub level: i64,
    /// Heading text.
    pub text: Option<NodeRef<Paragraph>>,
    /// Explicit `{#label}` id key, or the auto-generated slug key.
    pub label: Option<String>,
    /// `#` runs for ATX, the underline for setext.
    pub delims: Vec<Pos>,
    /// Position of the `{#label}` region, when present.
    pub label_pos: Pos,
    /// All keys this heading is registered under in
    /// [`Document::labeled_headings`].
    pub label_variants: Vec<String>,
}

impl Heading {
    /// Whether an explicit or generated label has been set.
    pub fn is_labeled(&self) -> bool {
        self.label.is_some()
    }
}

/// Blockquote.
#[derive(Debug, Default, Clone)]
pub struct Blockquote {
    /// Source position.
    pub pos: Pos,
    /// Block children.
    pub items: Vec<Item>,
    /// One position per `>` marker.
    pub delims: Vec<Pos>,
}

/// One item of a [`List`].
#[derive(Debug, Default, Clone)]
pub struct ListItem {
    /// Source position.
    pub pos: Pos,
    /// Block children.
    pub items: Vec<Item>,
    /// Ordered or unordered.
    pub list_type: ListType,
    /// Start/Continue for ordered items.
    pub ordered_pre_state: OrderedListPreState,
    /// Start number for ordered items.
    pub start_number: i64,
    /// Whether this is a GFM task-list item.
    pub is_task_list: bool,
    /// Checkbox state of a task-list item.
    pub is_checked: bool,
    /// The bullet or `N.`/`N)` marker.
    pub delim: Pos,
    /// The `[ ]` / `[x]` checkbox, when this is a task item.
    pub task_delim: Pos,
}

/// List; contains [`ListItem`]s only.
#[derive(Debug, Default, Clone)]
pub struct List {
    /// Source position.
    pub pos: Pos,
    /// The list items.
    pub items: Vec<Item>,
}

/// Code, fenced, indented or inline.
#[derive(Debug, Default, Clone)]
pub struct Code {
    /// Source position.
    pub pos: Pos,
    /// Effective styles (inline code only).
    pub opts: TextOpts,
    /// Emphasis runs opening on this item.
    pub open_styles: Styles,
    /// Emphasis runs closing on this item.
    pub close_styles: Styles,
    /// The code text.
    pub text: String,
    /// Inline code span?
    pub is_inline: bool,
    /// Fenced code block?
    pub is_fenced: bool,
    /// Info string of a fenced block.
    pub syntax: String,
    /// Position of the info string.
    pub syntax_pos: Pos,
    /// Opening fence / backtick run.
    pub start_delim: Pos,
    /// Closing fence / backtick run.
    pub end_delim: Pos,
}

impl Code {
    /// Code with the given text and flags.
    pub fn new(text: String, is_inline: bool, is_fenced: bool) -> Self {
        Code {
            text,
            is_inline,
            is_fenced,
            ..Code::default()
        }
    }
}

/// LaTeX math expression, inline (`$…$`) or display (`$$…$$` or a
/// ```` ```math ```` fence).
#[derive(Debug, Default, Clone)]
pub struct Math {
    /// Source position.
    pub pos: Pos,
    /// Effective styles.
    pub opts: TextOpts,
    /// Emphasis runs opening on this item.
    pub open_styles: Styles,
    /// Emphasis runs closing on this item.
    pub close_styles: Styles,
    /// The expression, verbatim.
    pub expr: String,
    /// `$…$` vs `$$…$$` / fenced.
    pub is_inline: bool,
    /// Whether this came from a ```` ```math ```` fence.
    pub is_fenced_code: bool,
    /// Position of the fence info string, when fenced.
    pub syntax_pos: Pos,
    /// Opening delimiter.
    pub start_delim: Pos,
    /// Closing delimiter.
    pub end_delim: Pos,
}

/// Link.
#[derive(Debug, Default, Clone)]
pub struct Link {
    /// Source position.
    pub pos: Pos,
    /// Effective styles.
    pub opts: TextOpts,
    /// Emphasis runs opening on this item.
    pub open_styles: Styles,
    /// Emphasis runs closing on this item.
    pub close_styles: Styles,
    /// Destination.
    pub url: String,
    /// Raw text of the description.
    pub text: String,
    /// Parsed description; its first image, if any, is also lifted to `img`.
    pub p: Option<NodeRef<Paragraph>>,
    /// Image found in the description.
    pub img: Option<NodeRef<Image>>,
    /// Position of the description.
    pub text_pos: Pos,
    /// Position of the destination.
    pub url_pos: Pos,
}

/// Image.
#[derive(Debug, Default, Clone)]
pub struct Image {
    /// Source position.
    pub pos: Pos,
    /// Effective styles.
    pub opts: TextOpts,
    /// Emphasis runs opening on this item.
    pub open_styles: Styles,
    /// Emphasis runs closing on this item.
    pub close_styles: Styles,
    /// Source URL.
    pub url: String,
    /// Raw alt text.
    pub text: String,
    /// Parsed description.
    pub p: Option<NodeRef<Paragraph>>,
    /// Position of the description.
    pub text_pos: Pos,
    /// Position of the URL.
    pub url_pos: Pos,
}

/// Reference to a footnote in [`Document::footnotes`].
#[derive(Debug, Default, Clone)]
pub struct FootnoteReference {
    /// Source position.
    pub pos: Pos,
    /// Effective styles.
    pub opts: TextOpts,
    /// Emphasis runs opening on this item.
    pub open_styles: Styles,
    /// Emphasis runs closing on this item.
    pub close_styles: Styles,
    /// Normalized footnote key.
    pub id: String,
    /// Position of the label.
    pub id_pos: Pos,
}

/// Footnote definition. Lives in [`Document::footnotes`], not in the flow.
#[derive(Debug, Default, Clone)]
pub struct Footnote {
    /// Source position.
    pub pos: Pos,
    /// Block children.
    pub items: Vec<Item>,
    /// Position of the `[^label]` id.
    pub id_pos: Pos,
}

/// One cell of a table row; a block of inlines.
#[derive(Debug, Default, Clone)]
pub struct TableCell {
    /// Source position.
    pub pos: Pos,
    /// Inline children.
    pub items: Vec<Item>,
}

/// One row of a table.
#[derive(Debug, Default, Clone)]
pub struct TableRow {
    /// Source position.
    pub pos: Pos,
    /// The cells, capped at the header column count.
    pub cells: Vec<NodeRef<TableCell>>,
}

/// GFM table. The first row is the header.
#[derive(Debug, Default, Clone)]
pub struct Table {
    /// Source position.
    pub pos: Pos,
    /// Header row followed by data rows.
    pub rows: Vec<NodeRef<TableRow>>,
    /// Per-column alignments.
    pub aligns: Vec<TableAlignment>,
}

impl Table {
    /// Number of columns, as fixed by the delimiter row.
    pub fn columns_count(&self) -> usize {
        self.aligns.len()
    }

    /// Alignment of the given column.
    pub fn column_alignment(&self, idx: usize) -> TableAlignment {
        self.aligns.get(idx).copied().unwrap_or_default()
    }
}

/// YAML front-matter block delimited by `---` / `...` at the very start of a
/// file.
#[derive(Debug, Default, Clone)]
pub struct YamlHeader {
    /// Source position.
    pub pos: Pos,
    /// The YAML body, without the delimiters.
    pub yaml: String,
    /// The opening `---` line.
    pub start_delim: Pos,
    /// The closing `---` / `...` line.
    pub end_delim: Pos,
}

/// The root of a parsed document (one or, when recursing, several files).
#[derive(Debug, Default)]
pub struct Document {
    /// Source position.
    pub pos: Pos,
    /// Top-level blocks, in source order.
    pub items: Vec<Item>,
    /// Footnote key → definition.
    pub footnotes: FxHashMap<String, NodeRef<Footnote>>,
    /// Normalized reference-link label → definition.
    pub labeled_links: FxHashMap<String, NodeRef<Link>>,
    /// Heading label/slug key → heading.
    pub labeled_headings: FxHashMap<String, NodeRef<Heading>>,
}

/// Any node that can appear in a block's child list.
#[derive(Debug, Clone)]
pub enum Item {
    /// See [`Anchor`].
    Anchor(NodeRef<Anchor>),
    /// See [`PageBreak`].
    PageBreak(NodeRef<PageBreak>),
    /// See [`HorizontalLine`].
    HorizontalLine(NodeRef<HorizontalLine>),
    /// See [`Text`].
    Text(NodeRef<Text>),
    /// See [`LineBreak`].
    LineBreak(NodeRef<LineBreak>),
    /// See [`RawHtml`].
    RawHtml(NodeRef<RawHtml>),
    /// See [`Paragraph`].
    Paragraph(NodeRef<Paragraph>),
    /// See [`Heading`].
    Heading(NodeRef<Heading>),
    /// See [`Blockquote`].
    Blockquote(NodeRef<Blockquote>),
    /// See [`List`].
    List(NodeRef<List>),
    /// See [`ListItem`].
    ListItem(NodeRef<ListItem>),
    /// See [`Code`].
    Code(NodeRef<Code>),
    /// See [`Math`].
    Math(NodeRef<Math>),
    /// See [`Link`].
    Link(NodeRef<Link>),
    /// See [`Image`].
    Image(NodeRef<Image>),
    /// See [`FootnoteReference`].
    FootnoteReference(NodeRef<FootnoteReference>),
    /// See [`Footnote`].
    Footnote(NodeRef<Footnote>),
    /// See [`Table`].
    Table(NodeRef<Table>),
    /// See [`YamlHeader`].
    YamlHeader(NodeRef<YamlHeader>),
}

macro_rules! for_each_item_variant {
    ($self:expr, $n:ident, $body:expr) => {
        match $self {
            Item::Anchor($n) => $body,
            Item::PageBreak($n) => $body,
            Item::HorizontalLine($n) => $body,
            Item::Text($n) => $body,
            Item::LineBreak($n) => $body,
            Item::RawHtml($n) => $body,
            Item::Paragraph($n) => $body,
            Item::Heading($n) => $body,
            Item::Blockquote($n) => $body,
            Item::List($n) => $body,
            Item::ListItem($n) => $body,
            Item::Code($n) => $body,
            Item::Math($n) => $body,
            Item::Link($n) => $body,
            Item::Image($n) => $body,
            Item::FootnoteReference($n) => $body,
            Item::Footnote($n) => $body,
            Item::Table($n) => $body,
            Item::YamlHeader($n) => $body,
        }
    };
}

macro_rules! with_opts_variants {
    ($self:expr, $n:ident, $body:expr, $fallback:expr) => {
        match $self {
            Item::Text($n) => $body,
            Item::LineBreak($n) => $body,
            Item::RawHtml($n) => $body,
            Item::Code($n) => $body,
            Item::Math($n) => $body,
            Item::Link($n) => $body,
            Item::Image($n) => $body,
            Item::FootnoteReference($n) => $body,
            _ => $fallback,
        }
    };
}

/// Uniform access to a node's source position.
pub trait HasPos {
    /// The node's position.
    fn node_pos(&self) -> Pos;
    /// Mutable access to the node's position.
    fn node_pos_mut(&mut self) -> &mut Pos;
}

macro_rules! pos_accessors {
    ($($t:ty),* $(,)?) => {
        $(impl HasPos for $t {
            fn node_pos(&self) -> Pos { self.pos }
            fn node_pos_mut(&mut self) -> &mut Pos { &mut self.pos }
        })*
    };
}

pos_accessors!(
    Anchor,
    PageBreak,
    HorizontalLine,
    Text,
    LineBreak,
    RawHtml,
    Paragraph,
    Heading,
    Blockquote,
    List,
    ListItem,
    Code,
    Math,
    Link,
    Image,
    FootnoteReference,
    Footnote,
    TableCell,
    TableRow,
    Table,
    YamlHeader,
    Document,
);

macro_rules! opts_accessors {
    ($($t:ty),* $(,)?) => {
        $(impl HasOpts for $t {
            fn item_opts(&self) -> TextOpts { self.opts }
            fn set_item_opts(&mut self, o: TextOpts) { self.opts = o; }
            fn styles_mut(&mut self) -> (&mut Styles, &mut Styles) {
                (&mut self.open_styles, &mut self.close_styles)
            }
        })*
    };
}

/// Uniform access to the style data of inline-styleable nodes.
pub trait HasOpts {
    /// Effective styles.
    fn item_opts(&self) -> TextOpts;
    /// Set the effective styles.
    fn set_item_opts(&mut self, o: TextOpts);
    /// `(open_styles, close_styles)`.
    fn styles_mut(&mut self) -> (&mut Styles, &mut Styles);
}

opts_accessors!(
    Text,
    LineBreak,
    RawHtml,
    Code,
    Math,
    Link,
    Image,
    FootnoteReference,
);

impl Item {
    /// The item's source position.
    pub fn pos(&self) -> Pos {
        for_each_item_variant!(self, n, n.borrow().node_pos())
    }

    /// Replace the item's source position.
    pub fn set_pos(&self, p: Pos) {
        for_each_item_variant!(self, n, *n.borrow_mut().node_pos_mut() = p)
    }

    /// Update the end of the item's position.
    pub fn set_end(&self, end_col: i64, end_line: i64) {
        for_each_item_variant!(self, n, {
            let mut b = n.borrow_mut();
            let pos = b.node_pos_mut();
            pos.end_col = end_col;
            pos.end_line = end_line;
        })
    }

    /// The item's visible extent, counting code/math delimiters as part of
    /// the item. Used when interleaving text runs with parsed inlines.
    pub fn inline_pos(&self) -> Pos {
        match self {
            Item::Code(c) => {
                let c = c.borrow();
                Pos::new(
                    c.start_delim.start_col,
                    c.start_delim.start_line,
                    c.end_delim.end_col,
                    c.end_delim.start_line,
                )
            }
            Item::Math(m) => {
                let m = m.borrow();
                Pos::new(
                    m.start_delim.start_col,
                    m.start_delim.start_line,
                    m.end_delim.end_col,
                    m.end_delim.start_line,
                )
            }
            _ => self.pos(),
        }
    }

    /// Set the effective styles of an inline item; no-op on blocks.
    pub fn set_opts(&self, o: TextOpts) {
        with_opts_variants!(self, n, n.borrow_mut().set_item_opts(o), ())
    }

    /// The effective styles of an inline item.
    pub fn opts(&self) -> TextOpts {
        with_opts_variants!(self, n, n.borrow().item_opts(), TextOpts::NONE)
    }

    /// Append to the item's opening emphasis runs.
    pub fn push_open_styles(&self, styles: &[StyleDelim]) {
        with_opts_variants!(
            self,
            n,
            n.borrow_mut().styles_mut().0.extend_from_slice(styles),
            ()
        )
    }

    /// Append to the item's closing emphasis runs.
    pub fn push_close_styles(&self, styles: &[StyleDelim]) {
        with_opts_variants!(
            self,
            n,
            n.borrow_mut().styles_mut().1.extend_from_slice(styles),
            ()
        )
    }

    /// Replace the item's opening emphasis runs.
    pub fn set_open_styles(&self, styles: Styles) {
        with_opts_variants!(self, n, *n.borrow_mut().styles_mut().0 = styles, ())
    }

    /// The item's opening emphasis runs.
    pub fn open_styles(&self) -> Styles {
        with_opts_variants!(self, n, n.borrow().open_styles.clone(), Styles::new())
    }
}

/// Shared handle to any node that owns a child list.
#[derive(Debug, Clone)]
pub enum BlockRef {
    /// Root document.
    Document(NodeRef<Document>),
    /// Paragraph.
    Paragraph(NodeRef<Paragraph>),
    /// Blockquote.
    Blockquote(NodeRef<Blockquote>),
    /// List.
    List(NodeRef<List>),
    /// List item.
    ListItem(NodeRef<ListItem>),
    /// Table cell.
    TableCell(NodeRef<TableCell>),
    /// Footnote definition.
    Footnote(NodeRef<Footnote>),
}

macro_rules! for_each_block_variant {
    ($self:expr, $n:ident, $body:expr) => {
        match $self {
            BlockRef::Document($n) => $body,
            BlockRef::Paragraph($n) => $body,
            BlockRef::Blockquote($n) => $body,
            BlockRef::List($n) => $body,
            BlockRef::ListItem($n) => $body,
            BlockRef::TableCell($n) => $body,
            BlockRef::Footnote($n) => $body,
        }
    };
}

impl BlockRef {
    /// Append a child item.
    pub fn append_item(&self, item: Item) {
        for_each_block_variant!(self, n, n.borrow_mut().items.push(item))
    }

    /// Whether the block has no children.
    pub fn is_empty(&self) -> bool {
        for_each_block_variant!(self, n, n.borrow().items.is_empty())
    }

    /// The last child, if any.
    pub fn last_item(&self) -> Option<Item> {
        for_each_block_variant!(self, n, n.borrow().items.last().cloned())
    }

    /// Remove and return the last child.
    pub fn pop_last(&self) -> Option<Item> {
        for_each_block_variant!(self, n, n.borrow_mut().items.pop())
    }

    /// Snapshot of the child list.
    pub fn items(&self) -> Vec<Item> {
        for_each_block_variant!(self, n, n.borrow().items.clone())
    }
}

fn clone_paragraph_opt(
    p: &Option<NodeRef<Paragraph>>,
    headings: &mut Vec<NodeRef<Heading>>,
) -> Option<NodeRef<Paragraph>> {
    p.as_ref().map(|p| clone_paragraph(&p.borrow(), headings))
}

fn clone_paragraph(p: &Paragraph, headings: &mut Vec<NodeRef<Heading>>) -> NodeRef<Paragraph> {
    node(Paragraph {
        pos: p.pos,
        items: p.items.iter().map(|i| clone_item(i, headings)).collect(),
    })
}

fn clone_footnote(f: &Footnote, headings: &mut Vec<NodeRef<Heading>>) -> NodeRef<Footnote> {
    node(Footnote {
        pos: f.pos,
        items: f.items.iter().map(|i| clone_item(i, headings)).collect(),
        id_pos: f.id_pos,
    })
}

fn clone_link(l: &Link, headings: &mut Vec<NodeRef<Heading>>) -> NodeRef<Link> {
    node(Link {
        p: clone_paragraph_opt(&l.p, headings),
        img: l
            .img
            .as_ref()
            .map(|i| node(i.borrow().clone_with_description(headings))),
        ..l.clone()
    })
}

impl Image {
    fn clone_with_description(&self, headings: &mut Vec<NodeRef<Heading>>) -> Image {
        Image {
            p: clone_paragraph_opt(&self.p, headings),
            ..self.clone()
        }
    }
}

fn clone_item(item: &Item, headings: &mut Vec<NodeRef<Heading>>) -> Item {
    match item {
        Item::Anchor(n) => Item::Anchor(node(n.borrow().clone())),
        Item::PageBreak(n) => Item::PageBreak(node(n.borrow().clone())),
        Item::HorizontalLine(n) => Item::HorizontalLine(node(n.borrow().clone())),
        Item::Text(n) => Item::Text(node(n.borrow().clone())),
        Item::LineBreak(n) => Item::LineBreak(node(n.borrow().clone())),
        Item::RawHtml(n) => Item::RawHtml(node(n.borrow().clone())),
        Item::Code(n) => Item::Code(node(n.borrow().clone())),
        Item::Math(n) => Item::Math(node(n.borrow().clone())),
        Item::FootnoteReference(n) => Item::FootnoteReference(node(n.borrow().clone())),
        Item::YamlHeader(n) => Item::YamlHeader(node(n.borrow().clone())),
        Item::Paragraph(n) => Item::Paragraph(clone_paragraph(&n.borrow(), headings)),
        Item::Heading(n) => {
            let h = n.borrow();
            let cloned = node(Heading {
                pos: h.pos,
                level: h.level,
                text: clone_paragraph_opt(&h.text, headings),
                label: h.label.clone(),
                delims: h.delims.clone(),
                label_pos: h.label_pos,
                label_variants: h.label_variants.clone(),
            });
            headings.push(Rc::clone(&cloned));
            Item::Heading(cloned)
        }
        Item::Blockquote(n) => {
            let b = n.borrow();
            Item::Blockquote(node(Blockquote {
                pos: b.pos,
                items: b.items.iter().map(|i| clone_item(i, headings)).collect(),
                delims: b.delims.clone(),
            }))
        }
        Item::List(n) => {
            let l = n.borrow();
            Item::List(node(List {
                pos: l.pos,
                items: l.items.iter().map(|i| clone_item(i, headings)).collect(),
            }))
        }
        Item::ListItem(n) => {
            let l = n.borrow();
            Item::ListItem(node(ListItem {
                items: l.items.iter().map(|i| clone_item(i, headings)).collect(),
                ..l.clone()
            }))
        }
        Item::Link(n) => Item::Link(clone_link(&n.borrow(), headings)),
        Item::Image(n) => Item::Image(node(n.borrow().clone_with_description(headings))),
        Item::Footnote(n) => Item::Footnote(clone_footnote(&n.borrow(), headings)),
        Item::Table(n) => {
            let t = n.borrow();
            Item::Table(node(Table {
                pos: t.pos,
                aligns: t.aligns.clone(),
                rows: t
                    .rows
                    .iter()
                    .map(|r| {
                        let r = r.borrow();
                        node(TableRow {
                            pos: r.pos,
                            cells: r
                                .cells
                                .iter()
                                .map(|c| {
                                    let c = c.borrow();
                                    node(TableCell {
                                        pos: c.pos,
                                        items: c
                                            .items
                                            .iter()
                                            .map(|i| clone_item(i, headings))
                                            .collect(),
                                    })
                                })
                                .collect(),
                        })
                    })
                    .collect(),
            }))
        }
    }
}

impl Document {
    /// Deep copy of the whole tree. Cloned headings are re-registered under
    /// their label variants, and the footnote and reference-link maps are
    /// deep-copied, so the clone's cross-reference maps are self-contained.
    pub fn deep_clone(&self) -> NodeRef<Document> {
        let mut headings = Vec::new();

        let items: Vec<Item> = self
            .items
            .iter()
            .map(|i| clone_item(i, &mut headings))
            .collect();

        let mut labeled_headings = FxHashMap::default();
        for h in headings {
            for label in h.borrow().label_variants.clone() {
                labeled_headings.insert(label, Rc::clone(&h));
            }
        }

        let footnotes = self
            .footnotes
            .iter()
            .map(|(k, v)| (k.clone(), clone_footnote(&v.borrow(), &mut Vec::new())))
            .collect();

        let labeled_links = self
            .labeled_links
            .iter()
            .map(|(k, v)| (k.clone(), clone_link(&v.borrow(), &mut Vec::new())))
            .collect();

        node(Document {
            pos: self.pos,
            items,
            footnotes,
            labeled_links,
            labeled_headings,
        })
    }
}
