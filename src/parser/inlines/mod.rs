//! Inline parsers, their dispatch machinery, and the assembly of text
//! objects out of parsed inlines and resolved emphasis delimiters.

mod autolink;
mod code;
mod emphasis;
mod gfm_autolink;
mod hard_break;
mod html;
mod link;
mod math;

pub use autolink::AutolinkParser;
pub use code::InlineCodeParser;
pub use emphasis::{process_emphasises, EmphasisKind, EmphasisParser};
pub use gfm_autolink::GfmAutolinkParser;
pub use hard_break::HardLineBreakParser;
pub use html::InlineHtmlParser;
pub use link::LinkImageParser;
pub use math::InlineMathParser;

use std::rc::Rc;

use crate::line::Line;
use crate::nodes::{node, BlockRef, Item, Pos, StyleDelim, Text, TextOpts};
use crate::parser::ParseEnv;
use crate::stream::ParagraphStream;
use crate::strings::{
    is_space, remove_backslashes, replace_entities, skip_chars_if, skip_chars_if_backward,
    ReverseSolidus,
};

/// Shared handle to an inline parser in a pipeline.
pub type InlineParserRef = Rc<dyn InlineParser>;

/// Identity tag of an inline parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineKind {
    /// Inline code span.
    Code,
    /// Link or image.
    LinkImage,
    /// `<…>` autolink.
    Autolink,
    /// Inline HTML.
    Html,
    /// Inline math.
    Math,
    /// `*` emphasis.
    AsteriskEmphasis,
    /// `_` emphasis.
    UnderlineEmphasis,
    /// `~` strikethrough.
    StrikethroughEmphasis,
    /// GFM bare autolink.
    GfmAutolink,
    /// Hard line break.
    HardLineBreak,
}

/// One emphasis delimiter candidate collected during tokenization.
#[derive(Debug, Clone, Copy)]
pub struct Delimiter {
    /// Character position on its line.
    pub pos: i64,
    /// Line number.
    pub line: i64,
    /// CommonMark left-flanking.
    pub left_flanking: bool,
    /// CommonMark right-flanking.
    pub right_flanking: bool,
    /// The emphasis parser that produced this delimiter.
    pub kind: EmphasisKind,
}

/// Accumulator for one inline run: parsed inline items, pending emphasis
/// delimiters, and — after resolution — the opening and closing styles.
#[derive(Default)]
pub struct InlineCtx {
    /// Emphasis delimiter candidates, in source order.
    pub delims: Vec<Delimiter>,
    /// Parsed inline items, in source order.
    pub inlines: Vec<Item>,
    /// Resolved opening emphasis runs.
    pub open_styles: Vec<StyleDelim>,
    /// Resolved closing emphasis runs.
    pub close_styles: Vec<StyleDelim>,
}

/// One inline construct's parsing rules.
pub trait InlineParser {
    /// This parser's identity tag.
    fn kind(&self) -> InlineKind;

    /// Try to parse an inline starting at the current character. On
    /// success the parser advances `line` (and possibly `stream`) past the
    /// construct and records items/delimiters in `ictx`; on failure all
    /// state is restored and `false` returned.
    fn check(
        &self,
        line: &mut Line,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        env: &ParseEnv,
        rs: &ReverseSolidus,
    ) -> bool;

    /// Snapshot parser state before a nested inline run (e.g. a link
    /// description).
    fn push_state(&self) {}

    /// Restore parser state after a nested inline run.
    fn pop_state(&self) {}

    /// All characters that can start this kind of inline.
    fn start_delimiter_symbols(&self) -> &'static str;
}

/// Run the inline pipeline over every position of every line in the
/// stream, starting at the stream's current line.
///
/// `skip` excludes a column region (the ATX `{#label}` suffix) from
/// dispatch; `skip_gfm_autolink` is set while parsing link descriptions.
pub fn tokenize(
    stream: &mut ParagraphStream,
    ictx: &mut InlineCtx,
    env: &ParseEnv,
    skip: Pos,
    skip_gfm_autolink: bool,
) {
    let mut line = stream.read_line();

    loop {
        let mut rs = ReverseSolidus::new();

        while line.position() < line.length() {
            let mut processed = false;

            rs.process(line.current_char());

            if !(line.position() >= skip.start_col && line.position() <= skip.end_col) {
                let parsers = env.parser.inline_parsers_for(line.current_char());

                for p in parsers {
                    if skip_gfm_autolink && p.kind() == InlineKind::GfmAutolink {
                        continue;
                    }

                    if p.check(&mut line, stream, ictx, env, &rs) {
                        processed = true;
                        break;
                    }
                }
            }

            if !processed {
                rs.next();
                line.next_char();
            } else {
                rs.clear();
            }
        }

        if !stream.at_end() {
            line = stream.read_line();
        } else {
            break;
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum StylesSide {
    Open,
    Close,
}

/// The next thing to place into the paragraph: an emphasis delimiter, a
/// skipped region, or a parsed inline item.
struct ToPlace {
    style_delim: StyleDelim,
    side: Option<StylesSide>,
    item: Option<Item>,
}

impl Default for ToPlace {
    fn default() -> Self {
        ToPlace {
            style_delim: StyleDelim {
                style: TextOpts::NONE,
                pos: Pos::null(),
            },
            side: None,
            item: None,
        }
    }
}

impl ToPlace {
    fn item_pos(&self) -> Pos {
        self.item.as_ref().map(|i| i.inline_pos()).unwrap_or_default()
    }

    fn start_col(&self) -> i64 {
        if self.style_delim.pos.is_null() {
            self.item_pos().start_col
        } else {
            self.style_delim.pos.start_col
        }
    }

    fn start_line(&self) -> i64 {
        if self.style_delim.pos.is_null() {
            self.item_pos().start_line
        } else {
            self.style_delim.pos.start_line
        }
    }

    fn end_col(&self) -> i64 {
        if self.style_delim.pos.is_null() {
            self.item_pos().end_col
        } else {
            self.style_delim.pos.end_col
        }
    }

    fn end_line(&self) -> i64 {
        if self.style_delim.pos.is_null() {
            self.item_pos().end_line
        } else {
            self.style_delim.pos.end_line
        }
    }

    fn is_null(&self) -> bool {
        self.style_delim.pos.is_null() && self.item_pos().start_line == -1
    }
}

fn delim_starts_before(pos: &Pos, start_line: i64, start_col: i64) -> bool {
    pos.start_line < start_line || (pos.start_line == start_line && pos.start_col < start_col)
}

/// Pop the earliest of: the next open style, the next close style, the
/// to-skip region, the next parsed inline.
fn first_to_place(ictx: &mut InlineCtx, to_skip: &Pos) -> ToPlace {
    let mut res = ToPlace::default();

    if let Some(first) = ictx.open_styles.first() {
        res.style_delim = *first;
        res.side = Some(StylesSide::Open);
    }

    if let Some(first) = ictx.close_styles.first() {
        if crate::nodes::style_delim_before(first, &res.style_delim) {
            res.style_delim = *first;
            res.side = Some(StylesSide::Close);
        }
    }

    if (!to_skip.is_null() && delim_starts_before(to_skip, res.start_line(), res.start_col()))
        || res.is_null()
    {
        res.style_delim.pos = *to_skip;
        res.side = None;
    }

    if !ictx.inlines.is_empty() {
        let front = ictx.inlines[0].inline_pos();
        if delim_starts_before(&front, res.start_line(), res.start_col()) || res.start_line() == -1
        {
            res.style_delim = StyleDelim {
                style: TextOpts::NONE,
                pos: Pos::null(),
            };
            res.side = None;
            res.item = Some(ictx.inlines.remove(0));
        }
    }

    match res.side {
        Some(StylesSide::Open) => {
            ictx.open_styles.remove(0);
        }
        Some(StylesSide::Close) => {
            ictx.close_styles.remove(0);
        }
        None => {}
    }

    res
}

fn move_after_pos(line: &mut Line, stream: &mut ParagraphStream, place: &ToPlace) {
    while line.line_number() < place.end_line() {
        *line = stream.read_line();
    }

    while line.position() <= place.end_col() {
        if line.at_end() {
            break;
        }
        line.next_char();
    }
}

fn apply_styles(opts: &mut TextOpts, styles: &[StyleDelim]) {
    for s in styles {
        *opts |= s.style;
    }
}

fn clear_styles(opts: &mut TextOpts, opened: &mut Vec<StyleDelim>) {
    *opts = TextOpts::NONE;
    opened.pop();
    apply_styles(opts, opened);
}

/// Interleave literal text runs with the parsed inlines and attach the
/// resolved emphasis delimiters to the right items, in source order.
pub fn make_text_objects(
    ictx: &mut InlineCtx,
    stream: &mut ParagraphStream,
    p: &BlockRef,
    to_skip: &Pos,
) {
    stream.save_state();

    let mut open: Vec<StyleDelim> = Vec::new();
    let mut close: Vec<StyleDelim> = Vec::new();
    let mut opened: Vec<StyleDelim> = Vec::new();

    let mut opts = TextOpts::NONE;

    let mut item: Option<Item> = None;
    let mut text = node(Text::default());

    let mut to_place = first_to_place(ictx, to_skip);

    while !stream.at_end() {
        let mut line = stream.read_line();
        let start_pos = line.position();

        while line.position() < line.length() {
            if !close.is_empty() && !p.is_empty() {
                if let Some(last) = p.last_item() {
                    last.push_close_styles(&close);
                }
                clear_styles(&mut opts, &mut opened);
                close.clear();
            }

            text.borrow_mut().opts = opts;

            if let Some(it) = &to_place.item {
                it.set_opts(opts);
            }

            if to_place.start_line() == line.line_number() {
                if line.position() < to_place.start_col() {
                    {
                        let mut t = text.borrow_mut();
                        t.pos = Pos::new(
                            line.position(),
                            line.line_number(),
                            to_place.start_col() - 1,
                            line.line_number(),
                        );
                    }

                    let mut tmp =
                        line.sliced_copy(line.position(), to_place.start_col() - line.position());

                    if line.position() == start_pos {
                        let chars: Vec<char> = tmp.chars().collect();
                        let c = skip_chars_if(0, &chars, is_space);
                        tmp = chars[c..].iter().collect();
                    }

                    replace_entities(&mut tmp);
                    remove_backslashes(&mut tmp);

                    text.borrow_mut().text = tmp.clone();

                    place_emph(&mut to_place, &mut open, &mut close, &mut opened, &mut opts);

                    if !close.is_empty() {
                        text.borrow_mut().close_styles.extend_from_slice(&close);
                        clear_styles(&mut opts, &mut opened);
                        close.clear();
                    }

                    if !tmp.is_empty() {
                        p.append_item(Item::Text(Rc::clone(&text)));
                    }

                    item = None;
                    text = node(Text::default());
                }

                place_emph(&mut to_place, &mut open, &mut close, &mut opened, &mut opts);

                if !open.is_empty() {
                    if let Some(it) = &to_place.item {
                        it.push_open_styles(&open);
                    } else {
                        text.borrow_mut().open_styles.extend_from_slice(&open);
                    }

                    open.clear();
                }

                if !close.is_empty() {
                    if let Some(it) = &item {
                        it.push_close_styles(&close);
                        clear_styles(&mut opts, &mut opened);
                        close.clear();
                    }
                }

                move_after_pos(&mut line, stream, &to_place);

                if let Some(it) = to_place.item.take() {
                    let text_open = text.borrow().open_styles.clone();
                    it.set_open_styles(text_open);
                    text.borrow_mut().open_styles.clear();
                    p.append_item(it.clone());
                    item = Some(it);
                }

                if line.line_number() > to_skip.start_line
                    || (line.line_number() == to_skip.start_line
                        && line.position() > to_skip.end_col)
                {
                    to_place = first_to_place(ictx, &Pos::null());
                } else {
                    to_place = first_to_place(ictx, to_skip);
                }
            } else {
                {
                    let mut t = text.borrow_mut();
                    t.pos = Pos::new(
                        line.position(),
                        line.line_number(),
                        line.length() - 1,
                        line.line_number(),
                    );
                }

                let mut tmp = line.sliced_copy_to_end(line.position());

                {
                    let mut chars: Vec<char> = tmp.chars().collect();

                    if line.position() == start_pos {
                        let s = skip_chars_if(0, &chars, is_space);
                        chars.drain(..s);
                    }

                    let e = skip_chars_if_backward(chars.len() as i64 - 1, &chars, is_space);
                    chars.truncate((e + 1) as usize);

                    tmp = chars.into_iter().collect();
                }

                replace_entities(&mut tmp);
                remove_backslashes(&mut tmp);

                text.borrow_mut().text = tmp.clone();

                line.skip();

                if !tmp.is_empty() {
                    p.append_item(Item::Text(Rc::clone(&text)));
                }

                item = None;
                text = node(Text::default());
            }
        }
    }

    if !close.is_empty() && !p.is_empty() {
        if let Some(last) = p.last_item() {
            last.push_close_styles(&close);
        }
    }

    stream.restore_saved_state();
}

fn place_emph(
    to_place: &mut ToPlace,
    open: &mut Vec<StyleDelim>,
    close: &mut Vec<StyleDelim>,
    opened: &mut Vec<StyleDelim>,
    opts: &mut TextOpts,
) {
    match to_place.side {
        Some(StylesSide::Open) => {
            open.push(to_place.style_delim);
            opened.push(to_place.style_delim);
            apply_styles(opts, open);
        }
        Some(StylesSide::Close) => {
            close.push(to_place.style_delim);
        }
        None => {}
    }

    to_place.side = None;
}
