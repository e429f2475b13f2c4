//! The parsing engine: options, the block/inline parser pipelines, the
//! two-pass driver, and recursive multi-file parsing.

pub mod blocks;
pub mod inlines;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, Anchor, BlockRef, Document, Item, NodeRef, PageBreak};
use crate::stream::TextStream;
use crate::strings::{anchor_path, is_empty_line};

use self::blocks::{
    AtxHeadingParser, BlockKind, BlockParserRef, BlockquoteParser, FencedCodeParser,
    FootnoteParser, HtmlParser, IndentedCodeParser, ListParser, ParagraphParser,
    SetextHeadingParser, TableParser, ThematicBreakParser, YamlParser,
};
use self::inlines::{
    AutolinkParser, EmphasisKind, EmphasisParser, GfmAutolinkParser, HardLineBreakParser,
    InlineCodeParser, InlineHtmlParser, InlineMathParser, InlineParserRef, LinkImageParser,
};

#[cfg(feature = "bon")]
use bon::Builder;

/// Which parser pipelines to register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelinePreset {
    /// All parsers: CommonMark plus GFM tables, footnotes, YAML front
    /// matter, math, strikethrough and bare autolinks.
    #[default]
    Default,
    /// Strict CommonMark: no YAML, footnotes, tables, math,
    /// strikethrough or bare autolinks.
    CommonMark,
}

/// Parse-time options.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
pub struct ParseOptions {
    /// Follow relative links to other Markdown files and append them to
    /// the document, separated by page breaks.
    #[cfg_attr(feature = "bon", builder(default))]
    pub recursive: bool,

    /// File extensions considered Markdown when recursing.
    #[cfg_attr(
        feature = "bon",
        builder(default = vec!["md".to_string(), "markdown".to_string()])
    )]
    pub allowed_extensions: Vec<String>,

    /// Which parser pipelines to register.
    #[cfg_attr(feature = "bon", builder(default))]
    pub pipeline: PipelinePreset,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            recursive: false,
            allowed_extensions: vec!["md".to_string(), "markdown".to_string()],
            pipeline: PipelinePreset::Default,
        }
    }
}

/// Render-time options for the HTML visitor.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "bon", derive(Builder))]
pub struct RenderOptions {
    /// Wrap the rendered document in an `<article>` tag.
    #[cfg_attr(feature = "bon", builder(default = true))]
    pub wrapped_in_article: bool,

    /// Content of the back link from a footnote to its reference.
    #[cfg_attr(feature = "bon", builder(default))]
    pub footnote_back_link_content: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            wrapped_in_article: true,
            footnote_back_link_content: String::new(),
        }
    }
}

/// Umbrella options struct.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Configure parse-time options.
    pub parse: ParseOptions,

    /// Configure render-time options.
    pub render: RenderOptions,
}

/// Per-file parsing environment handed to every parser.
pub struct ParseEnv<'p> {
    /// The parser with its registered pipelines.
    pub parser: &'p Parser,
    /// The document being built.
    pub doc: NodeRef<Document>,
    /// Directory of the current file, empty when parsing from memory.
    pub path: String,
    /// Name of the current file.
    pub file_name: String,
    /// Links discovered in this file, queued for recursive parsing.
    pub links_to_parse: RefCell<Vec<String>>,
}

#[derive(Default)]
struct ParseState {
    state: Option<BlockState>,
    ctx: Option<CtxId>,
    skip: Vec<BlockKind>,
}

impl ParseState {
    fn is_discard(&self) -> bool {
        self.state == Some(BlockState::Discard)
    }
}

/// The Markdown parser.
///
/// A parser owns its block and inline pipelines; distinct instances are
/// fully independent, but a single instance is not meant for concurrent
/// use.
pub struct Parser {
    options: Options,
    block_parsers: Vec<BlockParserRef>,
    inline_parsers: Vec<InlineParserRef>,
    inline_map: FxHashMap<char, Vec<InlineParserRef>>,
    parsed_files: RefCell<Vec<String>>,
}

impl Default for Parser {
    fn default() -> Self {
        Parser::new(Options::default())
    }
}

impl Parser {
    /// Parser with pipelines registered per the options' preset.
    pub fn new(options: Options) -> Self {
        let (block_parsers, inline_parsers) = match options.parse.pipeline {
            PipelinePreset::Default => (
                Self::default_block_pipeline(),
                Self::default_inline_pipeline(),
            ),
            PipelinePreset::CommonMark => (
                Self::commonmark_block_pipeline(),
                Self::commonmark_inline_pipeline(),
            ),
        };

        let mut parser = Parser {
            options,
            block_parsers,
            inline_parsers: Vec::new(),
            inline_map: FxHashMap::default(),
            parsed_files: RefCell::new(Vec::new()),
        };

        parser.set_inline_parsers(inline_parsers);

        parser
    }

    /// The full block pipeline, in probing order.
    pub fn default_block_pipeline() -> Vec<BlockParserRef> {
        vec![
            Rc::new(YamlParser::new()),
            Rc::new(BlockquoteParser::new()),
            Rc::new(SetextHeadingParser::new()),
            Rc::new(ThematicBreakParser::new()),
            Rc::new(ListParser::new()),
            Rc::new(AtxHeadingParser::new()),
            Rc::new(FencedCodeParser::new()),
            Rc::new(HtmlParser::new()),
            Rc::new(IndentedCodeParser::new()),
            Rc::new(FootnoteParser::new()),
            Rc::new(TableParser::new()),
            Rc::new(ParagraphParser::new()),
        ]
    }

    /// The strict CommonMark block pipeline.
    pub fn commonmark_block_pipeline() -> Vec<BlockParserRef> {
        vec![
            Rc::new(BlockquoteParser::new()),
            Rc::new(SetextHeadingParser::new()),
            Rc::new(ThematicBreakParser::new()),
            Rc::new(ListParser::new()),
            Rc::new(AtxHeadingParser::new()),
            Rc::new(FencedCodeParser::new()),
            Rc::new(HtmlParser::new()),
            Rc::new(IndentedCodeParser::new()),
            Rc::new(ParagraphParser::new()),
        ]
    }

    /// The full inline pipeline, in priority order.
    pub fn default_inline_pipeline() -> Vec<InlineParserRef> {
        let link_parser = Rc::new(LinkImageParser::new());

        vec![
            Rc::new(InlineCodeParser::new()),
            Rc::clone(&link_parser) as InlineParserRef,
            Rc::new(AutolinkParser::new()),
            Rc::new(InlineHtmlParser::new()),
            Rc::new(InlineMathParser::new()),
            Rc::new(EmphasisParser::new(EmphasisKind::Asterisk)),
            Rc::new(EmphasisParser::new(EmphasisKind::Underline)),
            Rc::new(EmphasisParser::new(EmphasisKind::Strikethrough)),
            Rc::new(GfmAutolinkParser::new(link_parser)),
            Rc::new(HardLineBreakParser::new()),
        ]
    }

    /// The strict CommonMark inline pipeline.
    pub fn commonmark_inline_pipeline() -> Vec<InlineParserRef> {
        vec![
            Rc::new(InlineCodeParser::new()),
            Rc::new(LinkImageParser::new()),
            Rc::new(AutolinkParser::new()),
            Rc::new(InlineHtmlParser::new()),
            Rc::new(EmphasisParser::new(EmphasisKind::Asterisk)),
            Rc::new(EmphasisParser::new(EmphasisKind::Underline)),
            Rc::new(HardLineBreakParser::new()),
        ]
    }

    /// Replace the block pipeline; order is probing order.
    pub fn set_block_parsers(&mut self, parsers: Vec<BlockParserRef>) {
        self.block_parsers = parsers;
    }

    /// Replace the inline pipeline and rebuild the first-character
    /// dispatch map.
    pub fn set_inline_parsers(&mut self, parsers: Vec<InlineParserRef>) {
        self.inline_map.clear();

        for p in &parsers {
            for ch in p.start_delimiter_symbols().chars() {
                self.inline_map.entry(ch).or_default().push(Rc::clone(p));
            }
        }

        self.inline_parsers = parsers;
    }

    /// The options this parser was built with.
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Inline parsers whose constructs can start with the given character,
    /// in registration order.
    pub fn inline_parsers_for(&self, c: char) -> Vec<InlineParserRef> {
        self.inline_map.get(&c).cloned().unwrap_or_default()
    }

    /// Snapshot all inline parsers' state before a nested inline run.
    pub fn push_state_of_inliners(&self) {
        for p in &self.inline_parsers {
            p.push_state();
        }
    }

    /// Restore all inline parsers' state after a nested inline run.
    pub fn pop_state_of_inliners(&self) {
        for p in &self.inline_parsers {
            p.pop_state();
        }
    }

    /// Dry-probe the block pipeline; the first parser claiming the line.
    pub fn check_block(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) -> Option<BlockParserRef> {
        if line.position() < line.length() {
            for p in &self.block_parsers {
                if p.check(line, stream, tree, ctx, env, true) != BlockState::None {
                    return Some(Rc::clone(p));
                }
            }
        }

        None
    }

    /// Like [`Parser::check_block`], skipping the parser with the given
    /// identity.
    pub fn check_block_excluding(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
        exclude: BlockKind,
    ) -> Option<BlockParserRef> {
        if line.position() < line.length() {
            for p in &self.block_parsers {
                if p.kind() == exclude {
                    continue;
                }

                if p.check(line, stream, tree, ctx, env, true) != BlockState::None {
                    return Some(Rc::clone(p));
                }
            }
        }

        None
    }

    /// Parse in-memory text. `path` and `file_name` are used to resolve
    /// relative links and to build anchors and label keys.
    pub fn parse(&self, text: &str, path: &str, file_name: &str) -> NodeRef<Document> {
        let doc = node(Document::default());

        self.parse_stream_into(text, path, file_name, false, &doc, None);

        self.reset();

        doc
    }

    /// Parse a file, following links into other Markdown files when the
    /// options ask for it. A missing or unreadable file yields an empty
    /// document.
    pub fn parse_file(&self, file_name: &str) -> NodeRef<Document> {
        let doc = node(Document::default());

        self.parse_file_into(file_name, self.options.parse.recursive, &doc, None);

        self.reset();

        doc
    }

    fn parse_file_into(
        &self,
        file_name: &str,
        recursive: bool,
        doc: &NodeRef<Document>,
        parent_links: Option<&mut Vec<String>>,
    ) {
        let p = Path::new(file_name);

        let suffix = p
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if !p.exists() || !self.options.parse.allowed_extensions.contains(&suffix) {
            return;
        }

        {
            let d = doc.borrow();
            let needs_break = !d.items.is_empty()
                && !matches!(d.items.last(), Some(Item::PageBreak(_)));

            drop(d);

            if needs_break {
                doc.borrow_mut()
                    .items
                    .push(Item::PageBreak(node(PageBreak::default())));
            }
        }

        let text = match std::fs::read_to_string(p) {
            Ok(t) => t,
            Err(_) => return,
        };

        let abs = std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        let wd = abs
            .parent()
            .map(|d| d.to_string_lossy().into_owned())
            .unwrap_or_default();
        let fname = abs
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());

        self.parse_stream_into(&text, &wd, &fname, recursive, doc, parent_links);
    }

    fn parse_stream_into(
        &self,
        text: &str,
        path: &str,
        file_name: &str,
        recursive: bool,
        doc: &NodeRef<Document>,
        parent_links: Option<&mut Vec<String>>,
    ) {
        let mut links: Vec<String> = Vec::new();

        let anchor = anchor_path(path, file_name);

        doc.borrow_mut().items.push(Item::Anchor(node(Anchor {
            label: anchor.clone(),
            ..Anchor::default()
        })));

        self.parse_text(text, doc, path, file_name, &mut links);

        self.parsed_files.borrow_mut().push(anchor);

        resolve_links(&mut links, doc);

        if recursive && !links.is_empty() {
            let tmp = links.clone();

            while !links.is_empty() {
                let next = links.remove(0);

                if let Some(pl) = &parent_links {
                    if pl.contains(&next) {
                        continue;
                    }
                }

                if next.starts_with('#') {
                    continue;
                }

                if !self.parsed_files.borrow().contains(&next) {
                    self.parse_file_into(&next, recursive, doc, Some(&mut links));
                }
            }

            if let Some(pl) = parent_links {
                pl.extend(tmp);
            }
        }
    }

    /// The two passes over one file: build the context tree, then drain
    /// it through `process`.
    fn parse_text(
        &self,
        text: &str,
        doc: &NodeRef<Document>,
        path: &str,
        file_name: &str,
        links: &mut Vec<String>,
    ) {
        let mut stream = TextStream::new(text);
        let mut tree = ContextTree::new();

        let root = tree.alloc(None);
        tree.enqueue_new_child(root);

        let env = ParseEnv {
            parser: self,
            doc: Rc::clone(doc),
            path: path.to_string(),
            file_name: file_name.to_string(),
            links_to_parse: RefCell::new(Vec::new()),
        };

        stream.save_state();

        let mut aborted = false;

        'first_pass: while !stream.at_end() {
            let mut line = stream.read_line();
            let empty = is_empty_line(&mut line);

            let mut state = ParseState::default();

            loop {
                if state.is_discard() {
                    match state.ctx {
                        Some(c) if tree.first_line_number(c) != -1 => {
                            line = stream.move_to(tree.first_line_number(c));
                        }
                        _ => {
                            aborted = true;
                            break 'first_pass;
                        }
                    }
                }

                self.parse_line(&mut line, &mut stream, &mut tree, root, &env, &mut state);

                if !state.is_discard() {
                    break;
                }
            }

            if stream.at_end() && !empty {
                line = Line::empty(line.line_number() + 1);

                loop {
                    self.parse_line(&mut line, &mut stream, &mut tree, root, &env, &mut state);

                    if !state.is_discard() {
                        break;
                    }
                }
            }

            if stream.at_end() {
                if let Some(back) = tree.back_child(root) {
                    if let Some(block) = tree.block(back) {
                        let mut eof = Line::empty(line.line_number() + 1);

                        block.finish(&mut eof, &mut stream, None, &mut tree, back, &env);
                        block.reset(&mut tree, back);
                    }
                }
            }
        }

        stream.restore_saved_state();

        self.reset_parsers();

        let parent = BlockRef::Document(Rc::clone(doc));

        let mut read_new_line = true;
        let mut line = Line::empty(-1);

        while !aborted && !stream.at_end() {
            if read_new_line {
                line = stream.read_line();
            }

            read_new_line = true;

            let mut child_ctx = tree.front_child(root);

            if let Some(cc) = child_ctx {
                if let Some(block) = tree.block(cc) {
                    let state =
                        block.process(&mut line, &mut stream, Some(&parent), &mut tree, cc, &env);

                    if state == BlockState::Stop {
                        if is_empty_line(&mut line) {
                            line.skip();
                        }

                        if line.position() < line.length() {
                            read_new_line = false;
                        }

                        block.finish(&mut line, &mut stream, Some(&parent), &mut tree, cc, &env);
                        block.reset(&mut tree, cc);

                        tree.dequeue_child(root);

                        child_ctx = tree.front_child(root);
                    }
                }
            }

            if stream.at_end() {
                if let Some(cc) = child_ctx {
                    if let Some(block) = tree.block(cc) {
                        let mut eof = Line::empty(line.line_number() + 1);

                        block.finish(&mut eof, &mut stream, Some(&parent), &mut tree, cc, &env);
                        block.reset(&mut tree, cc);
                    }
                }
            }
        }

        links.append(&mut env.links_to_parse.borrow_mut());
    }

    /// First-pass recursion over the context tree for one line.
    fn parse_line(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
        state: &mut ParseState,
    ) {
        if is_empty_line(line) || line.position() < line.length() {
            let back = tree.back_child(ctx);
            let back_block = back.and_then(|b| tree.block(b));

            match (back, back_block) {
                (Some(back), Some(block)) => {
                    if state.is_discard() && state.ctx == Some(back) {
                        tree.set_block(back, None);
                        tree.set_discard_forced(back, false);
                        tree.clear_children(back);
                        state.state = None;

                        self.loop_block_parsers(line, stream, tree, ctx, env, state);
                    } else {
                        let st = block.continue_check(line, stream, tree, back, env);

                        if st == BlockState::Stop {
                            block.finish(line, stream, None, tree, back, env);
                            block.reset(tree, back);

                            tree.enqueue_new_child(ctx);

                            self.loop_block_parsers(line, stream, tree, ctx, env, state);
                        } else if st == BlockState::Discard {
                            if state.ctx != Some(back) {
                                state.skip.clear();
                            }

                            state.ctx = Some(back);
                            state.state = Some(BlockState::Discard);
                            state.skip.push(block.kind());
                        } else {
                            self.parse_line(line, stream, tree, back, env, state);
                        }
                    }
                }
                _ => {
                    self.loop_block_parsers(line, stream, tree, ctx, env, state);
                }
            }
        } else if let Some(back) = tree.back_child(ctx) {
            if let Some(block) = tree.block(back) {
                block.finish(line, stream, None, tree, back, env);
                block.reset(tree, back);
            }
        }
    }

    /// Probe the pipeline in order on the context's back child; commit to
    /// the first parser that claims the line.
    fn loop_block_parsers(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
        state: &mut ParseState,
    ) {
        if line.position() >= line.length() {
            return;
        }

        for parser in &self.block_parsers {
            let back = match tree.back_child(ctx) {
                Some(b) => b,
                None => return,
            };

            if state.ctx == Some(back) && state.skip.contains(&parser.kind()) {
                continue;
            }

            let st = parser.check(line, stream, tree, back, env, false);

            if st != BlockState::None {
                // A block continuing on the very next line under the same
                // parser is one block: fold the probe context back in.
                let n = tree.children_len(ctx);
                if n > 1 {
                    let prev = tree.child_at(ctx, n - 2);

                    let same_parser = tree
                        .block(prev)
                        .map(|b| Rc::ptr_eq(&b, parser))
                        .unwrap_or(false);

                    if same_parser
                        && tree.last_line_number(prev) != -1
                        && tree.last_line_number(prev) + 1 == line.line_number()
                        && tree.first_line_number(ctx) != line.line_number()
                    {
                        let info = tree.line_info(back);
                        tree.merge_line_info(prev, info);
                        tree.pop_back_child(ctx);

                        if let Some(new_back) = tree.back_child(ctx) {
                            tree.set_last_line_number(new_back, line.line_number());
                        }
                    }
                }

                let back = match tree.back_child(ctx) {
                    Some(b) => b,
                    None => return,
                };

                if st != BlockState::ContinueWithoutAppendingChildCtx {
                    tree.set_block(back, Some(Rc::clone(parser)));
                }

                if st != BlockState::Stop {
                    if st != BlockState::ContinueWithoutAppendingChildCtx {
                        tree.enqueue_new_child(back);

                        self.parse_line(line, stream, tree, back, env, state);
                    } else {
                        self.parse_line(line, stream, tree, ctx, env, state);
                    }
                } else {
                    parser.finish(line, stream, None, tree, back, env);
                    parser.reset(tree, back);

                    tree.enqueue_new_child(ctx);
                }

                break;
            }
        }
    }

    fn reset_parsers(&self) {
        for p in &self.block_parsers {
            p.reset_on_all_contexts();
        }
    }

    fn reset(&self) {
        self.parsed_files.borrow_mut().clear();
        self.reset_parsers();
    }
}

/// Rewrite queued links: resolve `#label` references through the
/// document's reference-link map and absolutize existing files.
fn resolve_links(links: &mut Vec<String>, doc: &NodeRef<Document>) {
    for l in links.iter_mut() {
        let mut next = l.clone();

        if next.starts_with('#') {
            match doc.borrow().labeled_links.get(&next) {
                Some(lnk) => next = lnk.borrow().url.clone(),
                None => continue,
            }
        }

        if Path::new(&next).exists() {
            if let Ok(abs) = std::fs::canonicalize(&next) {
                *l = abs.to_string_lossy().into_owned();
            }
        }
    }
}
