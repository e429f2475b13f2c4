//! Block parsers and the contract they implement.
//!
//! Each block parser is probed with [`BlockParser::check`] when no block is
//! active, continued with [`BlockParser::continue_check`] while it owns the
//! deepest context, and — in the second pass — handed its lines again
//! through [`BlockParser::process`] to build the document tree.

mod atx_heading;
mod blockquote;
mod fenced_code;
mod footnote;
mod html;
mod indented_code;
mod list;
mod paragraph;
mod setext_heading;
mod table;
mod thematic_break;
mod yaml;

pub use atx_heading::AtxHeadingParser;
pub use blockquote::BlockquoteParser;
pub use fenced_code::FencedCodeParser;
pub use footnote::FootnoteParser;
pub use html::HtmlParser;
pub use indented_code::IndentedCodeParser;
pub use list::ListParser;
pub use paragraph::ParagraphParser;
pub use setext_heading::SetextHeadingParser;
pub use table::TableParser;
pub use thematic_break::ThematicBreakParser;
pub use yaml::YamlParser;

use std::rc::Rc;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::BlockRef;
use crate::parser::ParseEnv;
use crate::stream::TextStream;

/// Shared handle to a block parser in a pipeline.
pub type BlockParserRef = Rc<dyn BlockParser>;

/// Identity tag of a block parser, replacing run-time type checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// YAML front matter.
    Yaml,
    /// Blockquote.
    Blockquote,
    /// Setext heading underline.
    SetextHeading,
    /// Thematic break.
    ThematicBreak,
    /// List.
    List,
    /// ATX heading.
    AtxHeading,
    /// Fenced code block.
    FencedCode,
    /// HTML block.
    Html,
    /// Indented code block.
    IndentedCode,
    /// Footnote definition.
    Footnote,
    /// GFM table.
    Table,
    /// Paragraph (the fallback).
    Paragraph,
}

/// One block construct's parsing rules.
///
/// Parsers are shared across contexts; all mutable state lives in
/// `Cell`/`RefCell` fields so that the probe helpers can re-enter the
/// pipeline while a parser is on the stack.
pub trait BlockParser {
    /// This parser's identity tag.
    fn kind(&self) -> BlockKind;

    /// Probe whether this parser handles the current line. With `dry_run`
    /// set, all line and context state must be restored before returning.
    /// Never returns [`BlockState::Discard`].
    fn check(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
        dry_run: bool,
    ) -> BlockState;

    /// Called on subsequent lines while this parser owns the context.
    fn continue_check(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) -> BlockState;

    /// Second-pass work: consume the line and populate the document.
    fn process(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        parent: Option<&BlockRef>,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) -> BlockState;

    /// Flush pending work when the block closes or at end of input.
    fn finish(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        parent: Option<&BlockRef>,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) {
        let _ = parent;
        finish_children(self.as_dyn(), line, stream, tree, ctx, env);
    }

    /// Reset per-context state for reuse.
    fn reset(&self, tree: &mut ContextTree, ctx: CtxId) {
        reset_children(tree, ctx);
    }

    /// Reset all state, regardless of context.
    fn reset_on_all_contexts(&self);

    /// Whether this block's appearance under an open paragraph closes the
    /// paragraph.
    fn may_break_paragraph(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) -> bool;

    /// Whether this content may attach to a paragraph as a lazy
    /// continuation line.
    fn can_be_lazy_line(
        &self,
        _line: &mut Line,
        _stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> bool {
        false
    }

    /// Whether an open, not-finished instance may be aborted by a
    /// conflicting line (triggering the Discard rewind).
    fn is_not_finished_discardable(&self) -> bool {
        false
    }

    /// The block currently under construction for the given context.
    fn current_block(&self, _tree: &ContextTree, _ctx: CtxId) -> Option<BlockRef> {
        None
    }

    /// `self` as a trait object, for the shared helpers.
    fn as_dyn(&self) -> &dyn BlockParser;
}

/// Feed the line to the front child context's parser once, closing it on
/// `Stop`.
pub fn process_one_time(
    line: &mut Line,
    stream: &mut TextStream,
    parent: Option<&BlockRef>,
    tree: &mut ContextTree,
    ctx: CtxId,
    env: &ParseEnv,
) -> BlockState {
    let mut state = BlockState::None;

    if let Some(front) = tree.front_child(ctx) {
        if let Some(block) = tree.block(front) {
            state = block.process(line, stream, parent, tree, front, env);

            if state == BlockState::Stop {
                block.finish(line, stream, parent, tree, front, env);
                block.reset(tree, front);
                tree.dequeue_child(ctx);
            }
        }
    }

    state
}

/// Drive the context's child queue over the current line until the line is
/// exhausted or no active child remains.
pub fn process_children(
    line: &mut Line,
    stream: &mut TextStream,
    parent: Option<&BlockRef>,
    tree: &mut ContextTree,
    ctx: CtxId,
    env: &ParseEnv,
) -> BlockState {
    let mut state;

    loop {
        state = process_one_time(line, stream, parent, tree, ctx, env);

        let front_active = tree
            .front_child(ctx)
            .map(|f| tree.block(f).is_some())
            .unwrap_or(false);

        if !(front_active && !line.at_end()) {
            break;
        }
    }

    state
}

/// Default `finish`: finish every child context, parenting them to this
/// parser's block under construction.
pub fn finish_children(
    this: &dyn BlockParser,
    line: &mut Line,
    stream: &mut TextStream,
    tree: &mut ContextTree,
    ctx: CtxId,
    env: &ParseEnv,
) {
    let parent = this.current_block(tree, ctx);

    for i in 0..tree.children_len(ctx) {
        let child = tree.child_at(ctx, i);
        if let Some(block) = tree.block(child) {
            block.finish(line, stream, parent.as_ref(), tree, child, env);
        }
    }
}

/// Default `reset`: reset every child context's parser.
pub fn reset_children(tree: &mut ContextTree, ctx: CtxId) {
    for i in 0..tree.children_len(ctx) {
        let child = tree.child_at(ctx, i);
        if let Some(block) = tree.block(child) {
            block.reset(tree, child);
        }
    }
}

/// Whether the line is a lazy continuation of the paragraph open in the
/// most nested child context.
pub fn is_lazy_continuation_line(
    line: &mut Line,
    stream: &mut TextStream,
    tree: &mut ContextTree,
    ctx: CtxId,
    env: &ParseEnv,
    consider_indents: bool,
) -> bool {
    let nested = tree.most_nested_child(ctx);
    let is_paragraph = tree
        .block(nested)
        .map(|b| b.kind() == BlockKind::Paragraph)
        .unwrap_or(false);

    if is_paragraph {
        let st = line.current_state();

        if !consider_indents {
            tree.set_dont_consider_indents(ctx, true);
        }

        let b = env.parser.check_block(line, stream, tree, ctx, env);

        tree.set_dont_consider_indents(ctx, false);

        if let Some(b) = b {
            return b.can_be_lazy_line(line, stream, tree, ctx, env)
                && !b.may_break_paragraph(line, stream, tree, ctx, env);
        }

        line.restore_state(&st);
    }

    false
}
