//! Setext headings: a paragraph promoted by an `=` or `-` underline.

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Heading, Item, Pos};
use crate::parser::blocks::atx_heading::process_label;
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{indent_from_column, skip_if, skip_spaces};

#[derive(Default)]
pub struct SetextHeadingParser;

impl SetextHeadingParser {
    pub fn new() -> Self {
        SetextHeadingParser
    }
}

fn is_setext_underline(line: &mut Line) -> bool {
    let st = line.current_state();

    let c = line.current_char();

    if c != '=' && c != '-' {
        line.restore_state(&st);
        return false;
    }

    skip_if(line, |ch| ch == c);
    skip_spaces(line);

    let res = line.at_end();

    line.restore_state(&st);

    res
}

/// Whether the line underlines the paragraph open in `ctx`.
pub(crate) fn is_setext(line: &mut Line, tree: &ContextTree, ctx: CtxId) -> bool {
    let is_paragraph = tree
        .block(ctx)
        .map(|b| b.kind() == BlockKind::Paragraph)
        .unwrap_or(false);

    if is_paragraph
        && tree.start_pos(ctx, line.line_number() - 1).pos != -1
        && tree.first_line_number(ctx) != -1
    {
        let st = line.current_state();

        skip_spaces(line);

        let res = line.column() >= indent_from_column(tree.indent_column(ctx))
            && line.column() < tree.indent_column(ctx) + 4
            && is_setext_underline(line);

        line.restore_state(&st);

        return res;
    }

    false
}

impl BlockParser for SetextHeadingParser {
    fn kind(&self) -> BlockKind {
        BlockKind::SetextHeading
    }

    fn check(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        _env: &ParseEnv,
        dry_run: bool,
    ) -> BlockState {
        if let Some(block) = tree.block(ctx) {
            if is_setext(line, tree, ctx) {
                if !dry_run {
                    line.skip();
                }

                return BlockState::Stop;
            } else if block.kind() == BlockKind::List && tree.has_children(ctx) {
                let back = tree.back_child(ctx).unwrap();

                if is_setext(line, tree, back) {
                    if !dry_run {
                        line.skip();
                    }

                    return BlockState::Stop;
                }
            }
        } else if let Some(parent) = tree.parent(ctx) {
            if tree.children_len(parent) > 1 {
                let prev = tree.child_at(parent, tree.children_len(parent) - 2);

                if is_setext(line, tree, prev) {
                    if !dry_run {
                        line.skip();
                    }

                    return BlockState::Stop;
                }
            }
        }

        BlockState::None
    }

    fn continue_check(
        &self,
        _line: &mut Line,
        _stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> BlockState {
        BlockState::Stop
    }

    fn process(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        parent: Option<&BlockRef>,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        env: &ParseEnv,
    ) -> BlockState {
        let parent = match parent {
            Some(p) => p,
            None => return BlockState::Stop,
        };

        let paragraph = match parent.pop_last() {
            Some(Item::Paragraph(p)) => p,
            Some(other) => {
                parent.append_item(other);
                return BlockState::Stop;
            }
            None => return BlockState::Stop,
        };

        let p_pos = paragraph.borrow().pos;

        let heading = node(Heading {
            pos: Pos::new(
                p_pos.start_col,
                p_pos.start_line,
                line.length() - 1,
                line.line_number(),
            ),
            text: Some(paragraph.clone()),
            ..Heading::default()
        });

        parent.append_item(Item::Heading(heading.clone()));

        skip_spaces(line);

        heading.borrow_mut().level = if line.current_char() == '=' { 1 } else { 2 };

        let start_delim_pos = line.position();
        let dch = line.current_char();

        skip_if(line, |ch| ch == dch);

        heading.borrow_mut().delims = vec![Pos::new(
            start_delim_pos,
            line.line_number(),
            line.position() - 1,
            line.line_number(),
        )];

        process_label(&paragraph, &env.path, &env.file_name, &heading, env);

        BlockState::Stop
    }

    fn reset(&self, _tree: &mut ContextTree, _ctx: CtxId) {}

    fn reset_on_all_contexts(&self) {}

    fn may_break_paragraph(
        &self,
        _line: &mut Line,
        _stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> bool {
        true
    }

    fn can_be_lazy_line(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> bool {
        let st = line.current_state();

        skip_spaces(line);

        let res = line.current_char() == '=';

        line.restore_state(&st);

        res
    }

    fn as_dyn(&self) -> &dyn BlockParser {
        self
    }
}
