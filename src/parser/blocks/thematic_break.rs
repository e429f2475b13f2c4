//! Thematic break: at indent < 4, three or more of the same `*`, `-` or
//! `_`, interspersed only with spaces.

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, HorizontalLine, Item, Pos};
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{is_empty_line, is_horizontal_line, skip_spaces};

#[derive(Default)]
pub struct ThematicBreakParser;

impl ThematicBreakParser {
    pub fn new() -> Self {
        ThematicBreakParser
    }
}

impl BlockParser for ThematicBreakParser {
    fn kind(&self) -> BlockKind {
        BlockKind::ThematicBreak
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
        line.save_state();

        skip_spaces(line);

        if line.column() - tree.indent_column_for_check(ctx, false) < 4 && is_horizontal_line(line)
        {
            if dry_run {
                line.restore_saved_state();
            }

            return BlockState::Stop;
        }

        line.restore_saved_state();

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
        _env: &ParseEnv,
    ) -> BlockState {
        if is_empty_line(line) {
            line.skip();

            return BlockState::Continue;
        }

        let hl = node(HorizontalLine {
            pos: Pos::new(
                line.position(),
                line.line_number(),
                line.length() - 1,
                line.line_number(),
            ),
        });

        if let Some(parent) = parent {
            parent.append_item(Item::HorizontalLine(hl));
        }

        line.skip();

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

    fn as_dyn(&self) -> &dyn BlockParser {
        self
    }
}
