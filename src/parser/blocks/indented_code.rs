//! Indented code: lines at four or more columns beyond the maximum
//! available indent, when nothing else claims them.

use std::cell::{Cell, RefCell};

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Code, Item, NodeRef};
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{indent_from_column, is_empty_line, is_space, skip_spaces};

fn code_column(indent: i64) -> i64 {
    indent_from_column(indent) + 4
}

#[derive(Default)]
pub struct IndentedCodeParser {
    code: RefCell<Option<NodeRef<Code>>>,
    empty_lines_count: Cell<i64>,
}

impl IndentedCodeParser {
    pub fn new() -> Self {
        IndentedCodeParser::default()
    }
}

impl BlockParser for IndentedCodeParser {
    fn kind(&self) -> BlockKind {
        BlockKind::IndentedCode
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

        if line.column() >= code_column(tree.max_available_indent(ctx)) {
            if dry_run {
                line.restore_saved_state();
            } else {
                line.skip();
            }

            return BlockState::Continue;
        }

        line.restore_saved_state();

        BlockState::None
    }

    fn continue_check(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        _env: &ParseEnv,
    ) -> BlockState {
        line.save_state();

        skip_spaces(line);

        if line.column() >= code_column(tree.max_available_indent(ctx)) || is_empty_line(line) {
            line.skip();

            return BlockState::Continue;
        }

        line.restore_saved_state();

        BlockState::Stop
    }

    fn process(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        parent: Option<&BlockRef>,
        tree: &mut ContextTree,
        ctx: CtxId,
        _env: &ParseEnv,
    ) -> BlockState {
        line.save_state();

        let column = code_column(tree.max_available_indent(ctx));

        while is_space(line.current_char()) && line.position() < line.length() && line.column() < column
        {
            line.next_char();
        }

        if line.column() >= column || is_empty_line(line) {
            if self.code.borrow().is_none() {
                if is_empty_line(line) {
                    line.skip();

                    return BlockState::Continue;
                }

                let code = node(Code::new(String::new(), false, false));
                {
                    let mut c = code.borrow_mut();
                    c.pos.start_col = line.position() - if line.column() > column { 1 } else { 0 };
                    c.pos.start_line = line.line_number();
                }

                if let Some(parent) = parent {
                    parent.append_item(Item::Code(code.clone()));
                }

                *self.code.borrow_mut() = Some(code);
            }

            if let Some(code) = self.code.borrow().clone() {
                let pad = (line.column() - column).max(0) as usize;
                let data = " ".repeat(pad) + &line.sliced_copy_to_end(line.position());

                if !data.is_empty() {
                    let mut c = code.borrow_mut();

                    let mut text = std::mem::take(&mut c.text);

                    if !text.is_empty() {
                        text.push('\n');
                    }

                    for _ in 0..self.empty_lines_count.get() {
                        text.push('\n');
                    }

                    text.push_str(&data);
                    c.text = text;

                    self.empty_lines_count.set(0);

                    c.pos.end_col = line.length() - 1;
                    c.pos.end_line = line.line_number();
                } else {
                    self.empty_lines_count.set(self.empty_lines_count.get() + 1);
                }
            }

            line.skip();

            BlockState::Continue
        } else {
            line.restore_saved_state();

            self.reset(tree, ctx);

            BlockState::Stop
        }
    }

    fn reset(&self, _tree: &mut ContextTree, _ctx: CtxId) {
        self.reset_on_all_contexts();
    }

    fn reset_on_all_contexts(&self) {
        self.empty_lines_count.set(0);
        *self.code.borrow_mut() = None;
    }

    fn may_break_paragraph(
        &self,
        _line: &mut Line,
        _stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> bool {
        false
    }

    fn can_be_lazy_line(
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
