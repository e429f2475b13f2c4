//! GFM tables: a header row, a delimiter row fixing the column count and
//! alignments, then data rows until a blank line or an interrupting block.
//! A failed delimiter row aborts the tentative table via Discard.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{
    node, BlockRef, Item, NodeRef, Pos, Table, TableAlignment, TableCell, TableRow,
};
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::inlines::{make_text_objects, process_emphasises, tokenize, InlineCtx};
use crate::parser::ParseEnv;
use crate::stream::{ParagraphStream, TextStream};
use crate::strings::{is_empty_line, is_space, skip_if, skip_spaces, ReverseSolidus};

fn is_column_alignment(mut line: Line) -> bool {
    skip_spaces(&mut line);

    if line.position() == line.length() {
        return false;
    }

    if line.current_char() != ':' && line.current_char() != '-' {
        return false;
    }

    if line.current_char() == ':' {
        line.next_char();
    }

    skip_if(&mut line, |ch| ch == '-');

    if line.position() == line.length() {
        return true;
    }

    if line.current_char() != ':' && !is_space(line.current_char()) {
        return false;
    }

    line.next_char();

    skip_spaces(&mut line);

    line.position() >= line.length()
}

fn is_table_alignment(line: &mut Line) -> i32 {
    let st = line.current_state();

    skip_spaces(line);

    let mut c = 0;

    if line.current_char() == '|' {
        line.next_char();
        skip_spaces(line);
    }

    let mut pos = line.position();

    while line.position() < line.length() {
        if line.current_char() == '|' {
            if is_column_alignment(line.sliced(pos, line.position() - pos)) {
                c += 1;

                line.next_char();
                skip_spaces(line);
                pos = line.position();
            } else {
                line.restore_state(&st);
                return 0;
            }
        }

        line.next_char();
    }

    if pos < line.length() {
        if is_column_alignment(line.sliced(pos, line.position() - pos)) {
            c += 1;
        } else {
            line.restore_state(&st);
            return 0;
        }
    }

    line.restore_state(&st);

    c
}

fn is_table_header(line: &mut Line) -> i32 {
    if line.index_of('|', 0) == -1 {
        return 0;
    }

    let outer = line.current_state();

    let mut c = 1;

    skip_spaces(line);

    let mut st = line.current_state();

    if line.current_char() == '|' {
        line.next_char();
    }

    let mut rs = ReverseSolidus::new();

    while line.position() < line.length() {
        if rs.is_not_escaped(line.current_char()) && line.current_char() == '|' {
            st = line.current_state();
            c += 1;
        }

        rs.next();
        line.next_char();
    }

    line.restore_state(&st);

    if line.current_char() == '|' {
        line.next_char();
    }

    let res = c - if is_empty_line(line) { 1 } else { 0 };

    line.restore_state(&outer);

    res
}

#[derive(Default)]
pub struct TableParser {
    check_align: Cell<bool>,
    columns_count: Cell<i32>,
    table: RefCell<Option<NodeRef<Table>>>,
    row: RefCell<Option<NodeRef<TableRow>>>,
}

impl TableParser {
    pub fn new() -> Self {
        TableParser::default()
    }

    /// Split the line on unescaped `|` into at most `columns_count` cells
    /// and hand each to `f`; trailing spaces inside a cell are dropped.
    fn process_row(&self, line: &mut Line, add_row: bool, mut f: impl FnMut(Line)) {
        if let Some(table) = self.table.borrow().clone() {
            let mut t = table.borrow_mut();
            t.pos.end_col = line.length() - 1;
            t.pos.end_line = line.line_number();
        }

        let start_pos = line.position();

        if line.current_char() == '|' {
            line.next_char();
            skip_spaces(line);
        }

        if add_row {
            let row = node(TableRow {
                pos: Pos::new(
                    start_pos,
                    line.line_number(),
                    line.length() - 1,
                    line.line_number(),
                ),
                ..TableRow::default()
            });

            if let Some(table) = self.table.borrow().clone() {
                table.borrow_mut().rows.push(row.clone());
            }

            *self.row.borrow_mut() = Some(row);
        }

        for _ in 0..self.columns_count.get() {
            if line.position() < line.length() {
                let st = line.current_state();

                let mut rs = ReverseSolidus::new();
                let mut spaces = 0i64;

                while line.position() < line.length() {
                    if rs.is_not_escaped(line.current_char()) {
                        if line.current_char() == '|' {
                            break;
                        } else if is_space(line.current_char()) {
                            spaces += 1;
                        } else {
                            spaces = 0;
                        }
                    } else {
                        spaces = 0;
                    }

                    rs.next();
                    line.next_char();
                }

                let mut cell_line = line.sliced(0, line.position() - spaces);
                cell_line.restore_state(&st);

                if line.current_char() == '|' {
                    line.next_char();
                }

                f(cell_line);
            }
        }
    }

    fn process_cell(&self, mut line: Line, env: &ParseEnv) {
        let cell = node(TableCell::default());

        skip_spaces(&mut line);

        {
            let mut c = cell.borrow_mut();
            c.pos.start_line = line.line_number();
            c.pos.start_col = if line.position() < line.length() {
                line.position()
            } else {
                line.length() - 1
            };
            c.pos.end_col = line.length() - 1;
            c.pos.end_line = line.line_number();
        }

        let mut ictx = InlineCtx::default();

        env.parser.push_state_of_inliners();

        let mut lines = FxHashMap::default();
        lines.insert(line.line_number(), line.clone());

        let mut p_stream = ParagraphStream::new(lines, line.line_number(), line.line_number());
        let pst = p_stream.current_state();

        tokenize(&mut p_stream, &mut ictx, env, Pos::null(), false);

        p_stream.restore_state(&pst);

        env.parser.pop_state_of_inliners();

        process_emphasises(&mut ictx);

        // `\|` inside a code span is not a cell separator; drop the escape.
        for item in &ictx.inlines {
            if let Item::Code(code) = item {
                let mut c = code.borrow_mut();

                let mut data = String::with_capacity(c.text.len());
                let mut rs = ReverseSolidus::new();

                for ch in c.text.chars() {
                    if rs.is_escaped(ch) && ch == '|' {
                        data.pop();
                    }

                    data.push(ch);
                    rs.next();
                }

                c.text = data;
            }
        }

        make_text_objects(
            &mut ictx,
            &mut p_stream,
            &BlockRef::TableCell(cell.clone()),
            &Pos::null(),
        );

        if let Some(row) = self.row.borrow().clone() {
            row.borrow_mut().cells.push(cell);
        }
    }

    fn process_alignment(&self, mut line: Line) {
        let mut left = false;
        let mut right = false;

        skip_spaces(&mut line);

        if line.current_char() == ':' {
            left = true;
            line.next_char();
        }

        skip_if(&mut line, |c| c == '-');

        if line.current_char() == ':' {
            right = true;
        }

        if let Some(table) = self.table.borrow().clone() {
            let align = if left && right {
                TableAlignment::Center
            } else if right {
                TableAlignment::Right
            } else {
                TableAlignment::Left
            };

            table.borrow_mut().aligns.push(align);
        }
    }
}

impl BlockParser for TableParser {
    fn kind(&self) -> BlockKind {
        BlockKind::Table
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

        if tree.is_in_indent(ctx, line.column(), false) {
            let c = is_table_header(line);

            if c != 0 {
                if dry_run {
                    line.restore_saved_state();
                } else {
                    line.skip();

                    tree.set_first_line_number(ctx, line.line_number());
                    tree.set_not_finished(ctx, true);

                    self.columns_count.set(c);
                    self.check_align.set(true);
                }

                return BlockState::Continue;
            }
        }

        line.restore_saved_state();

        BlockState::None
    }

    fn continue_check(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) -> BlockState {
        if tree.is_discard_forced(ctx) {
            return BlockState::Discard;
        }

        line.save_state();

        skip_spaces(line);

        if tree.is_in_indent(ctx, line.column(), false) {
            if self.check_align.get() {
                self.check_align.set(false);

                let c = is_table_alignment(line);

                if self.columns_count.get() != 0 && self.columns_count.get() == c {
                    line.skip();
                    tree.set_not_finished(ctx, false);

                    return BlockState::Continue;
                } else {
                    return BlockState::Discard;
                }
            } else if is_empty_line(line) {
                return BlockState::Stop;
            } else {
                let block =
                    env.parser
                        .check_block_excluding(line, stream, tree, ctx, env, self.kind());

                let is_paragraph = block
                    .map(|b| b.kind() == BlockKind::Paragraph)
                    .unwrap_or(false);

                if !is_paragraph {
                    return BlockState::Stop;
                } else {
                    line.skip();

                    return BlockState::Continue;
                }
            }
        }

        line.restore_saved_state();

        if self.check_align.get() {
            BlockState::Discard
        } else {
            BlockState::Stop
        }
    }

    fn process(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        parent: Option<&BlockRef>,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) -> BlockState {
        line.save_state();

        skip_spaces(line);

        if self.table.borrow().is_none() {
            if is_empty_line(line) {
                line.skip();

                return BlockState::Continue;
            }

            let table = node(Table {
                pos: Pos::new(
                    line.position(),
                    line.line_number(),
                    line.length() - 1,
                    line.line_number(),
                ),
                ..Table::default()
            });

            if let Some(parent) = parent {
                parent.append_item(Item::Table(table.clone()));
            }

            *self.table.borrow_mut() = Some(table);

            self.check_align.set(true);
            self.columns_count.set(is_table_header(line));

            self.process_row(line, true, |cell_line| self.process_cell(cell_line, env));

            BlockState::Continue
        } else if self.check_align.get() {
            skip_spaces(line);

            self.check_align.set(false);

            self.process_row(line, false, |cell_line| self.process_alignment(cell_line));

            BlockState::Continue
        } else {
            if !is_empty_line(line) && line.column() - tree.indent_column_for_check(ctx, false) < 4
            {
                let block =
                    env.parser
                        .check_block_excluding(line, stream, tree, ctx, env, self.kind());

                let is_paragraph = block
                    .map(|b| b.kind() == BlockKind::Paragraph)
                    .unwrap_or(false);

                if !is_paragraph {
                    return BlockState::Stop;
                } else {
                    self.process_row(line, true, |cell_line| self.process_cell(cell_line, env));

                    return BlockState::Continue;
                }
            }

            BlockState::Stop
        }
    }

    fn reset(&self, tree: &mut ContextTree, ctx: CtxId) {
        self.reset_on_all_contexts();

        tree.clear_child_indents_all(ctx);
    }

    fn reset_on_all_contexts(&self) {
        self.check_align.set(false);
        self.columns_count.set(0);
        *self.table.borrow_mut() = None;
        *self.row.borrow_mut() = None;
    }

    fn may_break_paragraph(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        _tree: &mut ContextTree,
        _ctx: CtxId,
        _env: &ParseEnv,
    ) -> bool {
        is_table_header(line) != 0 && is_table_alignment(line) == 0
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

    fn is_not_finished_discardable(&self) -> bool {
        true
    }

    fn as_dyn(&self) -> &dyn BlockParser {
        self
    }
}
