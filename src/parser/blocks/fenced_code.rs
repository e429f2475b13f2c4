//! Fenced code blocks, including the ```` ```math ```` lowering into a
//! display [`Math`] inside a synthetic paragraph.

use std::cell::{Cell, RefCell};

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Code, Item, Math, NodeRef, Paragraph, Pos};
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{
    indent_from_column, is_empty_line, is_space, read_escaped_sequence, remove_backslashes,
    replace_entities, skip_spaces,
};

/// Consume the opening fence run, reporting the delimiter position and the
/// unescaped, entity-decoded info string.
fn parse_start_of_code(
    line: &mut Line,
    syntax: &mut String,
    delim: &mut Pos,
    syntax_pos: &mut Pos,
) {
    delim.start_col = line.column();
    delim.start_line = line.line_number();

    let fc = line.current_char();

    if fc == '`' || fc == '~' {
        line.next_char();

        while line.current_char() == fc {
            line.next_char();
        }

        delim.end_col = line.position() - 1;
        delim.end_line = line.line_number();

        skip_spaces(line);
        let start_syntax_pos = line.position();

        if line.position() < line.length() {
            let mut end_syntax_pos = -1;
            *syntax = read_escaped_sequence(line, &mut end_syntax_pos);
            replace_entities(syntax);
            remove_backslashes(syntax);

            syntax_pos.start_col = start_syntax_pos;
            syntax_pos.start_line = line.line_number();
            syntax_pos.end_col = end_syntax_pos;
            syntax_pos.end_line = line.line_number();
        }
    }
}

/// Whether the line is a code fence; reports the run length and the fence
/// character. Line state is restored.
fn is_code_fences(line: &mut Line, count: &mut i64, fc: &mut char, closing: bool) -> bool {
    *count = 0;

    let st = line.current_state();

    skip_spaces(line);

    *fc = line.current_char();

    if *fc != '~' && *fc != '`' {
        line.restore_state(&st);
        return false;
    }

    let mut space = false;

    while line.position() < line.length() {
        if is_space(line.current_char()) {
            space = true;
        } else if line.current_char() == *fc {
            if space && (closing || *fc == '`') {
                line.restore_state(&st);
                return false;
            }

            if !space {
                *count += 1;
            }
        } else if closing {
            line.restore_state(&st);
            return false;
        } else {
            break;
        }

        line.next_char();
    }

    let pos = line.position();

    if *count < 3 {
        line.restore_state(&st);
        return false;
    }

    // A backtick opener cannot contain another backtick in its info string.
    if *fc == '`' && line.index_of('`', pos) != -1 {
        line.restore_state(&st);
        return false;
    }

    line.restore_state(&st);

    true
}

fn spaces_count(column: i64, indent: i64) -> i64 {
    column - indent
}

#[derive(Default)]
pub struct FencedCodeParser {
    start_char: Cell<char>,
    start_column: Cell<i64>,
    open_count: Cell<i64>,
    start_delim: Cell<Pos>,
    empty_column: Cell<i64>,
    empty_column_line: Cell<i64>,
    empty_lines_count: Cell<i64>,
    code: RefCell<Option<NodeRef<Code>>>,
    math: RefCell<Option<NodeRef<Math>>>,
    math_paragraph: RefCell<Option<NodeRef<Paragraph>>>,
}

impl FencedCodeParser {
    pub fn new() -> Self {
        let p = FencedCodeParser::default();
        p.start_delim.set(Pos::null());
        p
    }
}

impl BlockParser for FencedCodeParser {
    fn kind(&self) -> BlockKind {
        BlockKind::FencedCode
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

        let start = line.column();

        if tree.is_in_indent(ctx, line.column(), false) {
            let mut count = 0;
            let mut fc = '\0';

            if is_code_fences(line, &mut count, &mut fc, false) {
                self.open_count.set(count);
                self.start_char.set(fc);

                if dry_run {
                    line.restore_saved_state();
                } else {
                    tree.set_first_line_number(ctx, line.line_number());
                    tree.append_child_indent(ctx, indent_from_column(start), '\0');
                    tree.set_not_finished(ctx, true);

                    line.skip();
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
        _stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        _env: &ParseEnv,
    ) -> BlockState {
        line.save_state();

        skip_spaces(line);

        if line.column() >= tree.indent_column(ctx) || is_empty_line(line) {
            let mut close_count = 0;
            let mut fc = '\0';

            if is_code_fences(line, &mut close_count, &mut fc, true)
                && fc == self.start_char.get()
                && close_count >= self.open_count.get()
            {
                line.skip();

                tree.set_not_finished(ctx, false);

                return BlockState::Stop;
            } else {
                line.skip();

                return BlockState::Continue;
            }
        }

        tree.set_not_finished(ctx, false);

        line.restore_saved_state();

        BlockState::Stop
    }

    fn process(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        parent: Option<&BlockRef>,
        tree: &mut ContextTree,
        ctx: CtxId,
        _env: &ParseEnv,
    ) -> BlockState {
        line.save_state();

        if self.start_delim.get().is_null() {
            if is_empty_line(line) {
                line.skip();

                return BlockState::Continue;
            }

            skip_spaces(line);

            tree.set_not_finished(ctx, true);

            let mut syntax = String::new();
            let mut syntax_pos = Pos::null();
            let mut start_delim = Pos::null();

            let p_start_pos = line.position();
            tree.append_child_indent(ctx, p_start_pos, '\0');

            let code = node(Code::new(String::new(), false, false));

            if stream.at_end() {
                let mut c = code.borrow_mut();
                c.pos = Pos::new(
                    line.length(),
                    line.line_number(),
                    line.length(),
                    line.line_number(),
                );
            }

            self.start_char.set(line.current_char());
            self.start_column.set(line.column());

            parse_start_of_code(line, &mut syntax, &mut start_delim, &mut syntax_pos);

            self.start_delim.set(start_delim);
            self.open_count
                .set(start_delim.end_col - start_delim.start_col + 1);

            self.empty_column.set(line.length());
            self.empty_column_line.set(line.line_number());

            if syntax.to_lowercase() == "math" {
                let math_paragraph = node(Paragraph {
                    pos: Pos::new(p_start_pos, line.line_number(), -1, -1),
                    ..Paragraph::default()
                });

                let math = node(Math {
                    is_inline: false,
                    is_fenced_code: true,
                    start_delim,
                    syntax_pos,
                    ..Math::default()
                });

                if stream.at_end() {
                    let mut m = math.borrow_mut();
                    m.pos = Pos::new(
                        self.empty_column.get(),
                        self.empty_column_line.get(),
                        self.empty_column.get(),
                        self.empty_column_line.get(),
                    );
                }

                math_paragraph
                    .borrow_mut()
                    .items
                    .push(Item::Math(math.clone()));

                if let Some(parent) = parent {
                    parent.append_item(Item::Paragraph(math_paragraph.clone()));
                }

                *self.math.borrow_mut() = Some(math);
                *self.math_paragraph.borrow_mut() = Some(math_paragraph);
            } else {
                {
                    let mut c = code.borrow_mut();
                    c.is_fenced = true;
                    c.is_inline = false;
                    c.start_delim = start_delim;
                    c.syntax = syntax;
                    c.syntax_pos = syntax_pos;
                }

                if let Some(parent) = parent {
                    parent.append_item(Item::Code(code.clone()));
                }

                *self.code.borrow_mut() = Some(code);
            }

            line.skip();

            BlockState::Continue
        } else {
            while is_space(line.current_char())
                && line.position() < line.length()
                && line.column()
                    < self
                        .start_column
                        .get()
                        .max(indent_from_column(tree.indent_column(ctx)))
            {
                line.next_char();
            }

            if line.column() >= tree.indent_column(ctx) || is_empty_line(line) {
                let mut close_count = 0;
                let mut fc = '\0';

                let start_pos;
                {
                    let st = line.current_state();
                    skip_spaces(line);
                    start_pos = line.column();
                    line.restore_state(&st);
                }

                let indent = tree.indent_column(ctx);

                if is_code_fences(line, &mut close_count, &mut fc, true)
                    && start_pos < indent + (if indent != 0 { 5 } else { 4 })
                    && fc == self.start_char.get()
                    && close_count >= self.open_count.get()
                {
                    let end_delim = Pos::new(
                        line.position(),
                        line.line_number(),
                        line.length() - 1,
                        line.line_number(),
                    );

                    if let Some(code) = self.code.borrow().clone() {
                        let mut c = code.borrow_mut();
                        c.end_delim = end_delim;

                        if c.text.is_empty() {
                            c.pos = Pos::new(
                                self.empty_column.get(),
                                self.empty_column_line.get(),
                                self.empty_column.get(),
                                self.empty_column_line.get(),
                            );
                        }
                    } else if let Some(math) = self.math.borrow().clone() {
                        if let Some(mp) = self.math_paragraph.borrow().clone() {
                            let mut p = mp.borrow_mut();
                            p.pos.end_col = line.length() - 1;
                            p.pos.end_line = line.line_number();
                        }

                        let mut m = math.borrow_mut();
                        m.end_delim = end_delim;

                        if m.expr.is_empty() {
                            m.pos = Pos::new(
                                self.empty_column.get(),
                                self.empty_column_line.get(),
                                self.empty_column.get(),
                                self.empty_column_line.get(),
                            );
                        }
                    }

                    line.skip();

                    self.reset(tree, ctx);

                    return BlockState::Stop;
                } else {
                    let base = (if indent != 0 { indent + 1 } else { 0 }).max(self.start_column.get());

                    if let Some(math) = self.math.borrow().clone() {
                        let mut m = math.borrow_mut();

                        if !m.expr.is_empty() {
                            m.expr.push('\n');
                        }

                        let pad = spaces_count(line.column(), base).max(0) as usize;
                        m.expr.push_str(&" ".repeat(pad));
                        m.expr.push_str(&line.sliced_copy_to_end(line.position()));

                        if m.pos.is_null() {
                            m.pos = Pos::new(
                                tree.indent_column(ctx),
                                line.line_number(),
                                line.length() - 1,
                                line.line_number(),
                            );
                        } else {
                            m.pos.end_col = line.length() - 1;
                            m.pos.end_line = line.line_number();
                        }
                    } else if let Some(code) = self.code.borrow().clone() {
                        let mut c = code.borrow_mut();

                        if c.pos.is_null() {
                            c.pos.start_col = line.position()
                                - if line.column() > self.start_column.get() {
                                    1
                                } else {
                                    0
                                };
                            c.pos.start_line = line.line_number();
                        }

                        let pad = spaces_count(line.column(), base).max(0) as usize;
                        let data = " ".repeat(pad) + &line.sliced_copy_to_end(line.position());

                        c.pos.end_col = if line.length() != 0 {
                            if line.position() < line.length() {
                                line.length() - 1
                            } else {
                                line.position()
                            }
                        } else {
                            0
                        };
                        c.pos.end_line = line.line_number();

                        if !data.is_empty() {
                            let mut text = std::mem::take(&mut c.text);

                            if !text.is_empty() {
                                text.push('\n');
                            }

                            for _ in 0..self.empty_lines_count.get() {
                                text.push('\n');
                            }

                            self.empty_lines_count.set(0);

                            text.push_str(&data);
                            c.text = text;
                        } else {
                            self.empty_lines_count.set(self.empty_lines_count.get() + 1);
                        }
                    }

                    line.skip();

                    BlockState::Continue
                }
            } else {
                line.restore_saved_state();

                self.reset(tree, ctx);

                BlockState::Stop
            }
        }
    }

    fn reset(&self, tree: &mut ContextTree, ctx: CtxId) {
        tree.set_not_finished(ctx, false);

        self.reset_on_all_contexts();
    }

    fn reset_on_all_contexts(&self) {
        if let Some(code) = self.code.borrow().clone() {
            let empties = self.empty_lines_count.get();

            if empties > 0 {
                let mut c = code.borrow_mut();
                for _ in 0..empties {
                    c.text.push('\n');
                }
            }
        }

        self.start_char.set('\0');
        self.start_column.set(0);
        *self.code.borrow_mut() = None;
        *self.math.borrow_mut() = None;
        *self.math_paragraph.borrow_mut() = None;
        self.start_delim.set(Pos::null());
        self.open_count.set(0);
        self.empty_lines_count.set(0);
    }

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
