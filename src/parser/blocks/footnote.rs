//! Footnote definitions: `[^label]:` at indent < 4, with continuation
//! lines indented four columns past the label after a blank line.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Footnote, NodeRef, Pos};
use crate::parser::blocks::{process_children, BlockKind, BlockParser};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{
    indent_from_column, is_empty_line, is_space, label_key, skip_spaces, ReverseSolidus,
};

/// Whether the line starts a footnote definition. On success the cursor is
/// left at the `[`; on failure the state is restored.
fn is_footnote(line: &mut Line) -> bool {
    let st = line.current_state();

    skip_spaces(line);

    let keep = line.current_state();

    let mut fail = |line: &mut Line| {
        line.restore_state(&st);
        false
    };

    if line.length() - line.position() < 5 {
        return fail(line);
    }

    if line.current_char() != '[' {
        return fail(line);
    }

    line.next_char();

    if line.current_char() != '^' {
        return fail(line);
    }

    line.next_char();

    if line.current_char() == ']' || is_space(line.current_char()) {
        return fail(line);
    }

    let mut rs = ReverseSolidus::new();

    while line.position() < line.length() {
        if rs.is_not_escaped(line.current_char()) {
            if line.current_char() == ']' {
                break;
            } else if is_space(line.current_char()) {
                return fail(line);
            }
        }

        line.next_char();
        rs.next();
    }

    line.next_char();

    if line.position() < line.length() && line.current_char() == ':' {
        line.next_char();

        if is_space(line.current_char()) {
            line.restore_state(&keep);

            return true;
        }
    }

    fail(line)
}

#[derive(Default)]
pub struct FootnoteParser {
    note: RefCell<Option<NodeRef<Footnote>>>,
    was_empty_line: Cell<bool>,
}

impl FootnoteParser {
    pub fn new() -> Self {
        FootnoteParser::default()
    }

    /// Read the `[^label]:` id, register the note under its normalized key
    /// and leave the cursor after the `:`.
    fn process_id(
        &self,
        line: &mut Line,
        env: &ParseEnv,
        note: Option<&NodeRef<Footnote>>,
    ) {
        skip_spaces(line);
        let start_pos = line.position();
        line.next_char();

        let mut label = String::new();
        let mut rs = ReverseSolidus::new();

        while line.position() < line.length() {
            if rs.is_not_escaped(line.current_char()) {
                if line.current_char() == ']' {
                    break;
                } else {
                    label.push(line.current_char());
                }
            }

            line.next_char();
            rs.next();
        }

        line.next_char();
        let end_pos = line.position();
        line.next_char();

        if let Some(note) = note {
            note.borrow_mut().id_pos =
                Pos::new(start_pos, line.line_number(), end_pos, line.line_number());
        }

        let key = label_key(&label, &env.path, &env.file_name);

        let value = note
            .map(Rc::clone)
            .unwrap_or_else(|| node(Footnote::default()));

        env.doc.borrow_mut().footnotes.insert(key, value);
    }
}

impl BlockParser for FootnoteParser {
    fn kind(&self) -> BlockKind {
        BlockKind::Footnote
    }

    fn check(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
        dry_run: bool,
    ) -> BlockState {
        line.save_state();

        skip_spaces(line);

        if tree.is_in_indent(ctx, line.column(), false) {
            line.restore_saved_state();

            if is_footnote(line) {
                line.restore_saved_state();

                if !dry_run {
                    self.process_id(line, env, None);

                    tree.append_child_indent(ctx, indent_from_column(line.column()), '\0');

                    if line.current_char() == ' ' {
                        line.next_char();
                    }
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
        line.save_state();

        if is_empty_line(line) {
            self.was_empty_line.set(true);

            return BlockState::Continue;
        }

        if self.was_empty_line.get() {
            tree.clear_child_indents_all(ctx);
            tree.append_child_indent(ctx, 4, '\0');

            let target = indent_from_column(tree.indent_column_for_check(ctx, false));

            while line.position() < line.length()
                && line.column() < target
                && is_space(line.current_char())
            {
                line.next_char();
            }

            if line.column() >= target {
                BlockState::Continue
            } else {
                BlockState::Stop
            }
        } else {
            let child = tree.child_indents(ctx);
            tree.clear_child_indents_all(ctx);

            if self.check(line, stream, tree, ctx, env, true) == BlockState::None {
                tree.set_child_indents(ctx, child);

                BlockState::Continue
            } else {
                BlockState::Stop
            }
        }
    }

    fn process(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        _parent: Option<&BlockRef>,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) -> BlockState {
        line.save_state();

        let note = self.note.borrow().clone();

        match note {
            None => {
                if is_empty_line(line) {
                    line.skip();

                    return BlockState::Continue;
                }

                let note = node(Footnote {
                    pos: Pos::new(
                        line.position(),
                        line.line_number(),
                        line.length() - 1,
                        line.line_number(),
                    ),
                    ..Footnote::default()
                });

                self.process_id(line, env, Some(&note));

                tree.append_child_indent(ctx, indent_from_column(line.column()), '\0');

                let block_ref = BlockRef::Footnote(Rc::clone(&note));
                process_children(line, stream, Some(&block_ref), tree, ctx, env);

                tree.clear_child_indents_all(ctx);

                *self.note.borrow_mut() = Some(note);

                BlockState::Continue
            }
            Some(note) => {
                let empty = is_empty_line(line);

                if self.was_empty_line.get() {
                    if !tree.has_child_indents(ctx) {
                        tree.append_child_indent(ctx, 4, '\0');
                    }

                    let st = line.current_state();

                    let target = indent_from_column(tree.indent_column_for_check(ctx, false));

                    while line.position() < line.length()
                        && line.column() < target
                        && is_space(line.current_char())
                    {
                        line.next_char();
                    }

                    if empty || line.column() >= target {
                        if !empty {
                            let mut n = note.borrow_mut();
                            n.pos.end_col = line.length() - 1;
                            n.pos.end_line = line.line_number();
                        }

                        let block_ref = BlockRef::Footnote(Rc::clone(&note));
                        process_children(line, stream, Some(&block_ref), tree, ctx, env);

                        BlockState::Continue
                    } else {
                        line.restore_state(&st);

                        BlockState::Stop
                    }
                } else {
                    if empty {
                        self.was_empty_line.set(true);
                    }

                    let child = tree.child_indents(ctx);
                    tree.clear_child_indents_all(ctx);

                    if self.check(line, stream, tree, ctx, env, true) == BlockState::None {
                        tree.set_child_indents(ctx, child);

                        let block_ref = BlockRef::Footnote(Rc::clone(&note));
                        process_children(line, stream, Some(&block_ref), tree, ctx, env);

                        BlockState::Continue
                    } else {
                        BlockState::Stop
                    }
                }
            }
        }
    }

    fn reset(&self, tree: &mut ContextTree, ctx: CtxId) {
        self.reset_on_all_contexts();

        tree.clear_child_indents_all(ctx);
    }

    fn reset_on_all_contexts(&self) {
        *self.note.borrow_mut() = None;
        self.was_empty_line.set(false);
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

    fn current_block(&self, _tree: &ContextTree, _ctx: CtxId) -> Option<BlockRef> {
        self.note
            .borrow()
            .as_ref()
            .map(|n| BlockRef::Footnote(Rc::clone(n)))
    }

    fn as_dyn(&self) -> &dyn BlockParser {
        self
    }
}
