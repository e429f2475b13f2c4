//! Blockquotes: `>` after at most three spaces, with lazy continuation
//! lines and the Discard re-probe for aborted nested blocks.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Blockquote, Item, NodeRef, Pos};
use crate::parser::blocks::{
    is_lazy_continuation_line, process_children, reset_children, BlockKind, BlockParser,
};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{indent_from_column, is_empty_line, is_space, skip_spaces};

#[derive(Default)]
pub struct BlockquoteParser {
    quotes: RefCell<FxHashMap<CtxId, NodeRef<Blockquote>>>,
}

impl BlockquoteParser {
    pub fn new() -> Self {
        BlockquoteParser::default()
    }

    /// Consume the `>` and one optional following space, opening a child
    /// indent at the marker's column.
    fn process_greater_sign(&self, line: &mut Line, tree: &mut ContextTree, ctx: CtxId) {
        let mut column = line.column();

        if is_space(line.next_char()) {
            column += 1;
            line.next_char();
        }

        tree.append_child_indent(ctx, indent_from_column(column), '\0');
    }

    fn is_blockquote(&self, line: &mut Line, tree: &ContextTree, ctx: CtxId) -> bool {
        let st = line.current_state();
        skip_spaces(line);

        let res = tree.is_in_indent(ctx, line.column(), true) && line.current_char() == '>';

        if !res {
            line.restore_state(&st);
        }

        res
    }

    fn is_blockquote_or_lazy_line(&self, line: &mut Line, tree: &ContextTree, ctx: CtxId) -> bool {
        self.is_blockquote(line, tree, ctx) || tree.is_lazy_line(ctx, line.line_number())
    }
}

impl BlockParser for BlockquoteParser {
    fn kind(&self) -> BlockKind {
        BlockKind::Blockquote
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

        if self.is_blockquote(line, tree, ctx) {
            if !dry_run {
                self.process_greater_sign(line, tree, ctx);
            } else {
                line.restore_saved_state();
            }

            BlockState::Continue
        } else {
            line.restore_saved_state();

            BlockState::None
        }
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

        if self.is_blockquote(line, tree, ctx) {
            if line.current_char() == '>' {
                self.process_greater_sign(line, tree, ctx);
            }

            return BlockState::Continue;
        } else if is_lazy_continuation_line(line, stream, tree, ctx, env, false) {
            tree.append_lazy_info(ctx, line.line_number());

            return BlockState::Continue;
        } else {
            let nested = tree.most_nested_child(ctx);

            if tree.is_not_finished(nested) {
                if let Some(block) = tree.block(nested) {
                    if block.is_not_finished_discardable() {
                        tree.set_discard_forced(nested, true);
                        tree.set_not_finished(nested, false);

                        return BlockState::Continue;
                    }
                }
            }
        }

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
        env: &ParseEnv,
    ) -> BlockState {
        let known = self.quotes.borrow().contains_key(&ctx);

        if is_empty_line(line) && !known {
            line.skip();

            return BlockState::Continue;
        }

        line.save_state();

        skip_spaces(line);

        let quote = if !known {
            let quote = node(Blockquote {
                pos: Pos::new(line.position(), line.line_number(), -1, -1),
                ..Blockquote::default()
            });

            if let Some(parent) = parent {
                parent.append_item(Item::Blockquote(quote.clone()));
            }

            self.quotes.borrow_mut().insert(ctx, quote.clone());

            quote
        } else {
            self.quotes.borrow().get(&ctx).unwrap().clone()
        };

        if self.is_blockquote_or_lazy_line(line, tree, ctx) {
            if line.current_char() == '>' {
                quote.borrow_mut().delims.push(Pos::new(
                    line.column(),
                    line.line_number(),
                    line.column(),
                    line.line_number(),
                ));

                self.process_greater_sign(line, tree, ctx);
            }

            let block_ref = BlockRef::Blockquote(Rc::clone(&quote));
            process_children(line, stream, Some(&block_ref), tree, ctx, env);

            let mut q = quote.borrow_mut();
            q.pos.end_col = line.length() - 1;
            q.pos.end_line = line.line_number();

            BlockState::Continue
        } else {
            line.restore_saved_state();

            BlockState::Stop
        }
    }

    fn reset(&self, tree: &mut ContextTree, ctx: CtxId) {
        self.quotes.borrow_mut().remove(&ctx);

        reset_children(tree, ctx);

        tree.clear_child_indents_all(ctx);
    }

    fn reset_on_all_contexts(&self) {
        self.quotes.borrow_mut().clear();
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

    fn current_block(&self, _tree: &ContextTree, ctx: CtxId) -> Option<BlockRef> {
        self.quotes
            .borrow()
            .get(&ctx)
            .map(|q| BlockRef::Blockquote(Rc::clone(q)))
    }

    fn as_dyn(&self) -> &dyn BlockParser {
        self
    }
}
