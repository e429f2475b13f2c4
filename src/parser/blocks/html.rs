//! HTML blocks, classified by the seven CommonMark opening-tag rules.
//! Rule 7 does not interrupt an open paragraph.

use std::cell::{Cell, RefCell};

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Item, NodeRef, Pos, RawHtml};
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{html_block_closed, html_tag_rule, is_empty_line, simplified, skip_spaces};

#[derive(Default)]
pub struct HtmlParser {
    rule: Cell<i32>,
    html: RefCell<Option<NodeRef<RawHtml>>>,
}

impl HtmlParser {
    pub fn new() -> Self {
        let p = HtmlParser::default();
        p.rule.set(-1);
        p
    }
}

impl BlockParser for HtmlParser {
    fn kind(&self) -> BlockKind {
        BlockKind::Html
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
            let rule = html_tag_rule(line);
            self.rule.set(rule);

            if rule == 7 {
                let under_paragraph = tree
                    .parent(ctx)
                    .and_then(|p| tree.back_child(p))
                    .and_then(|c| tree.block(c))
                    .map(|b| b.kind() == BlockKind::Paragraph)
                    .unwrap_or(false);

                if under_paragraph {
                    line.restore_saved_state();

                    return BlockState::None;
                }
            }

            if rule != -1 {
                let closed = html_block_closed(line, rule, true);

                line.next_char();

                if !(rule == 7 && !is_empty_line(line)) {
                    if dry_run {
                        line.restore_saved_state();
                    } else {
                        tree.set_not_finished(ctx, true);

                        line.skip();
                    }

                    return if closed {
                        BlockState::Stop
                    } else {
                        BlockState::Continue
                    };
                }
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

        if html_block_closed(line, self.rule.get(), false) {
            line.skip();

            tree.set_not_finished(ctx, false);

            BlockState::Stop
        } else {
            line.skip();

            BlockState::Continue
        }
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
        let existing = self.html.borrow().clone();

        match existing {
            None => {
                if is_empty_line(line) {
                    line.skip();

                    return BlockState::Continue;
                }

                let html = node(RawHtml {
                    pos: Pos::new(
                        line.position(),
                        line.line_number(),
                        line.length() - 1,
                        line.line_number(),
                    ),
                    text: line.sliced_copy_to_end(line.position()),
                    ..RawHtml::default()
                });

                skip_spaces(line);

                let rule = html_tag_rule(line);
                self.rule.set(rule);

                let closed = html_block_closed(line, rule, true);

                if let Some(parent) = parent {
                    parent.append_item(Item::RawHtml(html.clone()));
                }

                *self.html.borrow_mut() = Some(html);

                tree.set_not_finished(ctx, true);

                if closed {
                    self.reset(tree, ctx);

                    line.skip();

                    return BlockState::Stop;
                }
            }
            Some(html) => {
                let data = line.sliced_copy_to_end(line.position());
                let rule = self.rule.get();

                if rule < 6 || !simplified(&data).is_empty() {
                    let mut h = html.borrow_mut();
                    h.pos.end_col = if line.length() != 0 { line.length() - 1 } else { 0 };
                    h.pos.end_line = line.line_number();
                    h.text.push('\n');
                    h.text.push_str(&data);
                }

                if html_block_closed(line, rule, false) {
                    self.reset(tree, ctx);

                    line.skip();

                    return BlockState::Stop;
                }
            }
        }

        line.skip();

        BlockState::Continue
    }

    fn reset(&self, tree: &mut ContextTree, ctx: CtxId) {
        tree.set_not_finished(ctx, false);

        self.reset_on_all_contexts();
    }

    fn reset_on_all_contexts(&self) {
        self.rule.set(-1);
        *self.html.borrow_mut() = None;
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
