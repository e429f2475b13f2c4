//! Lists and list items: bullet and ordered markers, content-indent
//! computation, marker changes forcing new lists, task-list checkboxes.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{
    node, BlockRef, Item, List, ListItem, ListType, NodeRef, OrderedListPreState, Pos,
};
use crate::parser::blocks::setext_heading::is_setext;
use crate::parser::blocks::{
    is_lazy_continuation_line, process_children, BlockKind, BlockParser,
};
use crate::parser::ParseEnv;
use crate::stream::TextStream;
use crate::strings::{
    indent_from_column, is_empty_line, is_horizontal_line, skip_if, skip_spaces,
};

fn is_ordered_list(
    line: &mut Line,
    num: &mut i64,
    len: &mut i64,
    delim: &mut char,
) -> bool {
    let dp = line.position();

    skip_if(line, |ch| ch.is_ascii_digit());

    if dp != line.position() && line.position() < line.length() {
        let digits = line.sliced_copy(dp, line.position() - dp);

        if digits.len() > 9 {
            return false;
        }

        *num = digits.parse().unwrap_or(0);
        *len = line.position() - dp;

        if line.current_char() == '.' || line.current_char() == ')' {
            *delim = line.current_char();

            return true;
        }
    }

    false
}

fn is_list(
    line: &mut Line,
    tree: &ContextTree,
    last_child: Option<CtxId>,
    num: &mut i64,
    len: &mut i64,
    delim: &mut char,
) -> bool {
    let st = line.current_state();

    let res = (|line: &mut Line| {
        let c = line.current_char();

        if c == '-' || c == '+' || c == '*' {
            *delim = c;

            if c == '-' {
                if let Some(last) = last_child {
                    let is_setext_block = tree
                        .block(last)
                        .map(|b| b.kind() == BlockKind::SetextHeading)
                        .unwrap_or(false);

                    if is_setext_block || is_setext(line, tree, last) {
                        return false;
                    }
                }
            }

            line.next_char();

            line.current_char() == ' ' || line.position() == line.length()
        } else {
            let ordered = is_ordered_list(line, num, len, delim);

            line.next_char();

            ordered && (line.current_char() == ' ' || line.position() == line.length())
        }
    })(line);

    line.restore_state(&st);

    res
}

fn skip_list(line: &mut Line) {
    let c = line.current_char();

    if c == '-' || c == '+' || c == '*' {
        line.next_char();
    } else {
        let (mut n, mut l, mut d) = (0, 0, '\0');
        is_ordered_list(line, &mut n, &mut l, &mut d);
        line.next_char();
    }
}

fn is_formed_list(line: &mut Line, last_item_is_empty: &mut bool, space: &mut bool) -> bool {
    *last_item_is_empty = is_empty_line(line);
    *space = line.current_char() == ' ';

    *space || *last_item_is_empty
}

struct ListProcessState {
    state: BlockState,
    item: Option<NodeRef<ListItem>>,
    make_new_list: bool,
}

impl Default for ListProcessState {
    fn default() -> Self {
        ListProcessState {
            state: BlockState::None,
            item: None,
            make_new_list: false,
        }
    }
}

#[derive(Default)]
pub struct ListParser {
    list: RefCell<Option<NodeRef<List>>>,
    last_list_item: RefCell<Option<NodeRef<ListItem>>>,
    last_item_is_empty: Cell<bool>,
    last_block_state: Cell<Option<BlockState>>,
}

fn apply_last_position(tree: &ContextTree, ctx: CtxId, last_pos: i64, last_line: i64) {
    for l in tree.lists(ctx) {
        let mut list = l.borrow_mut();
        list.pos.end_col = last_pos;
        list.pos.end_line = last_line;

        if let Some(item) = list.items.last() {
            item.set_end(last_pos, last_line);
        }
    }
}

impl ListParser {
    pub fn new() -> Self {
        ListParser::default()
    }

    fn finish_first_child(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
        make_list_item: bool,
    ) {
        if self.last_block_state.get() == Some(BlockState::Continue) && make_list_item {
            if let Some(front) = tree.front_child(ctx) {
                if let Some(block) = tree.block(front) {
                    if tree.first_line_number(front) < line.line_number() {
                        let parent = self
                            .last_list_item
                            .borrow()
                            .as_ref()
                            .map(|i| BlockRef::ListItem(Rc::clone(i)));

                        block.finish(line, stream, parent.as_ref(), tree, front, env);
                        block.reset(tree, front);
                        tree.dequeue_child(ctx);

                        self.last_block_state.set(None);
                    }
                }
            }
        }
    }

    fn process_list(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
        make_list_item: bool,
    ) -> ListProcessState {
        let mut item: Option<NodeRef<ListItem>> = None;

        line.save_state();

        let lazy = if !make_list_item {
            is_lazy_continuation_line(line, stream, tree, ctx, env, true)
        } else {
            tree.is_lazy_line(ctx, line.line_number())
        };

        skip_spaces(line);

        let spaces_count = line.column();
        let empty_line = is_empty_line(line);
        let start_pos = line.position();
        let mut num: i64 = -1;
        let mut len: i64 = -1;
        let mut delim = '\0';

        let child_ctx = if make_list_item {
            tree.front_child(ctx)
        } else {
            tree.back_child(ctx)
        };

        let list = is_list(line, tree, child_ctx, &mut num, &mut len, &mut delim);
        let hr = is_horizontal_line(line);

        if self.last_item_is_empty.get() && !empty_line && !list {
            if line.column() < tree.first_child_indent(ctx) + 1 {
                return ListProcessState {
                    state: BlockState::Stop,
                    item,
                    make_new_list: false,
                };
            } else {
                self.last_item_is_empty.set(false);
            }
        } else if self.last_item_is_empty.get() && empty_line {
            let last = tree.last_child_indent(ctx);
            tree.clear_child_indents(ctx, last, false);

            self.last_item_is_empty.set(false);
        }

        let mut formed_list_item = false;

        let not_finished_discardable = |tree: &ContextTree, c: CtxId| {
            tree.is_not_finished(c)
                && tree
                    .block(c)
                    .map(|b| b.is_not_finished_discardable())
                    .unwrap_or(false)
        };

        if (list && line.column() >= tree.indent_column(ctx))
            || lazy
            || (tree.has_child_indents(ctx) && line.column() >= tree.first_child_indent(ctx))
        {
            if let Some(child) = child_ctx {
                if tree.is_not_finished(child)
                    && (spaces_count > tree.last_child_indent(ctx) || empty_line)
                {
                    return ListProcessState {
                        state: BlockState::Continue,
                        item,
                        make_new_list: false,
                    };
                } else if not_finished_discardable(tree, child) {
                    tree.set_discard_forced(child, true);
                    tree.set_not_finished(child, false);

                    return ListProcessState {
                        state: BlockState::Continue,
                        item,
                        make_new_list: false,
                    };
                }
            }

            if lazy {
                tree.append_lazy_info(ctx, line.line_number());

                return ListProcessState {
                    state: BlockState::Continue,
                    item,
                    make_new_list: false,
                };
            }

            if list && !hr {
                if spaces_count < tree.last_child_indent(ctx) + 4
                    && (spaces_count > tree.first_child_indent(ctx)
                        || spaces_count < indent_from_column(tree.indent_column(ctx)) + 4)
                {
                    skip_list(line);

                    let mut space = false;
                    let mut last_empty = self.last_item_is_empty.get();
                    let formed = is_formed_list(line, &mut last_empty, &mut space);
                    self.last_item_is_empty.set(last_empty);

                    if formed {
                        tree.set_first_line_number(ctx, line.line_number());
                        formed_list_item = true;

                        self.finish_first_child(line, stream, tree, ctx, env, make_list_item);

                        let c = if line.position() < line.length() {
                            line.column()
                        } else {
                            line.column() - 1
                        };
                        let st_sp = line.current_state();

                        skip_spaces(line);

                        let base = if line.column() - c > 4 || self.last_item_is_empty.get() {
                            c
                        } else {
                            line.column() - 1
                        };
                        let column = base + (if space { 0 } else { 1 });

                        if column == c {
                            line.restore_state(&st_sp);
                            line.next_char();
                        }

                        if make_list_item {
                            let li = node(ListItem {
                                pos: Pos::new(
                                    start_pos,
                                    line.line_number(),
                                    line.position() - 1,
                                    line.line_number(),
                                ),
                                ..ListItem::default()
                            });

                            {
                                let mut l = li.borrow_mut();

                                if num != -1 {
                                    l.list_type = ListType::Ordered;
                                    l.start_number = num;
                                    l.delim = Pos::new(
                                        start_pos,
                                        line.line_number(),
                                        start_pos + len,
                                        line.line_number(),
                                    );
                                    l.ordered_pre_state = if num == 1 {
                                        OrderedListPreState::Start
                                    } else {
                                        OrderedListPreState::Continue
                                    };
                                } else {
                                    l.list_type = ListType::Unordered;
                                    l.delim = Pos::new(
                                        start_pos,
                                        line.line_number(),
                                        start_pos,
                                        line.line_number(),
                                    );
                                }
                            }

                            item = Some(li);
                        } else if let Some(back) = tree.back_child(ctx) {
                            if tree.block(back).is_some() && !tree.is_discard_forced(back) {
                                tree.enqueue_new_child(ctx);
                            }
                        }

                        let was = tree.list_delim(ctx, spaces_count);

                        tree.clear_child_indents(ctx, spaces_count, false);

                        if was != delim {
                            if !tree.has_child_indents(ctx) {
                                line.restore_saved_state();

                                return ListProcessState {
                                    state: BlockState::Stop,
                                    item,
                                    make_new_list: false,
                                };
                            } else {
                                tree.append_child_indent(
                                    ctx,
                                    indent_from_column(column),
                                    delim,
                                );

                                return ListProcessState {
                                    state: BlockState::Continue,
                                    item,
                                    make_new_list: true,
                                };
                            }
                        }

                        tree.append_child_indent(ctx, indent_from_column(column), delim);
                    }
                }
            }

            if !formed_list_item && !empty_line {
                let indents_count = tree.indents_nesting_level(ctx);

                tree.clear_child_indents(ctx, spaces_count, true);

                if indents_count != tree.indents_nesting_level(ctx) {
                    self.finish_first_child(line, stream, tree, ctx, env, make_list_item);
                }

                if !make_list_item {
                    if let Some(back) = tree.back_child(ctx) {
                        tree.apply_parent_context(back, ctx);
                    }
                } else {
                    tree.update_parent_context_for_all_children(ctx);
                }
            }

            if formed_list_item
                || (tree.has_child_indents(ctx) && spaces_count > tree.first_child_indent(ctx))
            {
                return ListProcessState {
                    state: BlockState::Continue,
                    item,
                    make_new_list: false,
                };
            }
        } else if let Some(child) = child_ctx {
            if not_finished_discardable(tree, child) {
                tree.set_discard_forced(child, true);
                tree.set_not_finished(child, false);

                return ListProcessState {
                    state: BlockState::Continue,
                    item,
                    make_new_list: false,
                };
            }
        }

        if empty_line {
            return ListProcessState {
                state: BlockState::Continue,
                item,
                make_new_list: false,
            };
        }

        line.restore_saved_state();

        ListProcessState {
            state: BlockState::Stop,
            item,
            make_new_list: false,
        }
    }
}

impl BlockParser for ListParser {
    fn kind(&self) -> BlockKind {
        BlockKind::List
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
        dry_run: bool,
    ) -> BlockState {
        line.save_state();

        skip_spaces(line);

        if tree.is_in_indent(ctx, line.column(), false) {
            let (mut num, mut len, mut delim) = (-1i64, -1i64, '\0');

            if is_list(line, tree, tree.back_child(ctx), &mut num, &mut len, &mut delim) {
                let mut space = false;

                skip_list(line);

                let mut last_empty = self.last_item_is_empty.get();
                let formed = is_formed_list(line, &mut last_empty, &mut space);

                if !dry_run {
                    self.last_item_is_empty.set(last_empty);
                }

                if formed {
                    // A list item opening inside a list item on one line
                    // ("* * list"): continue on the parent, without a new
                    // child context.
                    let parent_is_self = tree
                        .parent(ctx)
                        .and_then(|p| tree.block(p))
                        .map(|b| b.kind() == BlockKind::List)
                        .unwrap_or(false);

                    if parent_is_self {
                        line.restore_saved_state();

                        let parent = tree.parent(ctx).unwrap();
                        let state = self.continue_check(line, stream, tree, parent, env);

                        return if state != BlockState::Stop {
                            BlockState::ContinueWithoutAppendingChildCtx
                        } else {
                            state
                        };
                    }

                    if !dry_run {
                        tree.set_first_line_number(ctx, line.line_number());
                        tree.set_top_list_delim(ctx, delim);
                    }

                    let c = if line.position() < line.length() {
                        line.column()
                    } else {
                        line.column() - 1
                    };
                    let st_sp = line.current_state();

                    skip_spaces(line);

                    let base = if line.column() - c > 4 || self.last_item_is_empty.get() {
                        c
                    } else {
                        line.column() - 1
                    };
                    let column = base + (if space { 0 } else { 1 });

                    if column == c {
                        line.restore_state(&st_sp);
                        line.next_char();
                    }

                    if !dry_run {
                        tree.append_child_indent(ctx, indent_from_column(column), delim);
                    }

                    if dry_run {
                        line.restore_saved_state();
                    }

                    return BlockState::Continue;
                }
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
        self.process_list(line, stream, tree, ctx, env, false).state
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
        skip_spaces(line);

        if self.list.borrow().is_none() {
            if is_empty_line(line) {
                line.skip();

                return BlockState::Continue;
            }

            let list = node(List {
                pos: Pos::new(line.position(), line.line_number(), -1, -1),
                ..List::default()
            });

            if let Some(parent) = parent {
                parent.append_item(Item::List(list.clone()));
            }

            tree.push_list(ctx, list.clone());

            *self.list.borrow_mut() = Some(list);
        }

        let empty_line = is_empty_line(line);

        let mut state = ListProcessState::default();
        let mut line_state = line.current_state();
        let bullet = line.current_char();
        let mut looped = false;
        let mut column = line.column();
        let mut pos = line.position();

        loop {
            let (mut num, mut len, mut delim) = (-1i64, -1i64, '\0');

            let front = tree.front_child(ctx);

            let front_gate = match front {
                Some(f) if tree.is_not_finished(f) => {
                    line.column() <= tree.indent_column(f) && !empty_line
                }
                _ => true,
            };

            if !(is_list(line, tree, front, &mut num, &mut len, &mut delim)
                && !tree.is_lazy_line(ctx, line.line_number())
                && front_gate
                && column < indent_from_column(tree.last_child_indent(ctx)) + 4
                && pos < line.length())
            {
                break;
            }

            looped = true;
            line.restore_state(&line_state);

            state = self.process_list(line, stream, tree, ctx, env, true);

            if state.state != BlockState::Stop {
                if let Some(item) = &state.item {
                    if tree.indents_nesting_level(ctx) > tree.lists_len(ctx) {
                        let list = node(List {
                            pos: Pos::new(
                                item.borrow().pos.start_col,
                                item.borrow().pos.start_line,
                                -1,
                                -1,
                            ),
                            ..List::default()
                        });

                        if let Some(last) = self.last_list_item.borrow().clone() {
                            last.borrow_mut().items.push(Item::List(list.clone()));
                        }

                        tree.push_list(ctx, list);
                    } else if state.make_new_list {
                        let list = node(List {
                            pos: Pos::new(
                                item.borrow().pos.start_col,
                                item.borrow().pos.start_line,
                                -1,
                                -1,
                            ),
                            ..List::default()
                        });

                        tree.pop_list(ctx);

                        if let Some(outer) = tree.last_list(ctx) {
                            if let Some(Item::ListItem(li)) = outer.borrow().items.last().cloned()
                            {
                                li.borrow_mut().items.push(Item::List(list.clone()));
                            }
                        }

                        tree.push_list(ctx, list);
                    }

                    if let Some(list) = tree.last_list(ctx) {
                        list.borrow_mut().items.push(Item::ListItem(Rc::clone(item)));
                    }
                }

                if let Some(list) = tree.last_list(ctx) {
                    if let Some(Item::ListItem(li)) = list.borrow().items.last().cloned() {
                        *self.last_list_item.borrow_mut() = Some(li);
                    }
                }

                apply_last_position(tree, ctx, line.length() - 1, line.line_number());
            } else {
                break;
            }

            // GFM task list marker right after the bullet.
            let front_is_paragraph = tree
                .front_child(ctx)
                .and_then(|f| tree.block(f).map(|b| (f, b.kind())))
                .filter(|(_, k)| *k == BlockKind::Paragraph)
                .map(|(f, _)| f);

            if let Some(front) = front_is_paragraph {
                if tree.first_line_number(front) == line.line_number() {
                    let st = line.current_state();

                    skip_spaces(line);

                    let mut matched = false;

                    if line.current_char() == '[' {
                        let start_task_delim_pos = line.position();

                        line.next_char();

                        let c = line.current_char();

                        if c == ' ' || c.to_ascii_lowercase() == 'x' {
                            let checked = c.to_ascii_lowercase() == 'x';

                            line.next_char();

                            if line.current_char() == ']' {
                                if let Some(li) = self.last_list_item.borrow().clone() {
                                    let mut l = li.borrow_mut();
                                    l.is_task_list = true;
                                    l.task_delim = Pos::new(
                                        start_task_delim_pos,
                                        line.line_number(),
                                        line.position(),
                                        line.line_number(),
                                    );
                                    l.is_checked = checked;
                                    l.pos.end_col = line.position();
                                }

                                line.next_char();

                                tree.update_start_pos(front, line.line_number(), line.position());

                                matched = true;
                            }
                        }
                    }

                    if !matched {
                        line.restore_state(&st);
                    }
                }
            }

            line_state = line.current_state();
            skip_spaces(line);
            column = line.column();
            pos = line.position();

            let hr = is_horizontal_line(line);

            if hr && bullet != line.current_char() {
                state.state = BlockState::Continue;

                break;
            }
        }

        line.restore_state(&line_state);

        if !looped {
            state = self.process_list(line, stream, tree, ctx, env, true);

            if let Some(list) = tree.last_list(ctx) {
                if let Some(Item::ListItem(li)) = list.borrow().items.last().cloned() {
                    *self.last_list_item.borrow_mut() = Some(li);
                }
            }
        }

        if state.state != BlockState::Stop {
            let parent_item = self
                .last_list_item
                .borrow()
                .as_ref()
                .map(|i| BlockRef::ListItem(Rc::clone(i)));

            let last = process_children(line, stream, parent_item.as_ref(), tree, ctx, env);
            self.last_block_state.set(Some(last));

            if !empty_line {
                apply_last_position(tree, ctx, line.length() - 1, line.line_number());
            } else {
                self.last_block_state.set(None);
            }
        }

        state.state
    }

    fn reset(&self, tree: &mut ContextTree, ctx: CtxId) {
        self.reset_on_all_contexts();

        crate::parser::blocks::reset_children(tree, ctx);

        tree.clear_child_indents_all(ctx);
        tree.clear_lists(ctx);
    }

    fn reset_on_all_contexts(&self) {
        *self.list.borrow_mut() = None;
        *self.last_list_item.borrow_mut() = None;
        self.last_item_is_empty.set(false);
        self.last_block_state.set(None);
    }

    fn may_break_paragraph(
        &self,
        line: &mut Line,
        _stream: &mut TextStream,
        tree: &mut ContextTree,
        ctx: CtxId,
        _env: &ParseEnv,
    ) -> bool {
        let st = line.current_state();

        skip_spaces(line);

        let (mut num, mut len, mut delim) = (-1i64, -1i64, '\0');
        let mut empty_list_item = false;
        let mut space = false;

        let mut ret = line.column() < tree.indent_column(ctx) + 4;
        ret = ret && is_list(line, tree, None, &mut num, &mut len, &mut delim);
        skip_list(line);
        ret = ret && is_formed_list(line, &mut empty_list_item, &mut space) && !empty_list_item;

        if num >= 0 {
            ret = ret && num == 1;
        }

        line.restore_state(&st);

        ret
    }

    fn current_block(&self, _tree: &ContextTree, _ctx: CtxId) -> Option<BlockRef> {
        self.last_list_item
            .borrow()
            .as_ref()
            .map(|i| BlockRef::ListItem(Rc::clone(i)))
    }

    fn as_dyn(&self) -> &dyn BlockParser {
        self
    }
}
