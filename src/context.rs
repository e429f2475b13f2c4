//! The hierarchical block-parsing context.
//!
//! A [`Context`] represents one level of block nesting during the first
//! parsing pass: which parser owns it, the indent a child line must reach,
//! the list indents opened beneath it, its lazy continuation lines, and the
//! block's start state on every line it covers.
//!
//! Contexts form a tree addressed by copyable [`CtxId`]s into a
//! [`ContextTree`] slab; identity comparisons the engine relies on (the
//! Discard bookkeeping, per-context parser state) are id comparisons.

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::line::LineState;
use crate::nodes::{List, NodeRef};
use crate::parser::blocks::BlockParserRef;
use crate::strings::indent_from_column;

/// Result of probing or continuing a block parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    /// This parser does not handle the line.
    None,
    /// The block is finished with this line.
    Stop,
    /// The parser handles the line and stays active.
    Continue,
    /// The parser handles the line but no child context must be added;
    /// used for list-items opening on the same line as their list.
    ContinueWithoutAppendingChildCtx,
    /// Abort the tentatively opened block: rewind to its first line and
    /// reprobe, skipping this parser.
    Discard,
}

/// Index of a [`Context`] in its [`ContextTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CtxId(usize);

/// One block-nesting level.
pub struct Context {
    parent: Option<CtxId>,
    block: Option<BlockParserRef>,
    children: VecDeque<CtxId>,
    lists: Vec<NodeRef<List>>,
    indent: i64,
    child_indents: Vec<(i64, char)>,
    first_line_number: i64,
    last_line_number: i64,
    lines: FxHashMap<i64, LineState>,
    lazy: FxHashSet<i64>,
    list_delimiter: char,
    not_finished: bool,
    discard_forced: bool,
    dont_consider_indents: bool,
}

impl Context {
    fn new(parent: Option<CtxId>) -> Self {
        Context {
            parent,
            block: None,
            children: VecDeque::new(),
            lists: Vec::new(),
            indent: 0,
            child_indents: Vec::new(),
            first_line_number: -1,
            last_line_number: -1,
            lines: FxHashMap::default(),
            lazy: FxHashSet::default(),
            list_delimiter: '\0',
            not_finished: false,
            discard_forced: false,
            dont_consider_indents: false,
        }
    }
}

/// Slab of [`Context`] nodes. Ids stay valid for the whole parse; dequeued
/// contexts are simply no longer referenced.
#[derive(Default)]
pub struct ContextTree {
    nodes: Vec<Context>,
}

impl ContextTree {
    pub fn new() -> Self {
        ContextTree::default()
    }

    /// Allocate a fresh context.
    pub fn alloc(&mut self, parent: Option<CtxId>) -> CtxId {
        self.nodes.push(Context::new(parent));
        CtxId(self.nodes.len() - 1)
    }

    fn ctx(&self, id: CtxId) -> &Context {
        &self.nodes[id.0]
    }

    fn ctx_mut(&mut self, id: CtxId) -> &mut Context {
        &mut self.nodes[id.0]
    }

    pub fn parent(&self, id: CtxId) -> Option<CtxId> {
        self.ctx(id).parent
    }

    pub fn block(&self, id: CtxId) -> Option<BlockParserRef> {
        self.ctx(id).block.clone()
    }

    pub fn set_block(&mut self, id: CtxId, block: Option<BlockParserRef>) {
        self.ctx_mut(id).block = block;
    }

    pub fn indent_column(&self, id: CtxId) -> i64 {
        let c = self.ctx(id);
        if c.dont_consider_indents {
            0
        } else {
            c.indent
        }
    }

    pub fn set_indent_column(&mut self, id: CtxId, indent: i64) {
        self.ctx_mut(id).indent = indent;
    }

    pub fn has_child_indents(&self, id: CtxId) -> bool {
        !self.ctx(id).child_indents.is_empty()
    }

    pub fn child_indents(&self, id: CtxId) -> Vec<(i64, char)> {
        self.ctx(id).child_indents.clone()
    }

    pub fn set_child_indents(&mut self, id: CtxId, indents: Vec<(i64, char)>) {
        self.ctx_mut(id).child_indents = indents;
    }

    pub fn clear_child_indents_all(&mut self, id: CtxId) {
        self.ctx_mut(id).child_indents.clear();
    }

    pub fn indents_nesting_level(&self, id: CtxId) -> usize {
        self.ctx(id).child_indents.len()
    }

    pub fn first_child_indent(&self, id: CtxId) -> i64 {
        if self.has_child_indents(id) {
            self.ctx(id).child_indents[0].0 + indent_from_column(self.indent_column(id))
        } else {
            self.indent_column(id)
        }
    }

    pub fn last_child_indent(&self, id: CtxId) -> i64 {
        if self.has_child_indents(id) {
            self.ctx(id).child_indents.last().unwrap().0
                + indent_from_column(self.indent_column(id))
        } else {
            self.indent_column(id)
        }
    }

    /// Max available indent, considering children and the parent.
    pub fn max_available_indent(&self, id: CtxId) -> i64 {
        let own = self.last_child_indent(id);
        let parent = self
            .parent(id)
            .map(|p| self.last_child_indent(p))
            .unwrap_or(0);
        own.max(parent)
    }

    /// Record that a list (or similar construct) opened a child indent at
    /// column `i`, produced by marker `d`.
    pub fn append_child_indent(&mut self, id: CtxId, i: i64, d: char) {
        let ci = i - if i != 0 { 1 } else { 0 } - indent_from_column(self.indent_column(id));
        self.ctx_mut(id).child_indents.push((ci, d));
        self.update_parent_context_for_all_children(id);
    }

    /// Remove all child indents at or beyond `sc` spaces; on dedent this
    /// closes the corresponding open lists.
    pub fn clear_child_indents(&mut self, id: CtxId, sc: i64, remove_additional: bool) {
        let base = indent_from_column(self.indent_column(id));
        let mut count: i64 = 0;

        self.ctx_mut(id).child_indents.retain(|v| {
            let will = v.0 + base >= sc;
            if will {
                count += 1;
            }
            !will
        });

        if !remove_additional {
            count -= 1;
        }

        if count > 0 && !self.ctx(id).lists.is_empty() {
            let len = self.ctx(id).lists.len();
            let keep = len.saturating_sub(count as usize);
            self.ctx_mut(id).lists.truncate(keep);
        }
    }

    pub fn lists(&self, id: CtxId) -> Vec<NodeRef<List>> {
        self.ctx(id).lists.clone()
    }

    pub fn lists_len(&self, id: CtxId) -> usize {
        self.ctx(id).lists.len()
    }

    pub fn push_list(&mut self, id: CtxId, list: NodeRef<List>) {
        self.ctx_mut(id).lists.push(list);
    }

    pub fn pop_list(&mut self, id: CtxId) -> Option<NodeRef<List>> {
        self.ctx_mut(id).lists.pop()
    }

    pub fn last_list(&self, id: CtxId) -> Option<NodeRef<List>> {
        self.ctx(id).lists.last().map(Rc::clone)
    }

    pub fn clear_lists(&mut self, id: CtxId) {
        self.ctx_mut(id).lists.clear();
    }

    /// Whether the line was recorded as a lazy continuation here or in any
    /// parent.
    pub fn is_lazy_line(&self, id: CtxId, line_number: i64) -> bool {
        if self.ctx(id).lazy.contains(&line_number) {
            true
        } else if let Some(p) = self.parent(id) {
            self.is_lazy_line(p, line_number)
        } else {
            false
        }
    }

    pub fn append_lazy_info(&mut self, id: CtxId, line_number: i64) {
        self.ctx_mut(id).lazy.insert(line_number);
    }

    /// Seed `child` from its parent: inherit the effective indent and set
    /// the parent pointer.
    pub fn apply_parent_context(&mut self, child: CtxId, parent: CtxId) {
        let indent = self.last_child_indent(parent);
        let c = self.ctx_mut(child);
        c.indent = indent;
        c.parent = Some(parent);
    }

    pub fn update_parent_context_for_all_children(&mut self, id: CtxId) {
        let children: Vec<CtxId> = self.ctx(id).children.iter().copied().collect();
        for ch in children {
            self.apply_parent_context(ch, id);
            self.update_parent_context_for_all_children(ch);
        }
    }

    pub fn line_info(&self, id: CtxId) -> FxHashMap<i64, LineState> {
        self.ctx(id).lines.clone()
    }

    pub fn merge_line_info(&mut self, id: CtxId, other: FxHashMap<i64, LineState>) {
        self.ctx_mut(id).lines.extend(other);
    }

    pub fn append_line_info(&mut self, id: CtxId, line_number: i64, state: LineState) {
        self.ctx_mut(id).lines.insert(line_number, state);
    }

    /// Start state of this block on the given line; `(-1, -1)` when the
    /// block does not cover it.
    pub fn start_pos(&self, id: CtxId, line_number: i64) -> LineState {
        self.ctx(id)
            .lines
            .get(&line_number)
            .copied()
            .unwrap_or(LineState::new(-1, -1))
    }

    pub fn update_start_pos(&mut self, id: CtxId, line_number: i64, pos: i64) {
        if let Some(st) = self.ctx_mut(id).lines.get_mut(&line_number) {
            st.pos = pos;
        }
    }

    pub fn first_line_number(&self, id: CtxId) -> i64 {
        self.ctx(id).first_line_number
    }

    pub fn set_first_line_number(&mut self, id: CtxId, n: i64) {
        self.ctx_mut(id).first_line_number = n;
    }

    pub fn last_line_number(&self, id: CtxId) -> i64 {
        self.ctx(id).last_line_number
    }

    pub fn set_last_line_number(&mut self, id: CtxId, n: i64) {
        self.ctx_mut(id).last_line_number = n;
    }

    /// The closest ancestor whose parent has no active block.
    pub fn top_context(&self, id: CtxId) -> CtxId {
        match self.parent(id) {
            Some(p) if self.ctx(p).block.is_some() => self.top_context(p),
            _ => id,
        }
    }

    /// The deepest descendant with an active block, following last
    /// children.
    pub fn most_nested_child(&self, id: CtxId) -> CtxId {
        let children = &self.ctx(id).children;
        if let Some(&back) = children.back() {
            if self.ctx(back).block.is_some() {
                if let Some(&with_block) = children
                    .iter()
                    .rev()
                    .find(|&&c| self.ctx(c).block.is_some())
                {
                    return self.most_nested_child(with_block);
                }
            }
        }

        id
    }

    /// List-marker character governing the given indent, used to detect
    /// marker changes that must start a new list.
    pub fn list_delim(&self, id: CtxId, indent: i64) -> char {
        let ctx = self.ctx(id);
        let base = indent_from_column(self.indent_column(id));
        let mut idx: i64 = -1;

        for (i, ci) in ctx.child_indents.iter().enumerate() {
            if indent_from_column(ci.0 + base) <= indent {
                idx = i as i64;
            }
        }

        if idx != -1 && idx <= ctx.child_indents.len() as i64 - 2 {
            ctx.child_indents[(idx + 1) as usize].1
        } else if idx == -1 {
            ctx.list_delimiter
        } else {
            '\0'
        }
    }

    pub fn set_top_list_delim(&mut self, id: CtxId, d: char) {
        self.ctx_mut(id).list_delimiter = d;
    }

    pub fn is_not_finished(&self, id: CtxId) -> bool {
        self.ctx(id).not_finished
    }

    pub fn set_not_finished(&mut self, id: CtxId, on: bool) {
        self.ctx_mut(id).not_finished = on;
    }

    pub fn is_discard_forced(&self, id: CtxId) -> bool {
        self.ctx(id).discard_forced
    }

    pub fn set_discard_forced(&mut self, id: CtxId, on: bool) {
        self.ctx_mut(id).discard_forced = on;
    }

    pub fn set_dont_consider_indents(&mut self, id: CtxId, on: bool) {
        self.ctx_mut(id).dont_consider_indents = on;
    }

    pub fn indent_column_for_check(&self, id: CtxId, skip_children: bool) -> i64 {
        let c = self.ctx(id);
        if c.dont_consider_indents {
            0
        } else if skip_children {
            self.indent_column(id)
        } else {
            self.last_child_indent(id)
        }
    }

    /// Whether a block may open at the given column inside this context.
    pub fn is_in_indent(&self, id: CtxId, column: i64, skip_children: bool) -> bool {
        column - self.indent_column_for_check(id, skip_children) < 4
            && (column < indent_from_column(self.indent_column(id)) + 4
                || (self.has_child_indents(id) && column > self.first_child_indent(id)))
    }

    // Children queue.

    pub fn children_len(&self, id: CtxId) -> usize {
        self.ctx(id).children.len()
    }

    pub fn has_children(&self, id: CtxId) -> bool {
        !self.ctx(id).children.is_empty()
    }

    pub fn child_at(&self, id: CtxId, idx: usize) -> CtxId {
        self.ctx(id).children[idx]
    }

    pub fn front_child(&self, id: CtxId) -> Option<CtxId> {
        self.ctx(id).children.front().copied()
    }

    pub fn back_child(&self, id: CtxId) -> Option<CtxId> {
        self.ctx(id).children.back().copied()
    }

    pub fn enqueue_child(&mut self, id: CtxId, child: CtxId) {
        self.ctx_mut(id).children.push_back(child);
    }

    /// Allocate, seed from `id`, and enqueue a new child context.
    pub fn enqueue_new_child(&mut self, id: CtxId) -> CtxId {
        let child = self.alloc(Some(id));
        self.apply_parent_context(child, id);
        self.enqueue_child(id, child);
        child
    }

    pub fn dequeue_child(&mut self, id: CtxId) -> Option<CtxId> {
        self.ctx_mut(id).children.pop_front()
    }

    pub fn pop_back_child(&mut self, id: CtxId) -> Option<CtxId> {
        self.ctx_mut(id).children.pop_back()
    }

    pub fn clear_children(&mut self, id: CtxId) {
        self.ctx_mut(id).children.clear();
    }
}
