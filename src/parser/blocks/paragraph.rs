//! Paragraphs: the fallback block. Eagerly consumes reference-link
//! definitions through a resumable five-stage state machine, and builds
//! its inline tree when the block closes.

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Item, Link, NodeRef, Paragraph, Pos};
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::inlines::{make_text_objects, process_emphasises, tokenize, InlineCtx};
use crate::parser::ParseEnv;
use crate::stream::{ParagraphStream, TextStream};
use crate::strings::{
    case_folded_upper, indent_from_column, is_empty_line, is_space, read_link_destination,
    read_link_title, remove_backslashes, replace_entities, simplified, skip_spaces,
    ReverseSolidus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RefLinkStage {
    S0,
    S1,
    S2,
    S3,
    S4,
    Sf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefLinkState {
    Wrong,
    Continue,
    Finished,
}

pub struct ParagraphParser {
    paragraph: RefCell<Option<NodeRef<Paragraph>>>,
    finished: Cell<bool>,
    start_line: Cell<i64>,

    reference: RefCell<Option<NodeRef<Link>>>,
    ref_link_label: RefCell<String>,
    was_space: Cell<bool>,
    ref_link_stage: Cell<RefLinkStage>,
    ref_link_text_pos: Cell<Pos>,
    ref_link_url_pos: Cell<Pos>,
    ref_link_title_pos: Cell<Pos>,
    ref_link_title_start_char: RefCell<Option<char>>,
    ref_link_start_parenthesis_count: Cell<i32>,
    ref_link_title_start_pos: Cell<i64>,
}

impl Default for ParagraphParser {
    fn default() -> Self {
        ParagraphParser {
            paragraph: RefCell::new(None),
            finished: Cell::new(false),
            start_line: Cell::new(-1),
            reference: RefCell::new(None),
            ref_link_label: RefCell::new(String::new()),
            was_space: Cell::new(false),
            ref_link_stage: Cell::new(RefLinkStage::S0),
            ref_link_text_pos: Cell::new(Pos::null()),
            ref_link_url_pos: Cell::new(Pos::null()),
            ref_link_title_pos: Cell::new(Pos::null()),
            ref_link_title_start_char: RefCell::new(None),
            ref_link_start_parenthesis_count: Cell::new(0),
            ref_link_title_start_pos: Cell::new(-1),
        }
    }
}

fn is_ref_link_start(line: &mut Line, tree: &ContextTree, ctx: CtxId) -> bool {
    line.column() < indent_from_column(tree.indent_column(ctx)) + 4 && line.current_char() == '['
}

impl ParagraphParser {
    pub fn new() -> Self {
        ParagraphParser::default()
    }

    fn clear_ref_link(&self) {
        *self.reference.borrow_mut() = None;
        self.ref_link_label.borrow_mut().clear();
        self.was_space.set(false);
        self.ref_link_stage.set(RefLinkStage::S0);
        self.ref_link_text_pos.set(Pos::null());
        self.ref_link_url_pos.set(Pos::null());
        self.ref_link_title_pos.set(Pos::null());
        *self.ref_link_title_start_char.borrow_mut() = None;
        self.ref_link_start_parenthesis_count.set(0);
        self.ref_link_title_start_pos.set(-1);
    }

    /// Record the pending definition into the document's reference-link
    /// map; the first definition of a label wins.
    fn insert_ref_link(&self, env: &ParseEnv, p_start_line_number: i64) -> i64 {
        let url_pos = self.ref_link_url_pos.get();
        let title_pos = self.ref_link_title_pos.get();

        if url_pos.end_line == title_pos.start_line && title_pos.end_line == -1 {
            return -1;
        }

        self.start_line.set(p_start_line_number);

        let reference = match self.reference.borrow().clone() {
            Some(r) => r,
            None => return -1,
        };

        {
            let mut r = reference.borrow_mut();
            r.text = self.ref_link_label.borrow().clone();
            r.text_pos = self.ref_link_text_pos.get();

            if title_pos.end_line != -1 {
                r.pos.end_col = title_pos.end_col;
                r.pos.end_line = title_pos.end_line;
            } else {
                self.start_line.set(url_pos.end_line + 1);
            }
        }

        let label = self.ref_link_label.borrow().clone();

        {
            let mut doc = env.doc.borrow_mut();
            doc.labeled_links.entry(label).or_insert_with(|| Rc::clone(&reference));
        }

        let last_line = reference.borrow().pos.end_line;

        self.clear_ref_link();

        last_line
    }

    fn check_for_reference_link(
        &self,
        line: &mut Line,
        tree: &ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) -> RefLinkState {
        if tree.first_line_number(ctx) != -1 {
            return RefLinkState::Wrong;
        }

        let st = line.current_state();

        let mut make_return_wrong_on_fail = false;

        if self.ref_link_stage.get() == RefLinkStage::S4 {
            let tmp = line.current_state();

            skip_spaces(line);

            if is_ref_link_start(line, tree, ctx) {
                self.insert_ref_link(env, line.line_number());
            } else {
                make_return_wrong_on_fail = true;
            }

            line.restore_state(&tmp);
        }

        if self.reference.borrow().is_none() {
            *self.reference.borrow_mut() = Some(node(Link::default()));
        }

        let return_wrong = |line: &mut Line| {
            line.restore_state(&st);
            self.clear_ref_link();
            RefLinkState::Wrong
        };

        let mut rs = ReverseSolidus::new();

        while line.position() < line.length() {
            if !rs.process(line.current_char()) {
                let mut do_break = false;

                match self.ref_link_stage.get() {
                    // [
                    RefLinkStage::S0 => {
                        skip_spaces(line);

                        if is_ref_link_start(line, tree, ctx) {
                            if let Some(r) = self.reference.borrow().clone() {
                                let mut r = r.borrow_mut();
                                r.pos.start_col = line.position();
                                r.pos.start_line = line.line_number();
                            }

                            line.next_char();
                            rs.next();
                            self.ref_link_stage.set(RefLinkStage::S1);
                        } else {
                            return return_wrong(line);
                        }
                    }

                    // label
                    RefLinkStage::S1 => {
                        let mut label = String::new();

                        if line.current_char() == ']' && !rs.is_prev_reverse_solidus() {
                            self.ref_link_stage.set(RefLinkStage::S2);
                            continue;
                        }

                        if line.position() < line.length() {
                            let mut pos = self.ref_link_text_pos.get();
                            pos.start_col = line.position();
                            pos.start_line = line.line_number();
                            self.ref_link_text_pos.set(pos);
                        }

                        skip_spaces(line);

                        while line.position() < line.length() {
                            if line.current_char() == '[' && !rs.is_prev_reverse_solidus() {
                                return return_wrong(line);
                            }

                            if self.ref_link_text_pos.get().start_col == -1 {
                                let mut pos = self.ref_link_text_pos.get();
                                pos.start_col = line.position();
                                pos.start_line = line.line_number();
                                self.ref_link_text_pos.set(pos);
                            }

                            if line.current_char() == ']' && !rs.is_prev_reverse_solidus() {
                                if !simplified(&label).is_empty() {
                                    self.ref_link_stage.set(RefLinkStage::S2);
                                    break;
                                } else {
                                    return return_wrong(line);
                                }
                            }

                            label.push(line.current_char());

                            let mut pos = self.ref_link_text_pos.get();
                            pos.end_col = line.position();
                            pos.end_line = line.line_number();
                            self.ref_link_text_pos.set(pos);

                            line.next_char();
                            rs.next();
                            rs.process(line.current_char());
                        }

                        if !label.is_empty() {
                            let mut l = self.ref_link_label.borrow_mut();

                            if !l.is_empty() {
                                l.push(' ');
                            }

                            l.push_str(&simplified(&label));
                        }
                    }

                    // ]:
                    RefLinkStage::S2 => {
                        if line.current_char() == ']' && line.position() < line.length() {
                            line.next_char();
                            rs.next();

                            let len = self.ref_link_label.borrow().chars().count();

                            if line.current_char() == ':'
                                && !rs.is_prev_reverse_solidus()
                                && len > 0
                                && len < 1000
                            {
                                let key = {
                                    let l = self.ref_link_label.borrow();
                                    format!(
                                        "#{}/{}",
                                        case_folded_upper(&l),
                                        crate::strings::anchor_path(&env.path, &env.file_name)
                                    )
                                };
                                *self.ref_link_label.borrow_mut() = key;

                                line.next_char();
                                rs.next();
                                self.ref_link_stage.set(RefLinkStage::S3);
                            } else {
                                return return_wrong(line);
                            }
                        } else {
                            return return_wrong(line);
                        }
                    }

                    // url
                    RefLinkStage::S3 => {
                        skip_spaces(line);

                        let mut url_pos = self.ref_link_url_pos.get();
                        url_pos.start_col = line.position();
                        url_pos.start_line = line.line_number();
                        self.ref_link_url_pos.set(url_pos);

                        let start_url_pos = line.position();

                        if line.position() == line.length() {
                            return RefLinkState::Continue;
                        }

                        if !read_link_destination(line).is_empty() {
                            let end_url_pos = line.position() - 1;

                            let mut url =
                                line.sliced_copy(start_url_pos, end_url_pos - start_url_pos + 1);

                            let mut url_pos = self.ref_link_url_pos.get();
                            url_pos.end_col = end_url_pos;
                            url_pos.end_line = line.line_number();
                            self.ref_link_url_pos.set(url_pos);

                            replace_entities(&mut url);
                            remove_backslashes(&mut url);

                            if url.starts_with('<') {
                                url.remove(0);
                            }

                            if url.ends_with('>') {
                                url.pop();
                            }

                            if !url.is_empty() {
                                if Path::new(&url).exists() {
                                    if let Ok(abs) = std::fs::canonicalize(&url) {
                                        url = abs.to_string_lossy().into_owned();
                                    }
                                } else if !env.path.is_empty() {
                                    let joined = format!("{}/{}", env.path, url);
                                    if Path::new(&joined).exists() {
                                        if let Ok(abs) = std::fs::canonicalize(&joined) {
                                            url = abs.to_string_lossy().into_owned();
                                        }
                                    }
                                }
                            }

                            if let Some(r) = self.reference.borrow().clone() {
                                let mut r = r.borrow_mut();
                                r.url = url;
                                r.url_pos = self.ref_link_url_pos.get();
                                r.pos.end_col = self.ref_link_url_pos.get().end_col;
                                r.pos.end_line = self.ref_link_url_pos.get().end_line;
                            }

                            self.ref_link_stage.set(RefLinkStage::S4);
                            self.was_space.set(
                                is_space(line.current_char())
                                    || line.position() == line.length(),
                            );

                            if line.position() == line.length() {
                                self.start_line.set(line.line_number() + 1);
                            }
                        } else {
                            return return_wrong(line);
                        }
                    }

                    // title
                    RefLinkStage::S4 => {
                        skip_spaces(line);

                        if line.position() == line.length() {
                            if self.ref_link_url_pos.get().start_line == line.line_number() {
                                return RefLinkState::Continue;
                            } else {
                                return return_wrong(line);
                            }
                        }

                        if !self.was_space.get() {
                            return return_wrong(line);
                        }

                        let title_start_pos = line.position();

                        let mut end_started = false;
                        let mut start_char = *self.ref_link_title_start_char.borrow();
                        let mut paren_count = self.ref_link_start_parenthesis_count.get();
                        let mut start_pos = self.ref_link_title_start_pos.get();

                        read_link_title(
                            line,
                            &mut start_char,
                            &mut paren_count,
                            &mut start_pos,
                            &mut end_started,
                        );

                        *self.ref_link_title_start_char.borrow_mut() = start_char;
                        self.ref_link_start_parenthesis_count.set(paren_count);
                        self.ref_link_title_start_pos.set(start_pos);

                        if self.ref_link_title_pos.get().start_line == -1 && start_char.is_some() {
                            let mut pos = self.ref_link_title_pos.get();
                            pos.start_col = title_start_pos;
                            pos.start_line = line.line_number();
                            self.ref_link_title_pos.set(pos);
                        }

                        if end_started
                            && paren_count != 0
                            && line.line_number() == self.ref_link_url_pos.get().end_line
                        {
                            return return_wrong(line);
                        }

                        if paren_count == 0 {
                            if start_char.is_none()
                                && line.line_number() == self.ref_link_url_pos.get().end_line
                                && line.position() < line.length()
                            {
                                return return_wrong(line);
                            }

                            if start_char.is_some() {
                                let mut text_pos = self.ref_link_text_pos.get();
                                text_pos.start_col = start_pos;
                                self.ref_link_text_pos.set(text_pos);

                                let mut pos = self.ref_link_title_pos.get();
                                pos.end_col = line.position() - 1;
                                pos.end_line = line.line_number();
                                self.ref_link_title_pos.set(pos);
                            }

                            self.ref_link_stage.set(RefLinkStage::Sf);

                            if self.ref_link_title_pos.get().start_col != -1 {
                                make_return_wrong_on_fail = false;

                                skip_spaces(line);

                                if line.position() != line.length() {
                                    if self.ref_link_url_pos.get().start_line
                                        == self.ref_link_title_pos.get().start_line
                                    {
                                        return return_wrong(line);
                                    } else {
                                        self.ref_link_title_pos.set(Pos::null());
                                    }
                                } else {
                                    self.start_line.set(line.line_number() + 1);
                                }
                            }
                        }
                    }

                    RefLinkStage::Sf => {
                        if self.ref_link_title_pos.get().start_col == -1 {
                            line.restore_state(&st);
                            do_break = true;
                        }
                    }
                }

                if do_break {
                    break;
                }
            } else {
                rs.next();
                line.next_char();
            }
        }

        match self.ref_link_stage.get() {
            RefLinkStage::Sf => {
                self.insert_ref_link(env, line.line_number() + 1);

                if make_return_wrong_on_fail {
                    RefLinkState::Wrong
                } else {
                    RefLinkState::Finished
                }
            }
            _ => RefLinkState::Continue,
        }
    }
}

impl BlockParser for ParagraphParser {
    fn kind(&self) -> BlockKind {
        BlockKind::Paragraph
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

        if !is_empty_line(line) {
            if !dry_run {
                tree.append_line_info(ctx, line.line_number(), line.current_state());
                self.start_line.set(line.line_number());

                if self.check_for_reference_link(line, tree, ctx, env) == RefLinkState::Wrong {
                    tree.set_first_line_number(ctx, line.line_number());
                    line.skip();
                }

                tree.set_last_line_number(ctx, line.line_number());
            } else {
                line.restore_saved_state();
            }

            return BlockState::Continue;
        }

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
        if is_empty_line(line) {
            if self.reference.borrow().is_some()
                && self.ref_link_stage.get() >= RefLinkStage::S4
            {
                let last_ref_line = self.insert_ref_link(env, line.line_number() + 1);

                if tree.first_line_number(ctx) == -1 && last_ref_line < line.line_number() - 1 {
                    tree.set_first_line_number(ctx, self.start_line.get());
                }
            } else if self.start_line.get() < line.line_number()
                && tree.first_line_number(ctx) == -1
            {
                tree.set_first_line_number(ctx, self.start_line.get());
            }

            BlockState::Stop
        } else {
            let block = env
                .parser
                .check_block_excluding(line, stream, tree, ctx, env, self.kind());

            let breaks = block
                .map(|b| b.may_break_paragraph(line, stream, tree, ctx, env))
                .unwrap_or(false);

            if breaks && !tree.is_lazy_line(ctx, line.line_number()) {
                if line.line_number() != self.start_line.get()
                    && tree.first_line_number(ctx) == -1
                {
                    tree.set_first_line_number(ctx, self.start_line.get());
                }

                BlockState::Stop
            } else {
                tree.append_line_info(ctx, line.line_number(), line.current_state());

                if self.check_for_reference_link(line, tree, ctx, env) == RefLinkState::Wrong {
                    if tree.first_line_number(ctx) == -1 {
                        tree.set_first_line_number(ctx, self.start_line.get());
                    }

                    line.skip();
                }

                tree.set_last_line_number(ctx, line.line_number());

                BlockState::Continue
            }
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
        if !self.finished.get() {
            if tree.start_pos(ctx, line.line_number()).pos == -1
                && line.line_number() >= tree.first_line_number(ctx)
            {
                if tree.first_line_number(ctx) != -1 {
                    let mst = stream.current_state();

                    let mut ictx = InlineCtx::default();

                    let mut cur = stream.move_to(tree.first_line_number(ctx));
                    let st = tree.start_pos(ctx, cur.line_number());
                    cur.restore_state(&st);

                    let paragraph = node(Paragraph {
                        pos: Pos::new(cur.position(), cur.line_number(), -1, -1),
                        ..Paragraph::default()
                    });

                    if let Some(parent) = parent {
                        parent.append_item(Item::Paragraph(paragraph.clone()));
                    }

                    *self.paragraph.borrow_mut() = Some(paragraph.clone());

                    let mut lines = FxHashMap::default();
                    let start_line_number = cur.line_number();
                    let mut end_line_number = start_line_number;

                    while cur.line_number() < line.line_number() {
                        {
                            let mut p = paragraph.borrow_mut();
                            p.pos.end_col = cur.length() - 1;
                            p.pos.end_line = cur.line_number();
                        }

                        end_line_number = cur.line_number();
                        lines.insert(cur.line_number(), cur.clone());

                        cur = stream.read_line();
                        let st = tree.start_pos(ctx, cur.line_number());
                        cur.restore_state(&st);
                    }

                    stream.restore_state(&mst);

                    env.parser.push_state_of_inliners();

                    let mut p_stream =
                        ParagraphStream::new(lines, start_line_number, end_line_number);
                    let pst = p_stream.current_state();

                    tokenize(&mut p_stream, &mut ictx, env, Pos::null(), false);

                    p_stream.restore_state(&pst);

                    env.parser.pop_state_of_inliners();

                    process_emphasises(&mut ictx);
                    make_text_objects(
                        &mut ictx,
                        &mut p_stream,
                        &BlockRef::Paragraph(paragraph),
                        &Pos::null(),
                    );
                }

                self.finished.set(true);

                BlockState::Stop
            } else {
                line.skip();

                BlockState::Continue
            }
        } else {
            BlockState::None
        }
    }

    fn finish(
        &self,
        line: &mut Line,
        stream: &mut TextStream,
        parent: Option<&BlockRef>,
        tree: &mut ContextTree,
        ctx: CtxId,
        env: &ParseEnv,
    ) {
        if self.reference.borrow().is_some() && self.ref_link_stage.get() >= RefLinkStage::S4 {
            self.insert_ref_link(env, -1);
        }

        if parent.is_some() {
            self.process(line, stream, parent, tree, ctx, env);
        }
    }

    fn reset(&self, _tree: &mut ContextTree, _ctx: CtxId) {
        self.reset_on_all_contexts();
    }

    fn reset_on_all_contexts(&self) {
        *self.paragraph.borrow_mut() = None;
        self.finished.set(false);
        self.clear_ref_link();
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
