//! ATX headings: up to six `#` followed by a space, an optional closing
//! `#` run, and an optional `{#label}` explicit id.

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::context::{BlockState, ContextTree, CtxId};
use crate::line::Line;
use crate::nodes::{node, BlockRef, Heading, Item, NodeRef, Paragraph, Pos};
use crate::parser::blocks::{BlockKind, BlockParser};
use crate::parser::inlines::{make_text_objects, process_emphasises, tokenize, InlineCtx};
use crate::parser::ParseEnv;
use crate::stream::{ParagraphStream, TextStream};
use crate::strings::{anchor_path, is_empty_line, is_space, paragraph_to_label, skip_spaces};

#[derive(Default)]
pub struct AtxHeadingParser;

impl AtxHeadingParser {
    pub fn new() -> Self {
        AtxHeadingParser
    }
}

/// Locate a `{#…}` region inside the heading line.
fn find_header_label(s: &[char]) -> Option<(String, Pos)> {
    let start = s.windows(2).position(|w| w == ['{', '#'])?;
    let p = s[start + 2..].iter().position(|&c| c == '}')? + start + 2;

    let mut pos = Pos::null();
    pos.start_col = start as i64;
    pos.end_col = p as i64;

    Some((s[start..=p].iter().collect(), pos))
}

/// Strip a trailing `# …` run preceded by a space, returning its position.
fn find_and_remove_closing_sequence(s: &mut Vec<char>) -> Pos {
    let mut end: i64 = -1;
    let mut start: i64 = -1;

    let mut i = s.len() as i64 - 1;
    while i >= 0 {
        let c = s[i as usize];

        if !is_space(c) && c != '#' && end == -1 {
            return Pos::null();
        }

        if c == '#' {
            if end == -1 {
                end = i;
            }

            if i - 1 >= 0 {
                if is_space(s[(i - 1) as usize]) {
                    start = i;
                    break;
                } else if s[(i - 1) as usize] != '#' {
                    return Pos::null();
                }
            } else {
                start = 0;
            }
        }

        i -= 1;
    }

    let mut ret = Pos::null();

    if start != -1 && end != -1 {
        ret.start_col = start;
        ret.end_col = end;

        s.drain(start as usize..=end as usize);
    }

    ret
}

/// Generate the heading's slug label from its text and register it (and
/// the lowercase variant, when different) on the document.
pub(crate) fn process_label(
    paragraph: &NodeRef<Paragraph>,
    path: &str,
    file_name: &str,
    heading: &NodeRef<Heading>,
    env: &ParseEnv,
) {
    let label = format!("#{}", paragraph_to_label(paragraph));
    let label_path = format!("/{}", anchor_path(path, file_name));

    let full = format!("{}{}", label, label_path);

    {
        let mut h = heading.borrow_mut();
        h.label = Some(full.clone());
        h.label_variants.push(full.clone());
    }

    env.doc
        .borrow_mut()
        .labeled_headings
        .insert(full, Rc::clone(heading));

    let lower = label.to_lowercase();
    if label != lower {
        let full_lower = format!("{}{}", lower, label_path);

        env.doc
            .borrow_mut()
            .labeled_headings
            .insert(full_lower.clone(), Rc::clone(heading));
        heading.borrow_mut().label_variants.push(full_lower);
    }
}

impl BlockParser for AtxHeadingParser {
    fn kind(&self) -> BlockKind {
        BlockKind::AtxHeading
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
            let mut count = 0;

            while line.current_char() == '#' {
                count += 1;
                line.next_char();
            }

            if count > 0 && count <= 6 && (is_space(line.current_char()) || is_empty_line(line)) {
                if dry_run {
                    line.restore_saved_state();
                } else {
                    line.skip();
                }

                return BlockState::Stop;
            }
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
        env: &ParseEnv,
    ) -> BlockState {
        if is_empty_line(line) {
            line.skip();

            return BlockState::Continue;
        }

        skip_spaces(line);

        let heading = node(Heading {
            pos: Pos::new(
                line.position(),
                line.line_number(),
                line.length() - 1,
                line.line_number(),
            ),
            ..Heading::default()
        });

        if let Some(parent) = parent {
            parent.append_item(Item::Heading(heading.clone()));
        }

        let mut delims = Vec::new();
        let mut start_delim = Pos::null();
        start_delim.start_col = line.position();
        start_delim.start_line = line.line_number();

        let mut count = 0i64;

        while line.current_char() == '#' {
            count += 1;
            line.next_char();
        }

        start_delim.end_col = line.position() - 1;
        start_delim.end_line = line.line_number();
        delims.push(start_delim);

        heading.borrow_mut().level = count;

        line.next_char();

        let mut s: Vec<char> = line.chars().to_vec();
        let mut end_delim = find_and_remove_closing_sequence(&mut s);
        end_delim.start_line = line.line_number();
        end_delim.end_line = line.line_number();

        if end_delim.start_col != -1 {
            delims.push(end_delim);
        }

        heading.borrow_mut().delims = delims;

        let label = find_header_label(&s);

        let s_string: String = s.iter().collect();
        let mut text_line = Line::from_string(&s_string, line.line_number());
        let st = line.current_state();
        text_line.restore_state(&st);

        let paragraph = node(Paragraph {
            pos: Pos::new(
                text_line.position(),
                text_line.line_number(),
                text_line.length() - 1,
                text_line.line_number(),
            ),
            ..Paragraph::default()
        });

        let mut label_pos = Pos::null();

        if let Some((label_text, mut pos)) = label {
            if label_text.len() > 2 {
                let inner: String = label_text
                    .chars()
                    .skip(1)
                    .take(label_text.chars().count() - 2)
                    .collect();

                heading.borrow_mut().label = Some(format!(
                    "{}/{}",
                    inner,
                    anchor_path(&env.path, &env.file_name)
                ));

                pos.start_line = line.line_number();
                pos.end_line = line.line_number();

                heading.borrow_mut().label_pos = pos;
                label_pos = pos;
            }
        }

        env.parser.push_state_of_inliners();

        let mut lines = FxHashMap::default();
        lines.insert(text_line.line_number(), text_line.clone());

        let mut p_stream =
            ParagraphStream::new(lines, text_line.line_number(), text_line.line_number());
        let pst = p_stream.current_state();

        let mut ictx = InlineCtx::default();

        tokenize(&mut p_stream, &mut ictx, env, label_pos, false);

        p_stream.restore_state(&pst);

        env.parser.pop_state_of_inliners();

        process_emphasises(&mut ictx);
        make_text_objects(
            &mut ictx,
            &mut p_stream,
            &BlockRef::Paragraph(paragraph.clone()),
            &label_pos,
        );

        heading.borrow_mut().text = Some(paragraph.clone());

        let labeled = heading.borrow().is_labeled();

        if labeled {
            let label = heading.borrow().label.clone().unwrap();
            env.doc
                .borrow_mut()
                .labeled_headings
                .insert(label.clone(), heading.clone());
            heading.borrow_mut().label_variants.push(label);
        } else {
            process_label(&paragraph, &env.path, &env.file_name, &heading, env);
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
