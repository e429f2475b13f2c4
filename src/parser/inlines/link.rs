//! Links and images: inline, full-reference, collapsed and shortcut
//! forms, footnote references, and the CommonMark active-opener rule.
//!
//! The opener stack is snapshotted around nested description parsing via
//! `push_state`/`pop_state`.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::line::{Line, LineState};
use crate::nodes::{node, BlockRef, Image, Item, Link, NodeRef, Paragraph, Pos};
use crate::parser::inlines::{
    make_text_objects, process_emphasises, tokenize, InlineCtx, InlineKind, InlineParser,
};
use crate::parser::ParseEnv;
use crate::stream::{ParagraphStream, ParagraphStreamState};
use crate::strings::{
    anchor_path, case_folded_upper, is_space, read_link_destination, remove_backslashes,
    replace_entities, simplified, skip_spaces, ReverseSolidus,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DelimType {
    Link,
    Image,
    RightSquare,
}

#[derive(Debug, Clone, Copy)]
struct Opener {
    stream_state: ParagraphStreamState,
    line_state: LineState,
    ty: DelimType,
    active: bool,
}

impl Opener {
    fn new(stream_state: ParagraphStreamState, line_state: LineState, ty: DelimType) -> Self {
        Opener {
            stream_state,
            line_state,
            ty,
            active: true,
        }
    }
}

#[derive(Default)]
struct State {
    openers: Vec<Opener>,
}

#[derive(Default)]
pub struct LinkImageParser {
    states: RefCell<Vec<State>>,
}

/// Inline-form title reader; returns the title and whether the form can
/// still close with `)`.
fn read_link_title_inline(
    line: &mut Line,
    stream: &mut ParagraphStream,
    space: bool,
) -> (String, bool) {
    if !space {
        return (String::new(), line.current_char() == ')');
    }

    let sc = line.current_char();

    if sc != '"' && sc != '\'' && sc != '(' {
        return (String::new(), false);
    }

    let mut lp: i64;

    if sc == '(' {
        let before = line.position();
        while line.position() < line.length() && line.current_char() == '(' {
            line.next_char();
        }
        lp = line.position() - before;
    } else {
        lp = 0;
        line.next_char();
    }

    let mut title = String::new();

    loop {
        let mut rs = ReverseSolidus::new();

        while line.position() < line.length() {
            if rs.process(line.current_char()) {
                // Escaping backslash; fall through.
            } else if lp != 0 && line.current_char() == ')' && !rs.is_prev_reverse_solidus() {
                lp -= 1;

                if lp == 0 {
                    line.next_char();
                    return (title, true);
                }
            } else if sc == '(' && line.current_char() == '(' && !rs.is_prev_reverse_solidus() {
                return (String::new(), false);
            } else if sc != '(' && line.current_char() == sc && !rs.is_prev_reverse_solidus() {
                line.next_char();
                return (title, true);
            } else {
                title.push(line.current_char());
            }

            line.next_char();
            rs.next();
        }

        if !stream.at_end() {
            *line = stream.read_line();
            title.push(' ');
        } else {
            break;
        }
    }

    (String::new(), false)
}

struct LabelInfo {
    label: String,
    start_label_pos: i64,
    start_label_line: i64,
    end_label_pos: i64,
    end_label_line: i64,
    start_paragraph_delim: Opener,
    end_paragraph_delim: Opener,
    text_pos: Pos,
}

impl LinkImageParser {
    pub fn new() -> Self {
        LinkImageParser::default()
    }

    fn find_opener(&self) -> i64 {
        let states = self.states.borrow();
        let openers: &[Opener] = states.last().map(|s| s.openers.as_slice()).unwrap_or(&[]);

        let mut square = 0i64;

        for i in (0..openers.len() as i64).rev() {
            let o = &openers[i as usize];

            match o.ty {
                DelimType::RightSquare => square += 1,
                DelimType::Link | DelimType::Image => {
                    if square == 0 && o.active {
                        return i;
                    } else {
                        square -= 1;
                    }
                }
            }
        }

        -1
    }

    /// On a completed construct, deactivate enclosing link openers (the
    /// active-link rule) and drop openers, delimiters and inlines the new
    /// item swallowed.
    fn clear_link_openers_and_ctx(
        &self,
        idx: usize,
        start_delim: &Opener,
        end_stream_state: ParagraphStreamState,
        end_line_state: LineState,
        ictx: &mut InlineCtx,
    ) {
        {
            let mut states = self.states.borrow_mut();
            let openers = &mut states.last_mut().unwrap().openers;

            if openers[idx].ty == DelimType::Link {
                for o in openers.iter_mut().take(idx + 1) {
                    if o.ty == DelimType::Link {
                        o.active = false;
                    }
                }
            }

            openers.remove(idx);

            let wher = Pos::new(
                start_delim.line_state.pos,
                start_delim.stream_state.line_number - 1,
                end_line_state.pos - 1,
                end_stream_state.line_number - 1,
            );

            openers.retain(|o| {
                !wher.contains(&Pos::new(
                    o.line_state.pos,
                    o.stream_state.line_number - 1,
                    o.line_state.pos,
                    o.stream_state.line_number - 1,
                ))
            });

            ictx.delims
                .retain(|d| !wher.contains(&Pos::new(d.pos, d.line, d.pos, d.line)));

            let mut i = 0;
            while ictx.inlines.len() > 0 && i + 1 < ictx.inlines.len() {
                if wher.contains(&ictx.inlines[i].pos()) {
                    ictx.inlines.remove(i);
                } else {
                    i += 1;
                }
            }
        }
    }

    /// Resolve a parsed URL: decode, absolutize relative file targets and
    /// queue them for recursive parsing; `#fragment` targets get the
    /// current anchor path appended.
    fn prepare_url(&self, url: &str, env: &ParseEnv) -> String {
        let mut u = url.to_string();

        if !u.starts_with('#') {
            replace_entities(&mut u);
            remove_backslashes(&mut u);
        }

        if u.is_empty() {
            return u;
        }

        if !u.starts_with('#') {
            let check_for_file = |u: &mut String, reference: &str, env: &ParseEnv| -> bool {
                let absolutize = |p: &str| -> Option<String> {
                    std::fs::canonicalize(p)
                        .ok()
                        .map(|p| p.to_string_lossy().into_owned())
                };

                if Path::new(u.as_str()).exists() {
                    if let Some(abs) = absolutize(u) {
                        *u = abs;
                    }

                    env.links_to_parse.borrow_mut().push(u.clone());

                    if !reference.is_empty() {
                        *u = format!("{}/{}", reference, u);
                    }

                    true
                } else if !env.path.is_empty()
                    && Path::new(&format!("{}/{}", env.path, u)).exists()
                {
                    if let Some(abs) = absolutize(&format!("{}/{}", env.path, u)) {
                        *u = abs;
                    }

                    env.links_to_parse.borrow_mut().push(u.clone());

                    if !reference.is_empty() {
                        *u = format!("{}/{}", reference, u);
                    }

                    true
                } else {
                    false
                }
            };

            if !check_for_file(&mut u, "", env) && u.contains('#') {
                let i = u.find('#').unwrap();
                let reference = u[i..].to_string();
                let mut base = u[..i].to_string();

                if check_for_file(&mut base, &reference, env) {
                    u = base;
                } else {
                    u = format!("{}{}", base, reference);
                }
            }
        } else {
            u = format!(
                "{}{}/{}",
                u,
                if env.path.is_empty() {
                    String::new()
                } else {
                    format!("/{}", env.path)
                },
                env.file_name
            );

            env.links_to_parse.borrow_mut().push(u.clone());
        }

        u
    }

    /// Inline-parse the bracketed description into a paragraph, also
    /// returning its raw text.
    #[allow(clippy::too_many_arguments)]
    fn parse_description(
        &self,
        start_paragraph_delim: &Opener,
        end_paragraph_delim: &Opener,
        stream: &mut ParagraphStream,
        env: &ParseEnv,
    ) -> (NodeRef<Paragraph>, String) {
        stream.restore_state_before(&start_paragraph_delim.stream_state);
        let mut line = stream.read_line();

        if stream.current_state() == end_paragraph_delim.stream_state {
            line = line.sliced(0, end_paragraph_delim.line_state.pos + 1);
        } else if end_paragraph_delim.stream_state.line_number == 0 {
            return (node(Paragraph::default()), String::new());
        }

        line.restore_state(&start_paragraph_delim.line_state);

        let start_line = line.line_number();
        let mut end_line = start_line;

        let paragraph = node(Paragraph {
            pos: Pos::new(line.position(), start_line, line.length() - 1, end_line),
            ..Paragraph::default()
        });

        let mut text = line.sliced_copy_to_end(line.position());

        let mut lines = FxHashMap::default();
        lines.insert(line.line_number(), line.clone());

        while stream.current_state() != end_paragraph_delim.stream_state {
            line = stream.read_line();

            if stream.current_state() == end_paragraph_delim.stream_state {
                line = line.sliced(0, end_paragraph_delim.line_state.pos);
                lines.insert(line.line_number(), line.clone());
                end_line = line.line_number();

                let mut p = paragraph.borrow_mut();
                p.pos.end_col = line.length() - 1;
                p.pos.end_line = end_line;
            } else {
                lines.insert(line.line_number(), line.clone());
            }

            text.push(' ');
            text.push_str(&line.sliced_copy_to_end(line.position()));
        }

        env.parser.push_state_of_inliners();

        let mut p_stream = ParagraphStream::new(lines, start_line, end_line);
        let pst = p_stream.current_state();
        let mut ictx = InlineCtx::default();

        tokenize(&mut p_stream, &mut ictx, env, Pos::null(), true);

        env.parser.pop_state_of_inliners();

        p_stream.restore_state(&pst);

        process_emphasises(&mut ictx);
        make_text_objects(
            &mut ictx,
            &mut p_stream,
            &BlockRef::Paragraph(paragraph.clone()),
            &Pos::null(),
        );

        (paragraph, text)
    }

    fn set_img_and_p(p: &(NodeRef<Paragraph>, String), link: &NodeRef<Link>) {
        if !p.0.borrow().is_empty() {
            let mut img: Option<NodeRef<Image>> = None;

            for it in &p.0.borrow().items {
                if let Item::Image(i) = it {
                    img = Some(Rc::clone(i));
                    break;
                }
            }

            let mut l = link.borrow_mut();

            if let Some(img) = img {
                l.img = Some(img);
            }

            l.p = Some(Rc::clone(&p.0));
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn make_link(
        &self,
        url: &str,
        start_paragraph_delim: &Opener,
        end_paragraph_delim: &Opener,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        text_pos: Pos,
        url_pos: Pos,
        env: &ParseEnv,
        link_pos: Pos,
    ) {
        let link = node(Link {
            url: self.prepare_url(url, env),
            text_pos,
            url_pos,
            pos: link_pos,
            ..Link::default()
        });

        let s_state = stream.current_state();

        let mut p = self.parse_description(start_paragraph_delim, end_paragraph_delim, stream, env);

        Self::set_img_and_p(&p, &link);

        remove_backslashes(&mut p.1);

        link.borrow_mut().text = p.1;

        stream.restore_state(&s_state);

        ictx.inlines.push(Item::Link(link));
    }

    #[allow(clippy::too_many_arguments)]
    fn make_image(
        &self,
        url: &str,
        start_paragraph_delim: &Opener,
        end_paragraph_delim: &Opener,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        text_pos: Pos,
        url_pos: Pos,
        env: &ParseEnv,
        link_pos: Pos,
    ) {
        let img = node(Image {
            url: self.prepare_url(url, env),
            text_pos,
            url_pos,
            pos: link_pos,
            ..Image::default()
        });

        let s_state = stream.current_state();

        let mut p = self.parse_description(start_paragraph_delim, end_paragraph_delim, stream, env);

        remove_backslashes(&mut p.1);

        {
            let mut i = img.borrow_mut();
            i.p = Some(p.0);
            i.text = p.1.trim().to_string();
        }

        stream.restore_state(&s_state);

        ictx.inlines.push(Item::Image(img));
    }

    /// Re-read the bracketed label between the opener and the given end
    /// state, collecting its text and the description boundaries.
    fn read_label(
        &self,
        start_delim: &Opener,
        end_stream_state: ParagraphStreamState,
        end_line_state: LineState,
        stream: &mut ParagraphStream,
    ) -> LabelInfo {
        stream.restore_state_before(&start_delim.stream_state);
        let mut line = stream.read_line();
        line.restore_state(&start_delim.line_state);

        let bracket_len = if start_delim.ty == DelimType::Link { 1 } else { 2 };

        let start_label_line = line.line_number();
        let end_label_pos = end_line_state.pos;
        let end_label_line = end_stream_state.line_number - 1;
        let start_label_pos = line.position();

        let mut pos = line.position() + bracket_len;

        let mut start_paragraph_delim = Opener::new(
            start_delim.stream_state,
            start_delim.line_state,
            DelimType::Link,
        );

        let mut start_set = false;

        let mut start_text_pos: i64 = -1;
        let mut start_text_line: i64 = -1;
        let mut end_text_pos: i64 = end_line_state.pos - 1;
        let mut end_text_line: i64 = end_stream_state.line_number - 1;

        if pos < line.length() {
            start_text_pos = start_delim.line_state.pos + bracket_len;
            start_paragraph_delim.line_state =
                LineState::new(start_delim.line_state.column + bracket_len, start_text_pos);
            start_paragraph_delim.stream_state = start_delim.stream_state;
            start_text_line = start_delim.stream_state.line_number - 1;
            start_set = true;
        }

        let mut end_paragraph_delim = Opener::new(
            ParagraphStreamState::default(),
            LineState::default(),
            DelimType::Link,
        );

        let mut label = String::new();

        loop {
            let tmp;

            if stream.current_state() == end_stream_state {
                tmp = line.sliced_copy(pos, end_line_state.pos - pos);
                label.push_str(&tmp);

                if !tmp.is_empty() {
                    end_paragraph_delim.line_state =
                        LineState::new(end_line_state.column - 1, end_line_state.pos - 1);
                    end_paragraph_delim.stream_state = end_stream_state;
                    end_text_pos = end_line_state.pos - 1;
                    end_text_line = line.line_number();
                }
            } else {
                tmp = line.sliced_copy_to_end(pos);
                label.push_str(&tmp);

                if !tmp.is_empty() {
                    end_paragraph_delim.line_state =
                        LineState::new(line.length() - 1, line.length() - 1);
                    end_paragraph_delim.stream_state = stream.current_state();
                    end_text_pos = line.length() - 1;
                    end_text_line = line.line_number();
                }
            }

            label.push(' ');

            if stream.current_state() != end_stream_state {
                line = stream.read_line();
                pos = line.position();
            } else {
                break;
            }

            if !start_set {
                start_paragraph_delim.line_state = line.current_state();
                start_paragraph_delim.stream_state = stream.current_state();
                start_text_pos = line.position();
                start_text_line = line.line_number();
                start_set = true;
            }
        }

        LabelInfo {
            label,
            start_label_pos,
            start_label_line,
            end_label_pos,
            end_label_line,
            start_paragraph_delim,
            end_paragraph_delim,
            text_pos: Pos::new(start_text_pos, start_text_line, end_text_pos, end_text_line),
        }
    }

    /// Try the shortcut form: look the label up among the reference links,
    /// then among the footnotes. Returns `(matched, was_footnote)`.
    #[allow(clippy::too_many_arguments)]
    fn check_shortcut_link_image(
        &self,
        start_delim: &Opener,
        end_stream_state: ParagraphStreamState,
        end_line_state: LineState,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        env: &ParseEnv,
    ) -> (bool, bool) {
        let start_state = stream.current_state();

        let info = self.read_label(start_delim, end_stream_state, end_line_state, stream);

        let label = simplified(&info.label);

        if !label.is_empty() {
            let u = format!("#{}", case_folded_upper(&label));
            let url = format!("{}/{}", u, anchor_path(&env.path, &env.file_name));

            let link_pos = Pos::new(
                info.start_label_pos,
                info.start_label_line,
                info.end_label_pos,
                info.end_label_line,
            );

            let known = env.doc.borrow().labeled_links.contains_key(&url);

            if known {
                if start_delim.ty == DelimType::Link {
                    self.make_link(
                        &u,
                        &info.start_paragraph_delim,
                        &info.end_paragraph_delim,
                        stream,
                        ictx,
                        info.text_pos,
                        info.text_pos,
                        env,
                        link_pos,
                    );
                } else {
                    let resolved = env
                        .doc
                        .borrow()
                        .labeled_links
                        .get(&url)
                        .map(|l| l.borrow().url.clone())
                        .unwrap_or_default();

                    self.make_image(
                        &resolved,
                        &info.start_paragraph_delim,
                        &info.end_paragraph_delim,
                        stream,
                        ictx,
                        info.text_pos,
                        info.text_pos,
                        env,
                        link_pos,
                    );
                }

                return (true, false);
            } else if start_delim.ty == DelimType::Link {
                let is_footnote = env.doc.borrow().footnotes.contains_key(&url);

                if is_footnote {
                    let reference = node(crate::nodes::FootnoteReference {
                        pos: link_pos,
                        id: url,
                        id_pos: info.text_pos,
                        ..crate::nodes::FootnoteReference::default()
                    });

                    ictx.inlines.push(Item::FootnoteReference(reference));

                    return (true, true);
                }
            }
        }

        stream.restore_state(&start_state);

        (false, false)
    }

    /// Try the `](url "title")` inline form ending at the current `)`.
    #[allow(clippy::too_many_arguments)]
    fn check_inline_link_image(
        &self,
        start_delim: &Opener,
        end_desc_stream_state: ParagraphStreamState,
        end_desc_line_state: LineState,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        env: &ParseEnv,
    ) -> bool {
        let start_state = stream.current_state();

        stream.restore_state_before(&end_desc_stream_state);
        let mut line = stream.read_line();
        line.restore_state(&end_desc_line_state);

        let start_link_line = start_delim.stream_state.line_number - 1;
        let start_link_pos = start_delim.line_state.pos;

        line.next_char();
        line.next_char();

        let pos = line.position();

        if pos >= line.length() {
            line = stream.read_line();
        }

        skip_spaces(&mut line);

        let start_url_pos = line.position();
        let start_url_line = line.line_number();

        if !read_link_destination(&mut line).is_empty() {
            let end_url_pos = line.position() - 1;

            let mut url = line.sliced_copy(start_url_pos, end_url_pos - start_url_pos + 1);

            if url.starts_with('<') {
                url.remove(0);
                url.pop();
            }

            let mut space = is_space(line.current_char());

            skip_spaces(&mut line);

            if line.position() >= line.length() {
                line = stream.read_line();
                skip_spaces(&mut line);
                space = true;
            }

            let title = read_link_title_inline(&mut line, stream, space);

            if title.1 {
                skip_spaces(&mut line);

                if pos >= line.length() {
                    line = stream.read_line();
                    skip_spaces(&mut line);
                }

                if line.current_char() == ')' {
                    let info = self.read_label(
                        start_delim,
                        end_desc_stream_state,
                        end_desc_line_state,
                        stream,
                    );

                    let link_pos = Pos::new(
                        start_link_pos,
                        start_link_line,
                        line.position(),
                        line.line_number(),
                    );

                    let url_pos =
                        Pos::new(start_url_pos, start_url_line, end_url_pos, start_url_line);

                    if start_delim.ty == DelimType::Link {
                        self.make_link(
                            &url,
                            &info.start_paragraph_delim,
                            &info.end_paragraph_delim,
                            stream,
                            ictx,
                            info.text_pos,
                            url_pos,
                            env,
                            link_pos,
                        );
                    } else {
                        self.make_image(
                            &url,
                            &info.start_paragraph_delim,
                            &info.end_paragraph_delim,
                            stream,
                            ictx,
                            info.text_pos,
                            url_pos,
                            env,
                            link_pos,
                        );
                    }

                    return true;
                }
            }
        }

        stream.restore_state(&start_state);

        false
    }

    /// Try the `][ref]` full-reference form (and the `][]` collapsed form
    /// on the way).
    #[allow(clippy::too_many_arguments)]
    fn check_ref_link_image(
        &self,
        start_delim: &Opener,
        end_desc_stream_state: ParagraphStreamState,
        end_desc_line_state: LineState,
        end_stream_state: ParagraphStreamState,
        end_line_state: LineState,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        env: &ParseEnv,
    ) -> bool {
        let start_state = stream.current_state();

        stream.restore_state_before(&end_desc_stream_state);
        let mut line = stream.read_line();
        line.restore_state(&end_desc_line_state);

        let st = line.current_state();

        line.next_char();

        let ref_start_line_state = line.current_state();

        line.next_char();

        if line.current_char() == ']' {
            let res = self.check_shortcut_link_image(
                start_delim,
                end_desc_stream_state,
                end_desc_line_state,
                stream,
                ictx,
                env,
            );

            if res.0 {
                if !res.1 {
                    if let Some(last) = ictx.inlines.last() {
                        let mut pos = last.pos();
                        pos.end_col = line.position();
                        last.set_pos(pos);
                    }
                } else {
                    line.restore_state(&st);
                }

                return true;
            }
        }

        let pos = line.position();

        if pos >= line.length() {
            line = stream.read_line();
        }

        skip_spaces(&mut line);

        let ref_delim = Opener::new(end_desc_stream_state, ref_start_line_state, DelimType::Link);

        let res = self.check_shortcut_link_image(
            &ref_delim,
            end_stream_state,
            end_line_state,
            stream,
            ictx,
            env,
        );

        if res.0 && !res.1 {
            let info = self.read_label(
                start_delim,
                end_desc_stream_state,
                end_desc_line_state,
                stream,
            );

            let p = self.parse_description(
                &info.start_paragraph_delim,
                &info.end_paragraph_delim,
                stream,
                env,
            );

            let placed = ictx.inlines.pop();

            let link = match placed {
                Some(Item::Link(link)) => Some(link),
                Some(other) => {
                    ictx.inlines.push(other);
                    None
                }
                None => None,
            };

            if let Some(link) = link {
                if start_delim.ty == DelimType::Link {
                    {
                        let mut l = link.borrow_mut();
                        l.pos.start_col = info.start_label_pos;
                        l.pos.start_line = info.start_label_line;
                        l.url_pos = l.text_pos;
                        l.text_pos = info.text_pos;
                    }

                    Self::set_img_and_p(&p, &link);

                    let mut text = p.1;
                    remove_backslashes(&mut text);
                    link.borrow_mut().text = text;

                    ictx.inlines.push(Item::Link(link));
                } else {
                    let (url, end_col, end_line, text_pos) = {
                        let l = link.borrow();

                        let resolved = env
                            .doc
                            .borrow()
                            .labeled_links
                            .get(&l.url)
                            .map(|r| r.borrow().url.clone())
                            .unwrap_or_else(|| l.url.clone());

                        (resolved, l.pos.end_col, l.pos.end_line, l.text_pos)
                    };

                    let img = node(Image {
                        pos: Pos::new(
                            info.start_label_pos,
                            info.start_label_line,
                            end_col,
                            end_line,
                        ),
                        url,
                        text: p.1,
                        p: Some(p.0),
                        url_pos: text_pos,
                        text_pos: info.text_pos,
                        ..Image::default()
                    });

                    ictx.inlines.push(Item::Image(img));
                }

                return true;
            }
        }

        stream.restore_state(&start_state);

        false
    }
}

impl InlineParser for LinkImageParser {
    fn kind(&self) -> InlineKind {
        InlineKind::LinkImage
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        env: &ParseEnv,
        rs: &ReverseSolidus,
    ) -> bool {
        if rs.is_prev_reverse_solidus() {
            return false;
        }

        if self.states.borrow().is_empty() {
            self.states.borrow_mut().push(State::default());
        }

        let push_opener = |o: Opener| {
            self.states.borrow_mut().last_mut().unwrap().openers.push(o);
        };

        if line.current_char() == '!' {
            let st = line.current_state();
            line.next_char();

            if line.current_char() == '[' {
                push_opener(Opener::new(stream.current_state(), st, DelimType::Image));
            } else {
                line.restore_state(&st);
            }
        } else if line.current_char() == '[' {
            push_opener(Opener::new(
                stream.current_state(),
                line.current_state(),
                DelimType::Link,
            ));
        } else if line.current_char() == ']' {
            let opener_idx = self.find_opener();

            if opener_idx != -1 {
                let start_delim =
                    self.states.borrow().last().unwrap().openers[opener_idx as usize];

                let s_state = stream.current_state();
                let l_state = line.current_state();

                line.next_char();

                let s_state_dest_start = stream.current_state();
                let l_state_dest_start = line.current_state();

                if line.current_char() == '(' {
                    let mut par = 0i64;

                    line.next_char();

                    skip_spaces(line);

                    let mut check_parenthesis = line.current_char() != '<';

                    'outer: loop {
                        let mut rs = ReverseSolidus::new();

                        while line.position() < line.length() {
                            if rs.is_not_escaped(line.current_char()) {
                                if line.current_char() == '>' {
                                    if !check_parenthesis {
                                        check_parenthesis = true;
                                    }
                                } else if line.current_char() == '(' {
                                    if check_parenthesis {
                                        par += 1;
                                    }
                                } else if line.current_char() == ')' {
                                    if par != 0 {
                                        par -= 1;
                                    } else if self.check_inline_link_image(
                                        &start_delim,
                                        s_state,
                                        l_state,
                                        stream,
                                        ictx,
                                        env,
                                    ) {
                                        line.next_char();
                                        self.clear_link_openers_and_ctx(
                                            opener_idx as usize,
                                            &start_delim,
                                            stream.current_state(),
                                            line.current_state(),
                                            ictx,
                                        );
                                        return true;
                                    }
                                }
                            }

                            line.next_char();
                            rs.next();
                        }

                        if stream.at_end() {
                            break 'outer;
                        }

                        *line = stream.read_line();
                    }

                    let res = self.check_shortcut_link_image(
                        &start_delim,
                        s_state,
                        l_state,
                        stream,
                        ictx,
                        env,
                    );

                    if !res.0 {
                        stream.restore_state_before(&s_state);
                        *line = stream.read_line();
                        line.restore_state(&l_state);

                        push_opener(Opener::new(
                            stream.current_state(),
                            line.current_state(),
                            DelimType::RightSquare,
                        ));
                    } else {
                        stream.restore_state_before(&s_state_dest_start);
                        *line = stream.read_line();
                        line.restore_state(&l_state_dest_start);
                        self.clear_link_openers_and_ctx(
                            opener_idx as usize,
                            &start_delim,
                            s_state_dest_start,
                            l_state_dest_start,
                            ictx,
                        );
                        return true;
                    }
                } else if line.current_char() == '[' {
                    let tmp_s_state = stream.current_state();
                    let tmp_l_state = line.current_state();
                    line.next_char();
                    let mut stop = false;

                    'outer2: loop {
                        let mut rs = ReverseSolidus::new();

                        while line.position() < line.length() {
                            if rs.is_not_escaped(line.current_char()) {
                                if line.current_char() == '[' {
                                    stop = true;
                                    break;
                                } else if line.current_char() == ']' {
                                    if self.check_ref_link_image(
                                        &start_delim,
                                        s_state,
                                        l_state,
                                        stream.current_state(),
                                        line.current_state(),
                                        stream,
                                        ictx,
                                        env,
                                    ) {
                                        line.next_char();
                                        self.clear_link_openers_and_ctx(
                                            opener_idx as usize,
                                            &start_delim,
                                            stream.current_state(),
                                            line.current_state(),
                                            ictx,
                                        );
                                        return true;
                                    } else {
                                        stream.restore_state_before(&s_state);
                                        *line = stream.read_line();
                                        line.restore_state(&l_state);

                                        push_opener(Opener::new(
                                            s_state,
                                            l_state,
                                            DelimType::RightSquare,
                                        ));
                                        push_opener(Opener::new(
                                            tmp_s_state,
                                            tmp_l_state,
                                            DelimType::Link,
                                        ));

                                        return false;
                                    }
                                }
                            }

                            if stop {
                                break;
                            }

                            line.next_char();
                            rs.next();
                        }

                        if stream.at_end() || stop {
                            break 'outer2;
                        }

                        *line = stream.read_line();
                    }

                    let res = self.check_shortcut_link_image(
                        &start_delim,
                        s_state,
                        l_state,
                        stream,
                        ictx,
                        env,
                    );

                    if !res.0 {
                        stream.restore_state_before(&s_state);
                        *line = stream.read_line();
                        line.restore_state(&l_state);

                        push_opener(Opener::new(
                            stream.current_state(),
                            line.current_state(),
                            DelimType::RightSquare,
                        ));
                    } else {
                        stream.restore_state_before(&s_state_dest_start);
                        *line = stream.read_line();
                        line.restore_state(&l_state_dest_start);
                        self.clear_link_openers_and_ctx(
                            opener_idx as usize,
                            &start_delim,
                            s_state_dest_start,
                            l_state_dest_start,
                            ictx,
                        );
                        return true;
                    }
                } else {
                    let res = self.check_shortcut_link_image(
                        &start_delim,
                        s_state,
                        l_state,
                        stream,
                        ictx,
                        env,
                    );

                    if !res.0 {
                        stream.restore_state_before(&s_state);
                        *line = stream.read_line();
                        line.restore_state(&l_state);

                        push_opener(Opener::new(
                            stream.current_state(),
                            line.current_state(),
                            DelimType::RightSquare,
                        ));
                    } else {
                        stream.restore_state_before(&s_state_dest_start);
                        *line = stream.read_line();
                        line.restore_state(&l_state_dest_start);
                        self.clear_link_openers_and_ctx(
                            opener_idx as usize,
                            &start_delim,
                            s_state_dest_start,
                            l_state_dest_start,
                            ictx,
                        );
                        return true;
                    }
                }
            } else {
                push_opener(Opener::new(
                    stream.current_state(),
                    line.current_state(),
                    DelimType::RightSquare,
                ));
            }
        }

        false
    }

    fn push_state(&self) {
        self.states.borrow_mut().push(State::default());
    }

    fn pop_state(&self) {
        self.states.borrow_mut().pop();
    }

    fn start_delimiter_symbols(&self) -> &'static str {
        "![]"
    }
}
