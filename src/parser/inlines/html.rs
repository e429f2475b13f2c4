//! Inline raw HTML: complete open/close tags, comments, processing
//! instructions, CDATA and declarations inside a paragraph.

use crate::line::Line;
use crate::nodes::{node, Item, Pos, RawHtml};
use crate::parser::inlines::{InlineCtx, InlineKind, InlineParser};
use crate::parser::ParseEnv;
use crate::stream::ParagraphStream;
use crate::strings::{
    is_ascii_letter, is_space, is_valid_tag_name, read_html_attr_name, simplified, skip_spaces,
    ReverseSolidus,
};

#[derive(Default)]
pub struct InlineHtmlParser;

impl InlineHtmlParser {
    pub fn new() -> Self {
        InlineHtmlParser
    }
}

fn make_inline_html(
    data: String,
    start_pos: i64,
    start_line: i64,
    end_pos: i64,
    end_line: i64,
    ictx: &mut InlineCtx,
) {
    let html = node(RawHtml {
        pos: Pos::new(start_pos, start_line, end_pos, end_line),
        text: data,
        ..RawHtml::default()
    });

    ictx.inlines.push(Item::RawHtml(html));
}

/// Append the rest of the line and move to the next one; `false` at the
/// end of the stream.
fn append_to_html(
    html: &mut String,
    start_pos: &mut i64,
    line: &mut Line,
    stream: &mut ParagraphStream,
) -> bool {
    html.push_str(&line.sliced_copy_to_end(*start_pos));
    html.push('\n');

    if !stream.at_end() {
        *line = stream.read_line();
        *start_pos = line.position();
        skip_spaces(line);

        true
    } else {
        false
    }
}

#[allow(clippy::too_many_arguments)]
fn read_attr_value(
    start_pos: &mut i64,
    quote: char,
    line: &mut Line,
    stream: &mut ParagraphStream,
    stage: &mut i32,
    next_stage: &mut i32,
    do_break: &mut bool,
    html: &mut String,
) {
    loop {
        let mut local_break = false;

        while line.position() < line.length() {
            if line.current_char() == quote {
                *stage = 0;
                *next_stage = 1;
                local_break = true;
            }

            line.next_char();

            if local_break {
                break;
            }
        }

        if local_break {
            break;
        }

        if !append_to_html(html, start_pos, line, stream) {
            *do_break = true;
            break;
        }
    }
}

fn push_if_closed(
    html: &str,
    end_string: &str,
    start_pos: i64,
    start_line: i64,
    line: &mut Line,
    ictx: &mut InlineCtx,
) -> bool {
    if html.ends_with(end_string) {
        make_inline_html(
            html.to_string(),
            start_pos,
            start_line,
            line.position(),
            line.line_number(),
            ictx,
        );

        line.next_char();

        true
    } else {
        false
    }
}

impl InlineParser for InlineHtmlParser {
    fn kind(&self) -> InlineKind {
        InlineKind::Html
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        _env: &ParseEnv,
        rs: &ReverseSolidus,
    ) -> bool {
        let s_state = stream.current_state();
        let l_state = line.current_state();

        let return_wrong = |line: &mut Line, stream: &mut ParagraphStream| -> bool {
            stream.restore_state_before(&s_state);
            *line = stream.read_line();
            line.restore_state(&l_state);

            false
        };

        if line.current_char() != '<' || rs.is_prev_reverse_solidus() {
            return false;
        }

        let start_pos = line.position();
        let start_line = line.line_number();
        line.next_char();

        let mut tag = String::new();

        while line.position() < line.length()
            && !is_space(line.current_char())
            && line.current_char() != '<'
        {
            tag.push(line.current_char());

            if line.current_char() == '>' {
                break;
            }

            line.next_char();
        }

        let mut html = format!("<{}", tag);

        tag = tag.to_lowercase();

        if tag.is_empty() {
            return return_wrong(line, stream);
        }

        if tag.starts_with("!--") {
            let mut pos = line.position();

            if push_if_closed(&html, "-->", start_pos, start_line, line, ictx) {
                return true;
            }

            let mut count = 0;

            loop {
                while line.position() < line.length() {
                    if line.current_char() == '-' {
                        count += 1;
                    } else if line.current_char() == '>' {
                        if count > 1 {
                            html.push_str(&line.sliced_copy(pos, line.position() - pos + 1));

                            make_inline_html(
                                html,
                                start_pos,
                                start_line,
                                line.position(),
                                line.line_number(),
                                ictx,
                            );

                            line.next_char();

                            return true;
                        }

                        count = 0;
                    } else {
                        count = 0;
                    }

                    line.next_char();
                }

                if !append_to_html(&mut html, &mut pos, line, stream) {
                    break;
                }
            }
        } else if tag.starts_with('?') {
            if push_if_closed(&html, "?>", start_pos, start_line, line, ictx) {
                return true;
            }

            html.clear();
            let mut pos = start_pos;

            loop {
                while line.position() < line.length() {
                    if line.current_char() == '>' && line.prev_char() == '?' {
                        html.push_str(&line.sliced_copy(pos, line.position() - pos + 1));

                        make_inline_html(
                            html,
                            start_pos,
                            start_line,
                            line.position(),
                            line.line_number(),
                            ictx,
                        );

                        line.next_char();

                        return true;
                    }

                    line.next_char();
                }

                if !append_to_html(&mut html, &mut pos, line, stream) {
                    break;
                }
            }
        } else if tag.starts_with("![cdata[") {
            if push_if_closed(&html, "]]>", start_pos, start_line, line, ictx) {
                return true;
            }

            html.clear();
            let mut pos = start_pos;

            loop {
                while line.position() < line.length() {
                    if line.current_char() == ']' && line.prev_char() == ']' {
                        line.next_char();

                        if line.current_char() == '>' {
                            html.push_str(&line.sliced_copy(pos, line.position() - pos + 1));

                            make_inline_html(
                                html,
                                start_pos,
                                start_line,
                                line.position(),
                                line.line_number(),
                                ictx,
                            );

                            line.next_char();

                            return true;
                        }
                    } else {
                        line.next_char();
                    }
                }

                if !append_to_html(&mut html, &mut pos, line, stream) {
                    break;
                }
            }
        } else if let Some(rest) = tag.strip_prefix('!') {
            if !rest.is_empty() && is_ascii_letter(rest.chars().next().unwrap()) {
                if push_if_closed(&html, ">", start_pos, start_line, line, ictx) {
                    return true;
                }

                html.clear();
                let mut pos = start_pos;

                loop {
                    while line.position() < line.length() {
                        if line.current_char() == '>' {
                            html.push_str(&line.sliced_copy(pos, line.position() - pos + 1));

                            make_inline_html(
                                html,
                                start_pos,
                                start_line,
                                line.position(),
                                line.line_number(),
                                ictx,
                            );

                            line.next_char();

                            return true;
                        }

                        line.next_char();
                    }

                    if !append_to_html(&mut html, &mut pos, line, stream) {
                        break;
                    }
                }
            }
        } else {
            let mut closed = false;

            if tag.ends_with('>') {
                closed = true;
                tag.pop();
            }

            if let Some(stripped) = tag.strip_prefix('/') {
                if !closed {
                    let st = line.current_state();

                    skip_spaces(line);

                    if line.current_char() != '>' {
                        line.restore_state(&st);
                        return return_wrong(line, stream);
                    }

                    line.restore_state(&st);
                }

                tag = stripped.to_string();
            }

            if simplified(&tag).ends_with('/') {
                if !closed || !tag.ends_with('/') {
                    return return_wrong(line, stream);
                }

                tag.pop();
            }

            if is_valid_tag_name(&tag) {
                if closed {
                    make_inline_html(
                        html,
                        start_pos,
                        start_line,
                        line.position(),
                        line.line_number(),
                        ictx,
                    );

                    line.next_char();

                    return true;
                }

                let mut stage = 0;
                let mut next_stage = 1;

                let mut pos = line.position();
                let mut check_space = false;
                let mut space_after_attr_name = false;

                loop {
                    let mut do_break = false;

                    macro_rules! check_close {
                        () => {{
                            if line.current_char() == '/' {
                                line.next_char();
                                skip_spaces(line);
                            }

                            if line.current_char() == '>' {
                                html.push_str(&line.sliced_copy(pos, line.position() - pos + 1));
                                closed = true;
                                do_break = true;

                                true
                            } else {
                                false
                            }
                        }};
                    }

                    match stage {
                        0 => {
                            if !check_close!() {
                                let p = line.position();

                                skip_spaces(line);

                                if check_space {
                                    check_space = false;

                                    if p == line.position() && p < line.length() {
                                        do_break = true;
                                    }
                                }

                                if line.position() == line.length() && !do_break {
                                    if !append_to_html(&mut html, &mut pos, line, stream) {
                                        do_break = true;
                                    } else {
                                        check_close!();
                                    }
                                }

                                stage = next_stage;
                            }
                        }

                        1 => {
                            if !check_close!() {
                                if !read_html_attr_name(line) {
                                    do_break = true;
                                } else {
                                    stage = 0;
                                    next_stage = 2;
                                    space_after_attr_name = is_space(line.current_char());
                                }
                            }
                        }

                        2 => {
                            if !check_close!() {
                                if line.current_char() != '=' {
                                    stage = 0;
                                    next_stage = 1;

                                    if !space_after_attr_name {
                                        do_break = true;
                                    }
                                } else {
                                    line.next_char();

                                    stage = 0;
                                    next_stage = 3;
                                }
                            }
                        }

                        3 => {
                            if line.current_char() == '"' {
                                line.next_char();
                                stage = 4;
                            } else if line.current_char() == '\'' {
                                line.next_char();
                                stage = 5;
                            } else {
                                stage = 6;
                            }
                        }

                        4 => {
                            read_attr_value(
                                &mut pos,
                                '"',
                                line,
                                stream,
                                &mut stage,
                                &mut next_stage,
                                &mut do_break,
                                &mut html,
                            );
                            check_space = true;
                        }

                        5 => {
                            read_attr_value(
                                &mut pos,
                                '\'',
                                line,
                                stream,
                                &mut stage,
                                &mut next_stage,
                                &mut do_break,
                                &mut html,
                            );
                            check_space = true;
                        }

                        _ => {
                            // Unquoted attribute value.
                            let p = line.position();

                            while line.position() < line.length() {
                                let c = line.current_char();

                                if is_space(c)
                                    || c == '>'
                                    || c == '"'
                                    || c == '\''
                                    || c == '='
                                    || c == '<'
                                    || c == '`'
                                {
                                    break;
                                }

                                line.next_char();
                            }

                            if line.position() == p {
                                do_break = true;
                            } else {
                                stage = 0;
                                next_stage = 1;
                                check_space = true;
                            }
                        }
                    }

                    if do_break {
                        break;
                    }
                }

                if closed {
                    make_inline_html(
                        html,
                        start_pos,
                        start_line,
                        line.position(),
                        line.line_number(),
                        ictx,
                    );

                    line.next_char();

                    return true;
                }
            }
        }

        return_wrong(line, stream)
    }

    fn start_delimiter_symbols(&self) -> &'static str {
        "<"
    }
}
