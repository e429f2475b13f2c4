//! Inline LaTeX math: `$…$` and `$$…$$`, body taken verbatim including
//! newlines; symmetric backticks just inside the dollars are stripped.

use crate::line::Line;
use crate::nodes::{node, Item, Math, Pos};
use crate::parser::inlines::{InlineCtx, InlineKind, InlineParser};
use crate::parser::ParseEnv;
use crate::stream::ParagraphStream;
use crate::strings::{is_empty_line, ReverseSolidus};

#[derive(Default)]
pub struct InlineMathParser;

impl InlineMathParser {
    pub fn new() -> Self {
        InlineMathParser
    }
}

#[allow(clippy::too_many_arguments)]
fn append_code(
    line: &Line,
    start: i64,
    end: i64,
    code: &mut String,
    update_pos: bool,
    start_pos: &mut i64,
    start_line: &mut i64,
) {
    if start < end {
        if !code.is_empty() {
            code.push('\n');
        }

        code.push_str(&line.sliced_copy(start, end - start));

        if update_pos {
            *start_pos = start;
            *start_line = line.line_number();
        }
    }
}

impl InlineParser for InlineMathParser {
    fn kind(&self) -> InlineKind {
        InlineKind::Math
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        _env: &ParseEnv,
        rs: &ReverseSolidus,
    ) -> bool {
        if line.current_char() != '$' || rs.is_prev_reverse_solidus() {
            return false;
        }

        let start_delim_pos = line.position();
        let mut l_state = line.current_state();
        let mut dollar_count = 0i64;
        let mut start_line = line.line_number();

        while line.position() < line.length() && line.current_char() == '$' {
            l_state = line.current_state();
            dollar_count += 1;
            line.next_char();
        }

        let mut start_pos = line.position();
        let mut check_pos = is_empty_line(line);
        let mut first = true;

        if dollar_count > 0 && dollar_count < 3 {
            let s_state = stream.current_state();

            let mut end_pos: i64 = -1;
            let mut end_line = line.line_number();

            let mut code = String::new();

            let mut tmp = line.clone();

            loop {
                let mut rs = ReverseSolidus::new();

                let pos = tmp.position();

                while tmp.position() < tmp.length() {
                    if rs.is_not_escaped(tmp.current_char()) && tmp.current_char() == '$' {
                        let end_delim_pos = tmp.position();

                        let mut close_dollar_count = 0i64;

                        while tmp.position() < tmp.length() && tmp.current_char() == '$' {
                            close_dollar_count += 1;
                            tmp.next_char();
                        }

                        if close_dollar_count == dollar_count {
                            append_code(
                                &tmp,
                                pos,
                                end_delim_pos,
                                &mut code,
                                check_pos && !first,
                                &mut start_pos,
                                &mut start_line,
                            );

                            if code.starts_with('`') && code.ends_with('`') {
                                code.remove(0);
                                code.pop();
                            }

                            let item = node(Math {
                                pos: Pos::new(start_pos, start_line, end_pos, end_line),
                                expr: code,
                                is_inline: dollar_count == 1,
                                start_delim: Pos::new(
                                    start_delim_pos,
                                    line.line_number(),
                                    start_delim_pos + dollar_count - 1,
                                    line.line_number(),
                                ),
                                end_delim: Pos::new(
                                    end_delim_pos,
                                    tmp.line_number(),
                                    tmp.position() - 1,
                                    tmp.line_number(),
                                ),
                                ..Math::default()
                            });

                            ictx.inlines.push(Item::Math(item));

                            *line = tmp;

                            return true;
                        }
                    }

                    end_pos = tmp.position();

                    tmp.next_char();
                    rs.next();
                }

                end_line = tmp.line_number();

                append_code(
                    &tmp,
                    pos,
                    tmp.position(),
                    &mut code,
                    check_pos && !first,
                    &mut start_pos,
                    &mut start_line,
                );

                if stream.at_end() {
                    break;
                }

                tmp = stream.read_line();
                check_pos = check_pos && first;
                first = false;
            }

            stream.restore_state_before(&s_state);
            *line = stream.read_line();
        }

        line.restore_state(&l_state);

        false
    }

    fn start_delimiter_symbols(&self) -> &'static str {
        "$"
    }
}
