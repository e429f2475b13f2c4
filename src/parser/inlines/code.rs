//! Inline code spans: a run of *n* backticks closed by the next run of
//! exactly *n* backticks, possibly on a later line.

use crate::line::Line;
use crate::nodes::{node, Code, Item, Pos};
use crate::parser::inlines::{InlineCtx, InlineKind, InlineParser};
use crate::parser::ParseEnv;
use crate::stream::ParagraphStream;
use crate::strings::{simplified, skip_if, ReverseSolidus};

#[derive(Default)]
pub struct InlineCodeParser;

impl InlineCodeParser {
    pub fn new() -> Self {
        InlineCodeParser
    }
}

impl InlineParser for InlineCodeParser {
    fn kind(&self) -> InlineKind {
        InlineKind::Code
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        _env: &ParseEnv,
        rs: &ReverseSolidus,
    ) -> bool {
        if line.current_char() != '`' || rs.is_prev_reverse_solidus() {
            return false;
        }

        let start_pos = line.position();
        let mut l_state = line.current_state();

        // On rollback the cursor goes back to the last backtick of the run.
        while line.position() < line.length() && line.current_char() == '`' {
            l_state = line.current_state();
            line.next_char();
        }

        let s_state = stream.current_state();

        let end_pos = line.position();
        let mut start_code_pos = end_pos;
        let mut start_code_line = line.line_number();
        let mut end_code_pos = start_code_pos;
        let mut end_code_line = start_code_line;

        let mut code = String::new();

        let mut tmp = line.clone();
        let mut end = end_pos;

        loop {
            while tmp.position() < tmp.length() {
                if start_code_pos == -1 {
                    start_code_pos = tmp.position();
                }

                skip_if(&mut tmp, |c| c != '`');
                let tmp_start_pos = tmp.position();

                if tmp.position() < tmp.length() {
                    skip_if(&mut tmp, |c| c == '`');

                    let tmp_end_pos = tmp.position();

                    if end_pos - start_pos == tmp_end_pos - tmp_start_pos {
                        if tmp_start_pos != end {
                            end_code_pos = tmp_start_pos - 1;
                            end_code_line = tmp.line_number();
                        }

                        if !code.is_empty() && tmp_start_pos - end > 0 {
                            code.push(' ');
                        }

                        code.push_str(&tmp.sliced_copy(end, tmp_start_pos - end));

                        if code.starts_with(' ')
                            && code.ends_with(' ')
                            && !simplified(&code).is_empty()
                        {
                            code.remove(0);
                            code.pop();
                        }

                        let item = node(Code::new(code, true, false));
                        {
                            let mut c = item.borrow_mut();
                            c.pos = Pos::new(
                                start_code_pos,
                                start_code_line,
                                end_code_pos,
                                end_code_line,
                            );
                            c.start_delim = Pos::new(
                                start_pos,
                                line.line_number(),
                                end_pos - 1,
                                line.line_number(),
                            );
                            c.end_delim = Pos::new(
                                tmp_start_pos,
                                tmp.line_number(),
                                tmp_end_pos - 1,
                                tmp.line_number(),
                            );
                        }

                        ictx.inlines.push(Item::Code(item));

                        *line = tmp;

                        return true;
                    }
                }
            }

            if end < tmp.length() {
                if !code.is_empty() {
                    code.push(' ');
                }

                code.push_str(&tmp.sliced_copy_to_end(end));

                end_code_pos = tmp.length() - 1;
                end_code_line = tmp.line_number();
            } else if tmp.line_number() == start_code_line {
                start_code_line = tmp.line_number() + 1;
                start_code_pos = -1;
                end_code_line = start_code_line;
            }

            if stream.at_end() {
                break;
            }

            tmp = stream.read_line();
            end = tmp.position();
        }

        stream.restore_state_before(&s_state);
        *line = stream.read_line();
        line.restore_state(&l_state);

        false
    }

    fn start_delimiter_symbols(&self) -> &'static str {
        "`"
    }
}
