//! Hard line breaks: trailing whitespace before EOL, or a trailing
//! backslash when the line is not the paragraph's last.

use crate::line::Line;
use crate::nodes::{node, Item, LineBreak, Pos};
use crate::parser::inlines::{InlineCtx, InlineKind, InlineParser};
use crate::parser::ParseEnv;
use crate::stream::ParagraphStream;
use crate::strings::{is_empty_line, ReverseSolidus};

#[derive(Default)]
pub struct HardLineBreakParser;

impl HardLineBreakParser {
    pub fn new() -> Self {
        HardLineBreakParser
    }
}

impl InlineParser for HardLineBreakParser {
    fn kind(&self) -> InlineKind {
        InlineKind::HardLineBreak
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        _env: &ParseEnv,
        rs: &ReverseSolidus,
    ) -> bool {
        line.save_state();
        stream.save_state();

        if !stream.at_end() && !rs.is_prev_reverse_solidus() {
            if line.current_char() == ' ' && line.position() < line.length() - 1 {
                let start_pos = line.position();

                if is_empty_line(line) {
                    let br = node(LineBreak {
                        pos: Pos::new(
                            start_pos,
                            line.line_number(),
                            line.length() - 1,
                            line.line_number(),
                        ),
                        ..LineBreak::default()
                    });

                    ictx.inlines.push(Item::LineBreak(br));

                    line.skip();

                    return true;
                }
            } else if line.current_char() == '\\' && line.position() == line.length() - 1 {
                let br = node(LineBreak {
                    pos: Pos::new(
                        line.position(),
                        line.line_number(),
                        line.position(),
                        line.line_number(),
                    ),
                    ..LineBreak::default()
                });

                line.skip();

                ictx.inlines.push(Item::LineBreak(br));

                return true;
            }
        }

        line.restore_saved_state();
        stream.restore_saved_state();

        false
    }

    fn start_delimiter_symbols(&self) -> &'static str {
        " \\"
    }
}
