//! `<…>` autolinks: an absolute URI with a CommonMark scheme, or an email
//! address (which gets `mailto:` prepended).

use crate::line::Line;
use crate::nodes::{node, Item, Link, Pos};
use crate::parser::inlines::{InlineCtx, InlineKind, InlineParser};
use crate::parser::ParseEnv;
use crate::stream::ParagraphStream;
use crate::strings::{is_ascii_control, is_email, is_valid_url, ReverseSolidus};

#[derive(Default)]
pub struct AutolinkParser;

impl AutolinkParser {
    pub fn new() -> Self {
        AutolinkParser
    }
}

fn read_uri(line: &mut Line, stream: &mut ParagraphStream) -> String {
    let mut url = String::new();

    loop {
        let mut rs = ReverseSolidus::new();

        while line.position() < line.length() {
            url.push(line.current_char());

            if rs.is_not_escaped(line.current_char()) {
                if is_ascii_control(line.current_char()) {
                    return String::new();
                } else if line.current_char() == '>' {
                    line.next_char();

                    url.pop();

                    return url;
                } else if line.current_char() == '<' {
                    return String::new();
                }
            }

            line.next_char();
            rs.next();
        }

        if !stream.at_end() {
            *line = stream.read_line();
        } else {
            break;
        }
    }

    String::new()
}

impl InlineParser for AutolinkParser {
    fn kind(&self) -> InlineKind {
        InlineKind::Autolink
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        _env: &ParseEnv,
        rs: &ReverseSolidus,
    ) -> bool {
        if line.current_char() == '<' && !rs.is_prev_reverse_solidus() {
            let s_state = stream.current_state();
            let l_state = line.current_state();

            let start_pos = line.position();
            let start_line = line.line_number();

            line.next_char();

            let uri = read_uri(line, stream);

            let email = is_email(&uri);

            if !is_valid_url(&uri) && !email {
                stream.restore_state_before(&s_state);
                *line = stream.read_line();
                line.restore_state(&l_state);

                return false;
            }

            let url = if email && !uri.starts_with("mailto:") {
                format!("mailto:{}", uri)
            } else {
                uri
            };

            let lnk = node(Link {
                pos: Pos::new(
                    start_pos,
                    start_line,
                    line.position() - 1,
                    line.line_number(),
                ),
                url,
                text_pos: Pos::new(
                    start_pos + 1,
                    start_line,
                    line.position() - 2,
                    line.line_number(),
                ),
                url_pos: Pos::new(
                    start_pos + 1,
                    start_line,
                    line.position() - 2,
                    line.line_number(),
                ),
                ..Link::default()
            });

            ictx.inlines.push(Item::Link(lnk));

            return true;
        }

        false
    }

    fn start_delimiter_symbols(&self) -> &'static str {
        "<"
    }
}
