//! GFM bare autolinks: `www.…`, `http(s)://…`, `mailto:…` and plain
//! emails, at line start or after one of `* _ ~ (` or a space. Trailing
//! punctuation (and unbalanced `)`) is left out of the link.

use std::rc::Rc;

use crate::line::{Line, LineState, NUL};
use crate::nodes::{node, Item, Link, Pos};
use crate::parser::inlines::link::LinkImageParser;
use crate::parser::inlines::{InlineCtx, InlineKind, InlineParser};
use crate::parser::ParseEnv;
use crate::stream::ParagraphStream;
use crate::strings::{has_valid_host, is_email, is_space, skip_chars_if_backward, ReverseSolidus};

pub struct GfmAutolinkParser {
    link_parser: Rc<LinkImageParser>,
}

fn is_prev_symbol_allowed(c: char) -> bool {
    c == NUL || "*_~( ".contains(c)
}

/// Read a whitespace-delimited candidate; a `]` inside hands control to
/// the link parser first. Returns the candidate text and the state of its
/// last character, or an empty string when the link parser consumed.
fn read_link(
    line: &mut Line,
    link_parser: &LinkImageParser,
    stream: &mut ParagraphStream,
    ictx: &mut InlineCtx,
    env: &ParseEnv,
) -> (String, LineState) {
    let start_pos = line.position();
    let mut st = line.current_state();

    let mut rs = ReverseSolidus::new();

    while line.position() < line.length() {
        if rs.is_not_escaped(line.current_char()) {
            if is_space(line.current_char()) || line.current_char() == '<' {
                break;
            } else if line.current_char() == ']'
                && link_parser.check(line, stream, ictx, env, &rs)
            {
                return (String::new(), st);
            }
        }

        st = line.current_state();
        rs.next();
        line.next_char();
    }

    (line.sliced_copy(start_pos, line.position() - start_pos), st)
}

fn truncate_chars(s: &mut String, skip: i64) {
    if skip > 0 {
        let keep = (s.chars().count() as i64 - skip).max(0) as usize;
        *s = s.chars().take(keep).collect();
    }
}

/// Number of trailing characters to strip: closing punctuation plus any
/// unbalanced `)`.
fn skip_at_end(url: &str) -> i64 {
    if url.is_empty() {
        return 0;
    }

    let chars: Vec<char> = url.chars().collect();

    let mut pos = skip_chars_if_backward(chars.len() as i64 - 1, &chars, |c| {
        "?!.,:*_~".contains(c)
    });

    if pos < 0 {
        return chars.len() as i64;
    }

    let mut right = 0i64;

    if chars[pos as usize] == ')' {
        for &c in chars.iter().take(pos as usize + 1) {
            if c == '(' {
                right -= 1;
            } else if c == ')' {
                right += 1;
            }
        }
    }

    if right > 0 {
        pos -= right;
    }

    chars.len() as i64 - pos - 1
}

#[allow(clippy::too_many_arguments)]
fn make_link(
    start: &LineState,
    url: String,
    ictx: &mut InlineCtx,
    line_number: i64,
    length: i64,
    end: &mut LineState,
    line: &mut Line,
    skip: i64,
) {
    let link = node(Link {
        pos: Pos::new(start.pos, line_number, start.pos + length - 1, line_number),
        url,
        url_pos: Pos::new(start.pos, line_number, start.pos + length - 1, line_number),
        text_pos: Pos::new(start.pos, line_number, start.pos + length - 1, line_number),
        ..Link::default()
    });

    ictx.inlines.push(Item::Link(link));

    end.pos -= skip;
    end.column -= skip;

    line.restore_state(end);
}

impl GfmAutolinkParser {
    pub fn new(link_parser: Rc<LinkImageParser>) -> Self {
        GfmAutolinkParser { link_parser }
    }
}

impl InlineParser for GfmAutolinkParser {
    fn kind(&self) -> InlineKind {
        InlineKind::GfmAutolink
    }

    fn check(
        &self,
        line: &mut Line,
        stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        env: &ParseEnv,
        _rs: &ReverseSolidus,
    ) -> bool {
        if !is_prev_symbol_allowed(line.prev_char()) {
            return false;
        }

        let st = line.current_state();

        let (mut url, mut end) = read_link(line, &self.link_parser, stream, ictx, env);

        if url.is_empty() {
            return true;
        }

        let skip = skip_at_end(&url);

        if url.starts_with("www.") {
            url.insert_str(0, "http://");
            truncate_chars(&mut url, skip);

            if has_valid_host(&url) {
                let length = url.chars().count() as i64 - "http://".len() as i64;
                make_link(&st, url, ictx, line.line_number(), length, &mut end, line, skip);

                return true;
            }
        } else if url.starts_with("http://") || url.starts_with("https://") {
            truncate_chars(&mut url, skip);

            if has_valid_host(&url) {
                let length = url.chars().count() as i64;
                make_link(&st, url, ictx, line.line_number(), length, &mut end, line, skip);

                return true;
            }
        } else if url.starts_with("mailto:") {
            truncate_chars(&mut url, skip);

            let email = &url["mailto:".len()..];

            if is_email(email) {
                let length = url.chars().count() as i64;
                make_link(&st, url, ictx, line.line_number(), length, &mut end, line, skip);

                return true;
            }
        } else if url.starts_with("xmpp:") {
            // Recognized but deliberately not linkified.
        } else {
            truncate_chars(&mut url, skip);

            if is_email(&url) {
                let length = url.chars().count() as i64;
                make_link(
                    &st,
                    format!("mailto:{}", url),
                    ictx,
                    line.line_number(),
                    length,
                    &mut end,
                    line,
                    skip,
                );

                return true;
            }
        }

        line.restore_state(&st);

        false
    }

    fn start_delimiter_symbols(&self) -> &'static str {
        "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ"
    }
}
