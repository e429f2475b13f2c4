//! Emphasis delimiters: `*`, `_` and GFM `~`, with the CommonMark
//! flanking and delimiter-matching rules.

use crate::line::{Line, NUL};
use crate::nodes::{StyleDelim, TextOpts};
use crate::parser::inlines::{Delimiter, InlineCtx, InlineKind, InlineParser};
use crate::parser::ParseEnv;
use crate::stream::ParagraphStream;
use crate::strings::{is_punct_or_symbol, is_space, ReverseSolidus};

/// Which emphasis character a delimiter run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmphasisKind {
    /// `*`.
    Asterisk,
    /// `_`.
    Underline,
    /// `~`.
    Strikethrough,
}

impl EmphasisKind {
    fn symbol(&self) -> char {
        match self {
            EmphasisKind::Asterisk => '*',
            EmphasisKind::Underline => '_',
            EmphasisKind::Strikethrough => '~',
        }
    }

    fn is_emphasis(&self, length: i64) -> bool {
        match self {
            EmphasisKind::Strikethrough => length == 1 || length == 2,
            _ => true,
        }
    }

    /// Whether opener and closer run lengths must be equal.
    fn is_length_correspond(&self) -> bool {
        matches!(self, EmphasisKind::Strikethrough)
    }

    fn is_left_flanking(&self, before: char, after: char) -> bool {
        let base = base_left_flanking(before, after);

        match self {
            EmphasisKind::Underline => base && !(before.is_alphanumeric() && after.is_alphanumeric()),
            _ => base,
        }
    }

    fn is_right_flanking(&self, before: char, after: char) -> bool {
        let base = base_right_flanking(before, after);

        match self {
            EmphasisKind::Underline => base && !(before.is_alphanumeric() && after.is_alphanumeric()),
            _ => base,
        }
    }

    fn open_styles(&self, mut start_pos: i64, line: i64, length: i64) -> Vec<StyleDelim> {
        let mut styles = Vec::new();

        match self {
            EmphasisKind::Strikethrough => {
                styles.push(StyleDelim::new(
                    TextOpts::STRIKETHROUGH,
                    start_pos,
                    line,
                    start_pos + length - 1,
                    line,
                ));
            }
            _ => {
                if length % 2 == 1 {
                    styles.push(StyleDelim::new(TextOpts::ITALIC, start_pos, line, start_pos, line));
                    start_pos += 1;
                }

                for _ in 0..length / 2 {
                    styles.push(StyleDelim::new(
                        TextOpts::BOLD,
                        start_pos,
                        line,
                        start_pos + 1,
                        line,
                    ));
                    start_pos += 2;
                }
            }
        }

        styles
    }

    fn close_styles(&self, mut start_pos: i64, line: i64, length: i64) -> Vec<StyleDelim> {
        let mut styles = Vec::new();

        match self {
            EmphasisKind::Strikethrough => {
                styles.push(StyleDelim::new(
                    TextOpts::STRIKETHROUGH,
                    start_pos,
                    line,
                    start_pos + length - 1,
                    line,
                ));
            }
            _ => {
                for _ in 0..length / 2 {
                    styles.push(StyleDelim::new(
                        TextOpts::BOLD,
                        start_pos,
                        line,
                        start_pos + 1,
                        line,
                    ));
                    start_pos += 2;
                }

                if length % 2 == 1 {
                    styles.push(StyleDelim::new(TextOpts::ITALIC, start_pos, line, start_pos, line));
                }
            }
        }

        styles
    }
}

fn base_left_flanking(before: char, after: char) -> bool {
    let punct_before = before == NUL || is_punct_or_symbol(before);
    let ws_before = before == NUL || is_space(before);
    let ws_after = after == NUL || is_space(after);
    let punct_after = after == NUL || is_punct_or_symbol(after);
    let ws_or_punct_before = ws_before || punct_before;

    !ws_after && (!punct_after || ws_or_punct_before)
}

fn base_right_flanking(before: char, after: char) -> bool {
    let punct_before = before == NUL || is_punct_or_symbol(before);
    let ws_before = before == NUL || is_space(before);
    let ws_after = after == NUL || is_space(after);
    let punct_after = after == NUL || is_punct_or_symbol(after);

    !ws_before && (!punct_before || ws_after || punct_after)
}

/// Collects a delimiter run of its character, one [`Delimiter`] per
/// character, flagged with the run's flanking.
pub struct EmphasisParser {
    kind: EmphasisKind,
}

impl EmphasisParser {
    pub fn new(kind: EmphasisKind) -> Self {
        EmphasisParser { kind }
    }
}

impl InlineParser for EmphasisParser {
    fn kind(&self) -> InlineKind {
        match self.kind {
            EmphasisKind::Asterisk => InlineKind::AsteriskEmphasis,
            EmphasisKind::Underline => InlineKind::UnderlineEmphasis,
            EmphasisKind::Strikethrough => InlineKind::StrikethroughEmphasis,
        }
    }

    fn check(
        &self,
        line: &mut Line,
        _stream: &mut ParagraphStream,
        ictx: &mut InlineCtx,
        _env: &ParseEnv,
        rs: &ReverseSolidus,
    ) -> bool {
        let symbol = self.kind.symbol();

        if line.current_char() == symbol && !rs.is_prev_reverse_solidus() {
            let mut pos = line.position();
            let mut st = line.current_state();
            let prev_symbol = line.prev_char();
            let mut count = 0i64;

            while line.current_char() == symbol && line.position() < line.length() {
                count += 1;
                st = line.current_state();
                line.next_char();
            }

            let next_symbol = line.current_char();

            if self.kind.is_emphasis(count) {
                let left_flanking = self.kind.is_left_flanking(prev_symbol, next_symbol);
                let right_flanking = self.kind.is_right_flanking(prev_symbol, next_symbol);

                if left_flanking || right_flanking {
                    for _ in 0..count {
                        ictx.delims.push(Delimiter {
                            pos,
                            line: line.line_number(),
                            left_flanking,
                            right_flanking,
                            kind: self.kind,
                        });
                        pos += 1;
                    }

                    return true;
                } else {
                    line.restore_state(&st);
                }
            }
        }

        false
    }

    fn start_delimiter_symbols(&self) -> &'static str {
        match self.kind {
            EmphasisKind::Asterisk => "*",
            EmphasisKind::Underline => "_",
            EmphasisKind::Strikethrough => "~",
        }
    }
}

fn length_forward(delims: &[Delimiter], idx: i64) -> i64 {
    let d = &delims[idx as usize];
    let mut len = 1i64;

    for i in (idx + 1)..delims.len() as i64 {
        let e = &delims[i as usize];
        if e.line == d.line && e.kind == d.kind && e.pos == d.pos + len {
            len += 1;
        } else {
            break;
        }
    }

    len
}

fn length_backward(delims: &[Delimiter], idx: i64) -> i64 {
    let d = &delims[idx as usize];
    let mut len = 1i64;

    let mut i = idx - 1;
    while i >= 0 {
        let e = &delims[i as usize];
        if e.line == d.line && e.kind == d.kind && e.pos == d.pos - len {
            len += 1;
        } else {
            break;
        }
        i -= 1;
    }

    len
}

// The CommonMark "rule of 3".
fn is_mult_3(i1: i64, i2: i64) -> bool {
    (i1 + i2) % 3 == 0 && !(i1 % 3 == 0 && i2 % 3 == 0)
}

/// Resolve the collected delimiter runs into opening and closing styles,
/// scanning closers left to right and matching backwards.
pub fn process_emphasises(ictx: &mut InlineCtx) {
    if ictx.delims.is_empty() {
        return;
    }

    let mut i: i64 = 0;

    while i < ictx.delims.len() as i64 {
        if ictx.delims[i as usize].right_flanking {
            let length_right = length_forward(&ictx.delims, i);
            let tmp_length_left = length_backward(&ictx.delims, i) - 1;

            let mut processed = false;

            let mut j: i64 = i - tmp_length_left - 1;
            while j >= 0 {
                let di = ictx.delims[i as usize];
                let dj = ictx.delims[j as usize];

                if dj.kind == di.kind && dj.left_flanking {
                    let length_left = length_backward(&ictx.delims, j);

                    let mut can_match = !(((di.left_flanking && di.right_flanking)
                        || (dj.left_flanking && dj.right_flanking))
                        && is_mult_3(length_left, length_right + tmp_length_left));
                    can_match = can_match
                        && (!di.kind.is_length_correspond() || length_left == length_right);

                    if can_match {
                        processed = true;

                        ictx.delims.drain((j + 1) as usize..i as usize);
                        i -= i - j - 1;

                        let len = length_left.min(length_right);

                        let opener = &ictx.delims[(i - len) as usize];
                        let open = ictx.delims[(i - 1) as usize].kind.open_styles(
                            opener.pos,
                            ictx.delims[(i - 1) as usize].line,
                            len,
                        );
                        let closer = ictx.delims[i as usize];
                        let close = closer.kind.close_styles(closer.pos, closer.line, len);

                        ictx.open_styles.extend(open);
                        ictx.close_styles.extend(close);

                        ictx.delims.drain(i as usize..(i + len) as usize);
                        ictx.delims.drain((i - len) as usize..i as usize);
                        i -= len + 1;

                        break;
                    } else {
                        j -= length_left - 1;
                    }
                }

                j -= 1;
            }

            if !processed && !ictx.delims[i as usize].left_flanking {
                ictx.delims.remove(i as usize);
                i -= 1;
            }
        }

        i += 1;
    }

    ictx.delims.clear();

    ictx.open_styles
        .sort_by(|a, b| match crate::nodes::style_delim_before(a, b) {
            true => std::cmp::Ordering::Less,
            false => std::cmp::Ordering::Greater,
        });
    ictx.close_styles
        .sort_by(|a, b| match crate::nodes::style_delim_before(a, b) {
            true => std::cmp::Ordering::Less,
            false => std::cmp::Ordering::Greater,
        });
}
