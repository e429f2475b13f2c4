use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::line::Line;

/// Position of a [`TextStream`]: the number of lines handed out so far. A
/// state captured right after reading line `n` therefore has
/// `line_number == n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamState {
    pub line_number: i64,
}

/// Splits the whole input into logical lines, handling `\n`, `\r` and
/// `\r\n`, and supports jumping back to an already-read line.
///
/// NUL characters are replaced with U+FFFD here, before any [`Line`] is
/// built over the data.
pub struct TextStream {
    lines: Vec<Rc<[char]>>,
    current: StreamState,
    saved: StreamState,
}

impl TextStream {
    pub fn new(input: &str) -> Self {
        let mut lines: Vec<Rc<[char]>> = Vec::new();
        let mut cur: Vec<char> = Vec::new();
        let mut chars = input.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\n' => {
                    lines.push(Rc::from(std::mem::take(&mut cur)));
                }
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    lines.push(Rc::from(std::mem::take(&mut cur)));
                }
                '\0' => cur.push('\u{FFFD}'),
                _ => cur.push(c),
            }
        }

        if !cur.is_empty() {
            lines.push(Rc::from(cur));
        }

        TextStream {
            lines,
            current: StreamState::default(),
            saved: StreamState::default(),
        }
    }

    pub fn at_end(&self) -> bool {
        self.current.line_number >= self.lines.len() as i64
    }

    /// Returns the current line and moves to the next one.
    pub fn read_line(&mut self) -> Line {
        let line = self.current_line();
        self.current.line_number += 1;
        line
    }

    /// Returns the current line without modifying the stream state.
    pub fn current_line(&self) -> Line {
        let n = self.current.line_number;
        if n >= 0 && (n as usize) < self.lines.len() {
            Line::new(Rc::clone(&self.lines[n as usize]), n)
        } else {
            Line::empty(n)
        }
    }

    pub fn save_state(&mut self) {
        self.saved = self.current;
    }

    pub fn restore_saved_state(&mut self) {
        self.current = self.saved;
    }

    pub fn restore_state(&mut self, state: &StreamState) {
        self.current = *state;
    }

    pub fn current_state(&self) -> StreamState {
        self.current
    }

    /// Moves the stream to the beginning of line `ln` and returns it.
    pub fn move_to(&mut self, ln: i64) -> Line {
        self.current.line_number = ln;
        self.read_line()
    }
}

/// Position of a [`ParagraphStream`], with the same "next line to read"
/// convention as [`StreamState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ParagraphStreamState {
    pub line_number: i64,
}

/// A bounded window of lines handed to the inline parsers.
///
/// Lines keep the cursor state they were captured with, so each
/// `read_line` starts at the block's start column on that line.
pub struct ParagraphStream {
    lines: FxHashMap<i64, Line>,
    current: ParagraphStreamState,
    saved: ParagraphStreamState,
    last_line_number: i64,
}

impl ParagraphStream {
    pub fn new(lines: FxHashMap<i64, Line>, first_line_number: i64, last_line_number: i64) -> Self {
        ParagraphStream {
            lines,
            current: ParagraphStreamState {
                line_number: first_line_number,
            },
            saved: ParagraphStreamState {
                line_number: first_line_number,
            },
            last_line_number,
        }
    }

    pub fn read_line(&mut self) -> Line {
        let n = self.current.line_number;
        self.current.line_number += 1;
        self.lines.get(&n).cloned().unwrap_or_else(|| Line::empty(n))
    }

    pub fn at_end(&self) -> bool {
        self.current.line_number > self.last_line_number
    }

    pub fn save_state(&mut self) {
        self.saved = self.current;
    }

    pub fn restore_saved_state(&mut self) {
        self.current = self.saved;
    }

    pub fn restore_state(&mut self, state: &ParagraphStreamState) {
        self.current = *state;
    }

    /// Restore to the position just before the given state, so that the next
    /// `read_line` re-reads the line the state was captured after.
    pub fn restore_state_before(&mut self, state: &ParagraphStreamState) {
        self.current.line_number = state.line_number - 1;
    }

    pub fn current_state(&self) -> ParagraphStreamState {
        self.current
    }
}
