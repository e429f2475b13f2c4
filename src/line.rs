use std::rc::Rc;

pub const TAB_STOP: i64 = 4;

/// The "no character" sentinel returned by [`Line`] accessors at the ends of
/// a line. Input NUL bytes are replaced with U+FFFD before lines are built,
/// so `'\0'` never collides with real content.
pub const NUL: char = '\0';

/// Cursor state of a [`Line`]: the visual column (tabs expanded to the next
/// multiple of four) and the character position (a tab is one character).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineState {
    pub column: i64,
    pub pos: i64,
}

impl LineState {
    pub fn new(column: i64, pos: i64) -> Self {
        LineState { column, pos }
    }
}

/// One logical source line.
///
/// A cheap-to-clone view into the source characters with two independent
/// counters: `pos` (character index) and `column` (visual column). Tabs are
/// reported as a single space but advance the column to the next tab stop.
#[derive(Debug, Clone)]
pub struct Line {
    src: Rc<[char]>,
    begin: usize,
    end: usize,
    line_number: i64,
    current: LineState,
    saved: LineState,
}

impl Line {
    pub fn new(src: Rc<[char]>, line_number: i64) -> Self {
        let end = src.len();
        Line {
            src,
            begin: 0,
            end,
            line_number,
            current: LineState::default(),
            saved: LineState::default(),
        }
    }

    pub fn empty(line_number: i64) -> Self {
        Line::new(Rc::from(Vec::new()), line_number)
    }

    pub fn from_string(s: &str, line_number: i64) -> Self {
        Line::new(Rc::from(s.chars().collect::<Vec<_>>()), line_number)
    }

    pub fn column(&self) -> i64 {
        self.current.column
    }

    pub fn position(&self) -> i64 {
        self.current.pos
    }

    pub fn length(&self) -> i64 {
        (self.end - self.begin) as i64
    }

    pub fn line_number(&self) -> i64 {
        self.line_number
    }

    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    pub fn at_end(&self) -> bool {
        self.position() >= self.length()
    }

    /// Move the cursor past the end of the line.
    pub fn skip(&mut self) {
        self.current.pos = self.length();
    }

    fn raw(&self, pos: i64) -> char {
        self.src[self.begin + pos as usize]
    }

    fn convert(c: char) -> char {
        if c == '\t' {
            ' '
        } else {
            c
        }
    }

    pub fn current_char(&self) -> char {
        if self.current.pos < self.length() {
            Self::convert(self.raw(self.current.pos))
        } else {
            NUL
        }
    }

    pub fn prev_char(&self) -> char {
        if self.current.pos > 0 && self.current.pos <= self.length() {
            Self::convert(self.raw(self.current.pos - 1))
        } else {
            NUL
        }
    }

    /// Advance to the next character and return it, expanding a consumed tab
    /// into the column counter.
    pub fn next_char(&mut self) -> char {
        if self.current.pos + 1 < self.length() {
            if self.raw(self.current.pos) == '\t' {
                self.current.column += TAB_STOP - self.current.column % TAB_STOP;
            } else {
                self.current.column += 1;
            }
            self.current.pos += 1;
            Self::convert(self.raw(self.current.pos))
        } else {
            if self.current.pos < self.length() {
                self.current.pos = self.length();
                self.current.column += 1;
            }
            NUL
        }
    }

    pub fn save_state(&mut self) {
        self.saved = self.current;
    }

    pub fn restore_saved_state(&mut self) {
        self.current = self.saved;
    }

    pub fn restore_state(&mut self, state: &LineState) {
        self.current = *state;
    }

    pub fn current_state(&self) -> LineState {
        self.current
    }

    /// Copy of `len` characters starting at `pos` (tabs kept verbatim).
    pub fn sliced_copy(&self, pos: i64, len: i64) -> String {
        let len = if len < 0 { self.length() - pos } else { len };
        let start = self.begin + pos.max(0) as usize;
        let stop = (start + len.max(0) as usize).min(self.end);
        self.src[start.min(self.end)..stop].iter().collect()
    }

    pub fn sliced_copy_to_end(&self, pos: i64) -> String {
        self.sliced_copy(pos, -1)
    }

    /// Sub-line sharing the same backing storage; cursor state is reset.
    pub fn sliced(&self, pos: i64, len: i64) -> Line {
        let len = if len < 0 { self.length() - pos } else { len };
        let start = self.begin + pos.max(0) as usize;
        let stop = (start + len.max(0) as usize).min(self.end);
        Line {
            src: Rc::clone(&self.src),
            begin: start.min(self.end),
            end: stop,
            line_number: self.line_number,
            current: LineState::default(),
            saved: LineState::default(),
        }
    }

    pub fn chars(&self) -> &[char] {
        &self.src[self.begin..self.end]
    }

    /// First occurrence of `c` at or after `pos`, tabs not expanded.
    pub fn index_of(&self, c: char, pos: i64) -> i64 {
        let mut i = pos.max(0);
        while i < self.length() {
            if self.raw(i) == c {
                return i;
            }
            i += 1;
        }
        -1
    }

    /// The whole view with surrounding whitespace removed, as a `String`.
    pub fn trimmed(&self) -> String {
        let s: String = self.chars().iter().collect();
        s.trim().to_string()
    }
}
