//! String and line scanning helpers shared by the block and inline parsers.

use unicode_categories::UnicodeCategories;

use crate::ctype::{isalnum, isalpha, ispunct};
use crate::entity;
use crate::line::Line;
use crate::nodes::{Item, NodeRef, Paragraph};

pub fn is_space(c: char) -> bool {
    c.is_whitespace()
}

/// Unicode punctuation for emphasis flanking: punctuation or symbol
/// categories.
pub fn is_punct_or_symbol(c: char) -> bool {
    c.is_punctuation() || c.is_symbol()
}

pub fn is_ascii_control(c: char) -> bool {
    let u = c as u32;
    u <= 0x1F || u == 0x7F
}

pub fn is_ascii_letter(c: char) -> bool {
    isalpha(c)
}

/// Advance the line while the predicate holds.
pub fn skip_if(line: &mut Line, mut pred: impl FnMut(char) -> bool) {
    while line.position() < line.length() && pred(line.current_char()) {
        line.next_char();
    }
}

pub fn skip_spaces(line: &mut Line) {
    skip_if(line, is_space);
}

/// First position at or after `start` whose character fails the predicate.
pub fn skip_chars_if(start: usize, s: &[char], mut pred: impl FnMut(char) -> bool) -> usize {
    let mut i = start;
    while i < s.len() && pred(s[i]) {
        i += 1;
    }
    i
}

/// First position at or before `start` whose character fails the predicate,
/// moving backwards; `-1` when every character matched.
pub fn skip_chars_if_backward(start: i64, s: &[char], mut pred: impl FnMut(char) -> bool) -> i64 {
    let mut i = start.min(s.len() as i64 - 1);
    while i >= 0 && pred(s[i as usize]) {
        i -= 1;
    }
    i
}

/// Whether the rest of the line is only whitespace. Line state is restored.
pub fn is_empty_line(line: &mut Line) -> bool {
    let st = line.current_state();
    skip_spaces(line);
    let empty = line.position() == line.length();
    line.restore_state(&st);
    empty
}

/// Trimmed, with internal whitespace runs collapsed to single spaces.
pub fn simplified(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !last_was_space && !out.is_empty() {
                out.push(' ');
                last_was_space = true;
            }
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Tracks whether the previous character was an unescaped backslash.
#[derive(Default, Clone, Copy)]
pub struct ReverseSolidus {
    now: bool,
    reverse_solidus: bool,
}

impl ReverseSolidus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the current character was recognized as an
    /// escaping backslash.
    pub fn process(&mut self, ch: char) -> bool {
        self.process_if(ch, true)
    }

    /// Like [`ReverseSolidus::process`], but only recognizes the backslash
    /// when `rule` also holds.
    pub fn process_if(&mut self, ch: char, rule: bool) -> bool {
        if ch == '\\' && !self.is_prev_reverse_solidus() && rule {
            self.reverse_solidus = true;
            self.now = true;
            true
        } else {
            false
        }
    }

    pub fn is_prev_reverse_solidus(&self) -> bool {
        self.reverse_solidus && !self.now
    }

    /// Process `ch`; `true` when it is neither an escaping backslash nor
    /// escaped itself.
    pub fn is_not_escaped(&mut self, ch: char) -> bool {
        !self.process(ch) && !self.is_prev_reverse_solidus()
    }

    /// Process `ch`; `true` when it is escaped by a preceding backslash.
    pub fn is_escaped(&mut self, ch: char) -> bool {
        !self.process(ch) && self.is_prev_reverse_solidus()
    }

    /// Like [`ReverseSolidus::is_escaped`], with an extra recognition rule
    /// for the escaping backslash itself.
    pub fn is_escaped_if(&mut self, ch: char, rule: bool) -> bool {
        !self.process_if(ch, rule) && self.is_prev_reverse_solidus()
    }

    pub fn next(&mut self) {
        if !self.now {
            self.reverse_solidus = false;
        }
        self.now = false;
    }

    pub fn clear(&mut self) {
        self.now = false;
        self.reverse_solidus = false;
    }
}

/// Remove the backslash from every escaped escapable character.
pub fn remove_backslashes(s: &mut String) {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut rs = ReverseSolidus::new();

    for (i, &c) in chars.iter().enumerate() {
        if rs.is_escaped_if(c, i != chars.len() - 1) && ispunct(c) {
            out.pop();
        }
        out.push(c);
        rs.next();
    }

    *s = out;
}

/// Replace HTML entities (`&name;`, `&#nn;`, `&#xhh;`) with their
/// characters. A backslash-escaped `&` is left alone.
pub fn replace_entities(s: &mut String) {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '&' && (i == 0 || chars[i - 1] != '\\') {
            if let Some((repl, used)) = entity::unescape(&chars[i + 1..]) {
                out.push_str(&repl);
                i += used + 1;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }

    *s = out;
}

/// Read a link destination per CommonMark: either `<…>`-wrapped, or bare
/// with balanced parentheses. Returns an empty string on failure.
pub fn read_link_destination(line: &mut Line) -> String {
    if line.position() >= line.length() {
        return String::new();
    }

    let mut rs = ReverseSolidus::new();
    let mut url = String::new();

    if line.current_char() == '<' {
        url.push(line.current_char());
        line.next_char();

        while line.position() < line.length() {
            url.push(line.current_char());

            if rs.is_not_escaped(line.current_char()) {
                if line.current_char() == '<' {
                    return String::new();
                } else if line.current_char() == '>' {
                    line.next_char();
                    return url;
                }
            }

            line.next_char();
            rs.next();
        }

        String::new()
    } else {
        let mut pc = 0;

        while line.position() < line.length() {
            url.push(line.current_char());

            if rs.is_not_escaped(line.current_char()) {
                if is_ascii_control(line.current_char()) {
                    return String::new();
                } else if line.current_char() == ' ' {
                    if pc == 0 {
                        return url;
                    } else {
                        return String::new();
                    }
                } else if line.current_char() == '(' {
                    pc += 1;
                } else if line.current_char() == ')' {
                    if pc == 0 {
                        return url;
                    } else {
                        pc -= 1;
                    }
                }
            }

            line.next_char();
            rs.next();
        }

        url
    }
}

/// Resumable reference-link title reader. `start_char` is empty on the
/// first call and remembers the delimiter across lines; `end_started`
/// reports that the closing delimiter has been seen.
pub fn read_link_title(
    line: &mut Line,
    start_char: &mut Option<char>,
    start_parenthesis_count: &mut i32,
    start_pos: &mut i64,
    end_started: &mut bool,
) -> String {
    skip_spaces(line);

    if line.position() >= line.length() {
        return String::new();
    }

    if start_char.is_none() {
        let c = line.current_char();
        if c != '"' && c != '\'' && c != '(' {
            return String::new();
        }

        *start_char = Some(c);
        *start_pos = line.position();

        while line.current_char() == '(' {
            *start_parenthesis_count += 1;
            line.next_char();
        }

        if c != '(' {
            line.next_char();
            *start_parenthesis_count = 1;
        }
    }

    if *start_parenthesis_count > 1 {
        return String::new();
    }

    let sc = start_char.unwrap();
    let end_char = if sc == '(' { ')' } else { sc };

    let mut title = String::new();
    let mut rs = ReverseSolidus::new();

    while line.position() < line.length() {
        rs.process(line.current_char());

        if line.current_char() == end_char && !rs.is_prev_reverse_solidus() {
            *end_started = true;
            *start_parenthesis_count -= 1;
            line.next_char();

            if !is_empty_line(line) {
                return String::new();
            }

            break;
        } else if line.current_char() == sc && !rs.is_prev_reverse_solidus() {
            return String::new();
        } else {
            title.push(line.current_char());
        }

        line.next_char();
        rs.next();
    }

    title
}

/// Whether the rest of the line forms a thematic break. State is restored.
pub fn is_horizontal_line(line: &mut Line) -> bool {
    if line.length() < 3 {
        return false;
    }

    let c = match line.current_char() {
        ch @ ('*' | '-' | '_') => ch,
        _ => return false,
    };

    let mut count = 1;
    let st = line.current_state();
    line.next_char();

    while line.position() < line.length() {
        if line.current_char() != c && !is_space(line.current_char()) {
            break;
        } else if line.current_char() == c {
            count += 1;
        }

        line.next_char();
    }

    let pos = line.position();
    line.restore_state(&st);

    count >= 3 && pos == line.length()
}

/// Read an escaped run of characters up to the first unescaped space.
pub fn read_escaped_sequence(line: &mut Line, end_pos: &mut i64) -> String {
    let start = line.position();

    if start >= line.length() {
        return String::new();
    }

    let mut rs = ReverseSolidus::new();

    while line.position() < line.length() {
        if rs.is_not_escaped(line.current_char()) && is_space(line.current_char()) {
            break;
        }

        line.next_char();
        rs.next();
    }

    *end_pos = line.position() - 1;

    line.sliced_copy(start, line.position() - start)
}

/// RFC-lite email check: labels up to 63 characters, no leading or trailing
/// `-`, a dot-bearing domain.
pub fn is_email(url: &str) -> bool {
    fn is_allowed(ch: char) -> bool {
        isalnum(ch)
    }

    fn is_additional(ch: char) -> bool {
        matches!(ch,
            '!' | '#'..='\'' | '*' | '+' | '-'..='/' | '=' | '?' | '^'..='`' | '{'..='~')
    }

    let chars: Vec<char> = url.chars().collect();
    let start = if url.starts_with("mailto:") { 7 } else { 0 };

    let at_pos = match chars[start.min(chars.len())..].iter().position(|&c| c == '@') {
        Some(p) => start + p,
        None => return false,
    };

    if start == at_pos {
        return false;
    }

    let i = skip_chars_if(start, &chars[..at_pos], |c| is_allowed(c) || is_additional(c));

    if i != at_pos {
        return false;
    }

    let check_to_dot = |start: usize, dot_pos: usize| -> bool {
        const MAX_LABEL: usize = 63;

        if dot_pos - start > MAX_LABEL
            || start + 1 > dot_pos
            || start >= chars.len()
            || dot_pos > chars.len()
        {
            return false;
        }

        if chars[start] == '-' || chars[dot_pos - 1] == '-' {
            return false;
        }

        skip_chars_if(start, &chars[..dot_pos], |c| is_allowed(c) || c == '-') == dot_pos
    };

    let mut i = at_pos + 1;
    let mut dot_pos = match chars[i.min(chars.len())..].iter().position(|&c| c == '.') {
        Some(p) => Some(i + p),
        None => return false,
    };

    while let Some(dp) = dot_pos {
        if !check_to_dot(i, dp) {
            return false;
        }

        i = dp + 1;
        dot_pos = chars[i.min(chars.len())..]
            .iter()
            .position(|&c| c == '.')
            .map(|p| i + p);
    }

    check_to_dot(i, chars.len())
}

/// Whether `url` carries a CommonMark-valid scheme followed by a body with
/// no whitespace or angle brackets.
pub fn is_valid_url(url: &str) -> bool {
    let chars: Vec<char> = url.chars().collect();

    if chars.is_empty() || !is_ascii_letter(chars[0]) {
        return false;
    }

    let scheme_end = skip_chars_if(1, &chars, |c| {
        c.is_ascii_alphanumeric() || c == '+' || c == '.' || c == '-'
    });

    if !(2..=32).contains(&scheme_end) || scheme_end >= chars.len() || chars[scheme_end] != ':' {
        return false;
    }

    chars[scheme_end + 1..]
        .iter()
        .all(|&c| !c.is_whitespace() && c != '<' && c != '>')
}

/// Host validation for GFM autolinks: the authority must be non-empty and
/// made of plausible host characters.
pub fn has_valid_host(url: &str) -> bool {
    let rest = if let Some(r) = url.strip_prefix("http://") {
        r
    } else if let Some(r) = url.strip_prefix("https://") {
        r
    } else {
        return false;
    };

    let host: String = rest
        .chars()
        .take_while(|&c| c != '/' && c != '?' && c != '#' && c != ':')
        .collect();

    !host.is_empty()
        && !host.starts_with('.')
        && !host.ends_with('.')
        && host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '.' || c == '_')
        && host.chars().any(|c| c.is_alphanumeric())
}

/// Whether `tag` is a syntactically valid HTML tag name.
pub fn is_valid_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();

    match chars.next() {
        Some(c) if is_ascii_letter(c) => {}
        _ => return false,
    }

    chars.all(|c| is_ascii_letter(c) || c.is_ascii_digit() || c == '-')
}

/// Consume an HTML attribute name; `true` on success.
pub fn read_html_attr_name(line: &mut Line) -> bool {
    let c = line.current_char();
    if is_ascii_letter(c) || c == '_' || c == ':' {
        line.next_char();

        skip_if(line, |c| {
            is_ascii_letter(c) || c.is_ascii_digit() || c == '_' || c == ':' || c == '.' || c == '-'
        });

        true
    } else {
        false
    }
}

/// Consume an HTML attribute value in one of the quoted or unquoted forms;
/// `true` on success.
pub fn read_html_attr_value(line: &mut Line) -> bool {
    let quote = line.current_char();
    if quote == '"' || quote == '\'' {
        line.next_char();
        skip_if(line, |c| c != quote);

        let res = line.current_char() == quote;
        if res {
            line.next_char();
        }

        res
    } else {
        let pos = line.position();
        skip_if(line, |c| {
            !is_space(c) && c != '"' && c != '\'' && c != '=' && c != '<' && c != '>' && c != '`'
        });

        line.position() > pos
    }
}

/// Consume a run of HTML attributes; `true` when everything up to `>` (or
/// end of line) was well-formed.
pub fn read_html_attributes(line: &mut Line) -> bool {
    let mut p = line.position();

    skip_spaces(line);

    while line.position() < line.length() && line.current_char() != '>' {
        skip_spaces(line);

        if p == line.position() {
            return false;
        }

        if line.position() < line.length() && !read_html_attr_name(line) {
            return false;
        }

        p = line.position();

        skip_spaces(line);

        if line.current_char() != '=' {
            if p == line.position() {
                return false;
            } else {
                continue;
            }
        }

        line.next_char();

        skip_spaces(line);

        if !read_html_attr_value(line) {
            return false;
        }

        p = line.position();

        skip_spaces(line);

        if line.current_char() == '/' {
            line.next_char();

            if line.current_char() != '>' {
                return false;
            }
        }

        skip_spaces(line);
    }

    true
}

/// Whether `tag` plus the attributes ahead on `line` form a complete tag.
pub fn is_html_tag(tag: &str, line: &mut Line, closed: bool) -> bool {
    if !is_valid_tag_name(tag) {
        return false;
    }

    if closed {
        return true;
    }

    if !read_html_attributes(line) {
        if line.current_char() == '/' {
            line.next_char();
        } else {
            return false;
        }
    }

    line.current_char() == '>'
}

const RULE_1_TAGS: &[&str] = &["pre", "script", "style", "textarea"];

const RULE_6_TAGS: &[&str] = &[
    "address", "article", "aside", "base", "basefont", "blockquote", "body", "caption", "center",
    "col", "colgroup", "dd", "details", "dialog", "dir", "div", "dl", "dt", "fieldset",
    "figcaption", "figure", "footer", "form", "frame", "frameset", "h1", "h2", "h3", "h4", "h5",
    "h6", "head", "header", "hr", "html", "iframe", "legend", "li", "link", "main", "menu",
    "menuitem", "nav", "noframes", "ol", "optgroup", "option", "p", "param", "section", "search",
    "summary", "table", "tbody", "td", "tfoot", "th", "thead", "title", "tr", "track", "ul",
];

/// Classify the HTML block starting at the cursor into one of the seven
/// CommonMark HTML block rules, consuming the opening tag for rule 7.
/// Returns `-1` (state restored) when no rule matches.
pub fn html_tag_rule(line: &mut Line) -> i32 {
    let st = line.current_state();

    if line.current_char() == '<' {
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

        if !tag.is_empty() {
            tag = tag.to_lowercase();

            let mut closed = false;

            if tag.ends_with('>') {
                closed = true;
                tag.pop();
            }

            if RULE_1_TAGS.contains(&tag.as_str()) {
                return 1;
            } else if tag.starts_with("!--") {
                return 2;
            } else if tag.starts_with('?') {
                return 3;
            } else if tag.starts_with('!')
                && tag.chars().nth(1).map(is_ascii_letter).unwrap_or(false)
            {
                return 4;
            } else if tag.starts_with("![cdata[") {
                return 5;
            } else {
                if let Some(stripped) = tag.strip_prefix('/') {
                    skip_spaces(line);

                    if line.current_char() != '>' {
                        line.restore_state(&st);
                        return -1;
                    }

                    tag = stripped.to_string();
                }

                if let Some(stripped) = tag.strip_suffix('/') {
                    if line.current_char() != '>' {
                        line.restore_state(&st);
                        return -1;
                    }

                    tag = stripped.to_string();
                }

                if RULE_6_TAGS.contains(&tag.as_str()) {
                    return 6;
                } else if is_html_tag(&tag, line, closed) {
                    skip_spaces(line);
                    return 7;
                }
            }
        }
    }

    line.restore_state(&st);

    -1
}

/// Whether the HTML block under the given rule closes on this line.
/// `on_same_line` is set when checking the line the block opened on.
pub fn html_block_closed(line: &mut Line, rule: i32, on_same_line: bool) -> bool {
    match rule {
        1 => {
            while line.position() < line.length() {
                skip_if(line, |c| c != '<');

                if line.current_char() != '<' {
                    return false;
                }

                line.next_char();

                if line.current_char() == '/' {
                    line.next_char();

                    let mut tag = String::new();

                    while line.position() < line.length() && line.current_char() != '>' {
                        tag.push(line.current_char());
                        line.next_char();
                    }

                    tag = tag.to_lowercase();

                    if RULE_1_TAGS.contains(&tag.as_str()) && line.current_char() == '>' {
                        return true;
                    }
                }
            }

            false
        }

        2 => {
            if on_same_line {
                if line.current_char() == '>' {
                    return true;
                } else if line.current_char() == '-' {
                    let st = line.current_state();
                    line.next_char();

                    if line.current_char() == '>' {
                        return true;
                    }

                    line.restore_state(&st);
                }
            }

            skip_if(line, |c| c != '-');

            let mut count = 0;

            while line.position() < line.length() {
                if line.current_char() == '-' {
                    count += 1;
                } else if line.current_char() == '>' {
                    if count > 1 {
                        return true;
                    }

                    count = 0;
                } else {
                    count = 0;
                }

                line.next_char();
            }

            false
        }

        3 => {
            while line.position() < line.length() {
                if line.current_char() == '?' {
                    line.next_char();

                    if line.current_char() == '>' {
                        return true;
                    } else {
                        continue;
                    }
                }

                line.next_char();
            }

            false
        }

        4 => {
            while line.position() < line.length() {
                if line.current_char() == '>' {
                    return true;
                }

                line.next_char();
            }

            false
        }

        5 => {
            let mut count = 0;

            while line.position() < line.length() {
                if line.current_char() == ']' {
                    count += 1;
                } else if line.current_char() == '>' {
                    if count == 2 {
                        return true;
                    }

                    count = 0;
                } else {
                    count = 0;
                }

                line.next_char();
            }

            false
        }

        6 | 7 => {
            if on_same_line {
                false
            } else {
                is_empty_line(line)
            }
        }

        _ => false,
    }
}

/// Indent column that content under a marker at column `c` must reach.
pub fn indent_from_column(c: i64) -> i64 {
    if c != 0 {
        c + 1
    } else {
        c
    }
}

/// Unicode case-fold then uppercase, the normalization applied to
/// reference-link and footnote labels.
pub fn case_folded_upper(s: &str) -> String {
    caseless::default_case_fold_str(s).to_uppercase()
}

/// `<path>/<file>`, with the path part omitted when empty.
pub fn anchor_path(path: &str, file_name: &str) -> String {
    if path.is_empty() {
        file_name.to_string()
    } else {
        format!("{}/{}", path, file_name)
    }
}

/// Normalized key for reference-link and footnote labels:
/// `#<UPPERCASE(casefold(simplified(label)))>/<path>/<file>`.
pub fn label_key(label: &str, path: &str, file_name: &str) -> String {
    format!(
        "#{}/{}",
        case_folded_upper(&simplified(label)),
        anchor_path(path, file_name)
    )
}

/// Heading slug: letters, digits, `-`, `_` kept; whitespace becomes `-`;
/// everything else is dropped.
pub fn string_to_label(s: &str) -> String {
    let mut res = String::with_capacity(s.len());

    for c in s.chars() {
        if c.is_alphabetic() || c.is_numeric() || c == '-' || c == '_' {
            res.push(c);
        } else if c.is_whitespace() {
            res.push('-');
        }
    }

    res
}

/// Concatenated slug of a paragraph's textual content: text, image alt,
/// link text or description, inline code.
pub fn paragraph_to_label(p: &NodeRef<Paragraph>) -> String {
    let mut l = String::new();

    for item in &p.borrow().items {
        match item {
            Item::Text(t) => l.push_str(&string_to_label(&t.borrow().text)),
            Item::Image(i) => {
                let i = i.borrow();
                match &i.p {
                    Some(p) if !p.borrow().is_empty() => l.push_str(&paragraph_to_label(p)),
                    _ if !i.text.is_empty() => l.push_str(&string_to_label(&i.text)),
                    _ => {}
                }
            }
            Item::Link(link) => {
                let link = link.borrow();
                match &link.p {
                    Some(p) if !p.borrow().is_empty() => l.push_str(&paragraph_to_label(p)),
                    _ if !link.text.is_empty() => l.push_str(&string_to_label(&link.text)),
                    _ => {}
                }
            }
            Item::Code(c) => {
                let c = c.borrow();
                if !c.text.is_empty() {
                    l.push_str(&string_to_label(&c.text));
                }
            }
            _ => {}
        }
    }

    l
}
