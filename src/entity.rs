use crate::ctype::{isdigit, isxdigit};
use std::char;
use std::cmp::min;

include!(concat!(env!("OUT_DIR"), "/entitydata.rs"));

pub const ENTITY_MIN_LENGTH: usize = 2;
pub const ENTITY_MAX_LENGTH: usize = 31;

/// Decode the entity at the start of `text` (everything after a `&`).
///
/// Returns the replacement string and the number of characters consumed,
/// including the terminating `;`, or `None` if no valid entity starts here.
pub fn unescape(text: &[char]) -> Option<(String, usize)> {
    if text.len() >= 3 && text[0] == '#' {
        let mut codepoint: u32 = 0;
        let mut i = 0;

        let num_digits = if isdigit(text[1]) {
            i = 1;
            while i < text.len() && isdigit(text[i]) {
                codepoint = (codepoint * 10) + (text[i] as u32 - '0' as u32);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 1
        } else if text[1] == 'x' || text[1] == 'X' {
            i = 2;
            while i < text.len() && isxdigit(text[i]) {
                codepoint = (codepoint * 16) + ((text[i] as u32 | 32) % 39 - 9);
                codepoint = min(codepoint, 0x11_0000);
                i += 1;
            }
            i - 2
        } else {
            0
        };

        if (1..=8).contains(&num_digits) && i < text.len() && text[i] == ';' {
            if codepoint == 0 || (0xD800..=0xE000).contains(&codepoint) || codepoint >= 0x110000 {
                codepoint = 0xFFFD;
            }
            return Some((
                char::from_u32(codepoint).unwrap_or('\u{FFFD}').to_string(),
                i + 1,
            ));
        }

        return None;
    }

    let size = min(text.len(), ENTITY_MAX_LENGTH);
    for i in ENTITY_MIN_LENGTH..size {
        if text[i] == ' ' {
            return None;
        }

        if text[i] == ';' {
            let name: String = text[..i].iter().collect();
            return ENTITY_MAP.get(name.as_str()).map(|s| (s.to_string(), i + 1));
        }
    }

    None
}
