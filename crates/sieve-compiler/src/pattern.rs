//! Filter pattern to regular expression translation
//!
//! Pure string transformation; nothing here builds a live regex.

use sieve_core::types::PositionFlags;

/// What `^` becomes: one separator character or the end of input.
///
/// Separators are everything outside letters, digits and `_ - . %`.
pub const SEPARATOR: &str = r"([\x00-\x24\x26-\x2C\x2F\x3A-\x40\x5B-\x5E\x60\x7B-\x80]|$)";

/// The inner expression of a `/.../` body, if it is one.
pub fn regex_literal(body: &str) -> Option<&str> {
    if body.len() >= 2 && body.starts_with('/') && body.ends_with('/') {
        Some(&body[1..body.len() - 1])
    } else {
        None
    }
}

/// Translate a filter body (anchors already stripped) into regex source.
///
/// `*` matches any sequence, `^` a separator or the end, every other
/// metacharacter is escaped. `START` and `DOMAIN_START` anchor at the
/// beginning, `END` at the end.
pub fn filter_to_regex(body: &str, position: PositionFlags) -> String {
    let mut out = String::with_capacity(body.len() * 2 + 2);

    if position.intersects(PositionFlags::START | PositionFlags::DOMAIN_START) {
        out.push('^');
    }

    for ch in body.chars() {
        match ch {
            '^' => out.push_str(SEPARATOR),
            '*' => out.push_str(".*"),
            '.' | '+' | '?' | '$' | '{' | '}' | '(' | ')' | '[' | ']' | '\\' | '|' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }

    if position.contains(PositionFlags::END) {
        out.push('$');
    }

    out
}
