//! Matching-bracket lookup.
//!
//! Pairs `()`, `[]` and `{}`. Brackets inside string and comment spans do not count, so a `)` in
//! a string literal never closes a `(` in code.

use codepane_syntax::{Category, ColourSpan};
use ropey::Rope;

fn partner(c: char) -> Option<(char, bool)> {
    match c {
        '(' => Some((')', true)),
        '[' => Some((']', true)),
        '{' => Some(('}', true)),
        ')' => Some(('(', false)),
        ']' => Some(('[', false)),
        '}' => Some(('{', false)),
        _ => None,
    }
}

fn is_quoted(spans: &[ColourSpan], offset: usize) -> bool {
    let after = spans.partition_point(|s| s.start <= offset);
    after > 0 && {
        let span = spans[after - 1];
        offset < span.end && matches!(span.category, Category::String | Category::Comment)
    }
}

/// Offset of the bracket paired with the one at `offset`.
///
/// `spans` are the buffer's colour spans, ordered by start. Returns `None` if the character at
/// `offset` is not a bracket, sits in a string or comment, or has no partner.
pub fn matching_bracket(rope: &Rope, spans: &[ColourSpan], offset: usize) -> Option<usize> {
    if offset >= rope.len_chars() || is_quoted(spans, offset) {
        return None;
    }
    let bracket = rope.char(offset);
    let (target, forward) = partner(bracket)?;

    let mut depth = 0usize;
    if forward {
        for (pos, c) in (offset + 1..).zip(rope.chars_at(offset + 1)) {
            if (c != bracket && c != target) || is_quoted(spans, pos) {
                continue;
            }
            if c == target {
                if depth == 0 {
                    return Some(pos);
                }
                depth -= 1;
            } else {
                depth += 1;
            }
        }
    } else {
        let mut chars = rope.chars_at(offset);
        let mut pos = offset;
        while let Some(c) = chars.prev() {
            pos -= 1;
            if (c != bracket && c != target) || is_quoted(spans, pos) {
                continue;
            }
            if c == target {
                if depth == 0 {
                    return Some(pos);
                }
                depth -= 1;
            } else {
                depth += 1;
            }
        }
    }
    None
}
