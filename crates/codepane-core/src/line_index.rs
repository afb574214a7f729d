//! Logical line index.
//!
//! Maps character offsets to 0-based line numbers and back. Lines are terminated by `"\n"`,
//! `"\r\n"` or a lone `"\r"`; a line's length excludes its terminator, and together the lines
//! partition the buffer exactly.
//!
//! The index is updated incrementally from [`EditDelta`]s: only the lines touched by the edit
//! (plus one line of context on either side) are rescanned, and every later line start is shifted
//! by the net length change.

use crate::delta::EditDelta;
use crate::error::EditorError;
use ropey::Rope;
use std::ops::Range;

/// Start and length (excluding the terminator) of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineRange {
    /// Character offset of the first character.
    pub start: usize,
    /// Length in characters, excluding the terminator.
    pub len: usize,
}

impl LineRange {
    /// Exclusive end offset (before the terminator).
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// How an edit changed the line structure.
///
/// Old line numbers refer to the index before the edit, new ones to the index after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineDelta {
    /// Old line containing the start of the replaced range.
    pub first_line: usize,
    /// Old line containing the end of the replaced range.
    pub last_line: usize,
    /// New line containing the end of the inserted text.
    pub new_last_line: usize,
    /// Old lines whose whole text was removed by a deletion spanning more than one line.
    pub consumed: Range<usize>,
    /// `true` if the edit inserted text at the very start of `first_line` without removing any.
    pub inserted_at_line_start: bool,
    /// Line count before the edit.
    pub old_line_count: usize,
    /// Line count after the edit.
    pub new_line_count: usize,
}

impl LineDelta {
    /// Map an old line number into the new index, or `None` if the line was consumed.
    pub fn map_line(&self, line: usize) -> Option<usize> {
        if line < self.first_line {
            Some(line)
        } else if line > self.last_line {
            Some(line - self.last_line + self.new_last_line)
        } else if self.consumed.contains(&line) {
            None
        } else if line == self.first_line && !self.inserted_at_line_start {
            Some(line)
        } else {
            Some(self.new_last_line)
        }
    }

    /// New lines whose content changed.
    pub fn touched_lines(&self) -> Range<usize> {
        self.first_line..self.new_last_line + 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LineSlot {
    start: usize,
    /// Width of the terminator ending this line (0 for the last line).
    terminator: u8,
}

/// Line start table for one buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineIndex {
    lines: Vec<LineSlot>,
    len: usize,
    last_applied: u64,
}

impl LineIndex {
    /// Build an index over `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_rope(&Rope::from_str(text), 0)
    }

    /// Build an index over `rope`, recording `edit_counter` as the last applied edit.
    pub fn from_rope(rope: &Rope, edit_counter: u64) -> Self {
        let len = rope.len_chars();
        Self {
            lines: scan_lines(rope, 0, len, true),
            len,
            last_applied: edit_counter,
        }
    }

    /// Total line count (at least 1).
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total character count of the indexed text.
    pub fn char_count(&self) -> usize {
        self.len
    }

    /// Edit counter of the last applied delta.
    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Line containing `offset`. An offset inside a terminator belongs to the line it ends.
    pub fn line_containing(&self, offset: usize) -> Result<usize, EditorError> {
        if offset > self.len {
            return Err(EditorError::out_of_bounds("offset", offset, self.len));
        }
        Ok(self.line_of(offset))
    }

    /// Start and length of `line`.
    pub fn line_range(&self, line: usize) -> Result<LineRange, EditorError> {
        let slot = self.slot(line)?;
        let end = self.end_with_terminator(line) - usize::from(slot.terminator);
        Ok(LineRange {
            start: slot.start,
            len: end - slot.start,
        })
    }

    /// Start offset of `line`.
    pub fn line_start(&self, line: usize) -> Result<usize, EditorError> {
        self.slot(line).map(|slot| slot.start)
    }

    /// Offset one past the terminator of `line` (or the buffer end for the last line).
    pub fn line_end_with_terminator(&self, line: usize) -> Result<usize, EditorError> {
        self.slot(line)?;
        Ok(self.end_with_terminator(line))
    }

    /// Returns `true` if `offset` is the start of some line.
    pub fn is_line_start(&self, offset: usize) -> bool {
        offset <= self.len && self.lines[self.line_of(offset)].start == offset
    }

    /// Start of the first line that begins strictly after `offset`, if any.
    pub fn next_line_start_after(&self, offset: usize) -> Option<usize> {
        let next = self.lines.partition_point(|slot| slot.start <= offset);
        self.lines.get(next).map(|slot| slot.start)
    }

    /// All lines, in order.
    pub fn iter(&self) -> impl Iterator<Item = LineRange> + '_ {
        (0..self.lines.len()).filter_map(|line| self.line_range(line).ok())
    }

    /// Apply an edit. `rope` is the buffer after the edit.
    pub fn apply(&mut self, rope: &Rope, delta: &EditDelta) -> Result<LineDelta, EditorError> {
        if delta.edit_counter <= self.last_applied {
            return Err(EditorError::StaleNotification {
                received: delta.edit_counter,
                last_applied: self.last_applied,
            });
        }
        if delta.old_end() > self.len {
            return Err(EditorError::out_of_bounds(
                "edit end",
                delta.old_end(),
                self.len,
            ));
        }
        let new_len = rope.len_chars();
        if new_len + delta.range_length != self.len + delta.inserted_length {
            return Err(EditorError::out_of_bounds(
                "buffer length",
                new_len,
                self.len + delta.inserted_length - delta.range_length,
            ));
        }

        let old_line_count = self.lines.len();
        let s = delta.range_start;
        let first_line = self.line_of(s);
        let last_line = self.line_of(delta.old_end());

        // A line is consumed when a multi-line deletion covers all of its text. The first line
        // survives if text before `s` remains on it; the last line survives if the deletion
        // only reached its start or left some of its text.
        let mut consumed_start = first_line + 1;
        if s == self.lines[first_line].start && first_line < last_line {
            consumed_start = first_line;
        }
        let mut consumed_end = last_line;
        let last_text_end =
            self.end_with_terminator(last_line) - usize::from(self.lines[last_line].terminator);
        if last_line > first_line
            && self.lines[last_line].start < delta.old_end()
            && last_text_end <= delta.old_end()
        {
            consumed_end = last_line + 1;
        }
        let consumed = consumed_start..consumed_end.max(consumed_start);
        let inserted_at_line_start =
            s == self.lines[first_line].start && delta.range_length == 0;

        // Rescan from one line before the edit up to (excluding) the old line two past its end.
        let rescan_first = first_line.saturating_sub(1);
        let scan_start = self.lines[rescan_first].start;
        let tail_line = last_line + 2;
        let (scan_end, has_tail) = match self.lines.get(tail_line) {
            Some(slot) => (delta.shift(slot.start), true),
            None => (new_len, false),
        };

        let rescanned = scan_lines(rope, scan_start, scan_end, !has_tail);
        let tail_end = tail_line.min(old_line_count);
        let mut tail: Vec<LineSlot> = self.lines.drain(tail_end..).collect();
        for slot in &mut tail {
            slot.start = delta.shift(slot.start);
        }
        self.lines.truncate(rescan_first);
        self.lines.extend(rescanned);
        self.lines.extend(tail);
        self.len = new_len;
        self.last_applied = delta.edit_counter;

        let new_last_line = self.line_of(delta.new_end());
        tracing::trace!(
            first_line,
            last_line,
            new_last_line,
            rescanned_from = scan_start,
            rescanned_to = scan_end,
            "line index updated"
        );

        Ok(LineDelta {
            first_line,
            last_line,
            new_last_line,
            consumed,
            inserted_at_line_start,
            old_line_count,
            new_line_count: self.lines.len(),
        })
    }

    fn slot(&self, line: usize) -> Result<&LineSlot, EditorError> {
        self.lines.get(line).ok_or_else(|| {
            EditorError::out_of_bounds("line", line, self.lines.len().saturating_sub(1))
        })
    }

    fn line_of(&self, offset: usize) -> usize {
        self.lines
            .partition_point(|slot| slot.start <= offset)
            .saturating_sub(1)
    }

    fn end_with_terminator(&self, line: usize) -> usize {
        self.lines
            .get(line + 1)
            .map_or(self.len, |next| next.start)
    }
}

impl Default for LineIndex {
    fn default() -> Self {
        Self::from_text("")
    }
}

/// Scan `start..end` of `rope` for line terminators.
///
/// The first slot starts at `start`. A line start found exactly at `end` is only emitted when
/// `include_end` is set (i.e. when `end` is the end of the buffer).
fn scan_lines(rope: &Rope, start: usize, end: usize, include_end: bool) -> Vec<LineSlot> {
    let mut slots = vec![LineSlot {
        start,
        terminator: 0,
    }];
    let mut chars = rope.chars_at(start).peekable();
    let mut pos = start;
    while pos < end {
        let Some(ch) = chars.next() else {
            break;
        };
        let width = match ch {
            '\n' => 1,
            '\r' if chars.peek() == Some(&'\n') => {
                chars.next();
                2
            }
            '\r' => 1,
            _ => 0,
        };
        if width == 0 {
            pos += 1;
            continue;
        }
        pos += width;
        if let Some(last) = slots.last_mut() {
            last.terminator = width as u8;
        }
        if pos < end || include_end {
            slots.push(LineSlot {
                start: pos,
                terminator: 0,
            });
        }
    }
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;

    fn ranges(index: &LineIndex) -> Vec<(usize, usize)> {
        index.iter().map(|r| (r.start, r.len)).collect()
    }

    fn edit(
        buffer: &mut TextBuffer,
        index: &mut LineIndex,
        range: Range<usize>,
        text: &str,
    ) -> LineDelta {
        let delta = buffer.replace(range, text).unwrap();
        let line_delta = index.apply(buffer.rope(), &delta).unwrap();
        assert_eq!(
            *index,
            LineIndex::from_rope(buffer.rope(), buffer.edit_counter()),
            "incremental index diverged after {delta:?}"
        );
        line_delta
    }

    #[test]
    fn test_new_line_index() {
        let index = LineIndex::from_text("");
        assert_eq!(index.line_count(), 1);
        assert_eq!(index.char_count(), 0);
        assert_eq!(index.line_range(0).unwrap(), LineRange { start: 0, len: 0 });
    }

    #[test]
    fn test_mixed_terminators() {
        let index = LineIndex::from_text("a\nbb\r\nc\rd\n");
        assert_eq!(ranges(&index), vec![(0, 1), (2, 2), (6, 1), (8, 1), (10, 0)]);
        assert_eq!(index.line_containing(0).unwrap(), 0);
        assert_eq!(index.line_containing(4).unwrap(), 1);
        assert_eq!(index.line_containing(5).unwrap(), 1);
        assert_eq!(index.line_containing(6).unwrap(), 2);
        assert_eq!(index.line_containing(10).unwrap(), 4);
        assert!(matches!(
            index.line_containing(11),
            Err(EditorError::OutOfBounds { value: 11, limit: 10, .. })
        ));
        assert!(index.line_range(5).is_err());
    }

    #[test]
    fn test_utf8_cjk() {
        let index = LineIndex::from_text("你好\n世界");
        assert_eq!(index.line_count(), 2);
        assert_eq!(index.char_count(), 5);
        assert_eq!(index.line_start(1).unwrap(), 3);
        assert_eq!(index.line_containing(4).unwrap(), 1);
    }

    #[test]
    fn test_incremental_edits_match_rebuild() {
        let mut buffer = TextBuffer::new("one\ntwo\nthree\nfour\n");
        let mut index = LineIndex::from_rope(buffer.rope(), 0);

        edit(&mut buffer, &mut index, 4..4, "x\ny\n");
        edit(&mut buffer, &mut index, 2..9, "");
        edit(&mut buffer, &mut index, 0..0, "\r");
        edit(&mut buffer, &mut index, 1..1, "\n");
        let len = buffer.len();
        edit(&mut buffer, &mut index, len..len, "tail");
        let len = buffer.len();
        edit(&mut buffer, &mut index, 0..len, "");
        assert_eq!(index.line_count(), 1);
    }

    #[test]
    fn test_crlf_merge_and_split() {
        let mut buffer = TextBuffer::new("a\rb\nc");
        let mut index = LineIndex::from_rope(buffer.rope(), 0);
        // Joining "\r" and "\n" into one terminator.
        edit(&mut buffer, &mut index, 2..3, "");
        assert_eq!(ranges(&index), vec![(0, 1), (3, 1)]);
        // Splitting it again.
        edit(&mut buffer, &mut index, 2..2, "z");
        assert_eq!(ranges(&index), vec![(0, 1), (2, 1), (4, 1)]);
    }

    #[test]
    fn test_line_delta_classification() {
        let mut buffer = TextBuffer::new("l0\nl1\nl2\nl3\nl4");
        let mut index = LineIndex::from_rope(buffer.rope(), 0);

        // Two newlines inserted at the start of line 2.
        let delta = edit(&mut buffer, &mut index, 6..6, "\n\n");
        assert_eq!(delta.first_line, 2);
        assert!(delta.inserted_at_line_start);
        assert_eq!(delta.map_line(1), Some(1));
        assert_eq!(delta.map_line(2), Some(4));
        assert_eq!(delta.map_line(4), Some(6));

        // Delete lines 1 and 2 entirely.
        let mut buffer = TextBuffer::new("l0\nl1\nl2\nl3\nl4");
        let mut index = LineIndex::from_rope(buffer.rope(), 0);
        let delta = edit(&mut buffer, &mut index, 3..9, "");
        assert_eq!(delta.consumed, 1..3);
        assert_eq!(delta.map_line(0), Some(0));
        assert_eq!(delta.map_line(1), None);
        assert_eq!(delta.map_line(2), None);
        assert_eq!(delta.map_line(3), Some(1));
        assert_eq!(delta.map_line(4), Some(2));

        // A deletion starting mid-line consumes the last line once all its text is gone.
        let mut buffer = TextBuffer::new("l0\nl1\nl2\nl3\n");
        let mut index = LineIndex::from_rope(buffer.rope(), 0);
        let delta = edit(&mut buffer, &mut index, 2..8, "");
        assert_eq!(delta.consumed, 1..3);
        assert_eq!(delta.map_line(0), Some(0));
        assert_eq!(delta.map_line(2), None);
        assert_eq!(delta.map_line(3), Some(1));

        // Leaving part of the last line's text keeps it, merged into the first.
        let mut buffer = TextBuffer::new("l0\nl1\nl2\n");
        let mut index = LineIndex::from_rope(buffer.rope(), 0);
        let delta = edit(&mut buffer, &mut index, 2..4, "");
        assert_eq!(delta.consumed, 1..1);
        assert_eq!(delta.map_line(1), Some(0));

        // Splitting a line keeps the first half on the original line number.
        let mut buffer = TextBuffer::new("abc\ndef");
        let mut index = LineIndex::from_rope(buffer.rope(), 0);
        let delta = edit(&mut buffer, &mut index, 1..1, "\n");
        assert_eq!(delta.map_line(0), Some(0));
        assert_eq!(delta.map_line(1), Some(2));
    }

    #[test]
    fn test_stale_delta_is_not_applied() {
        let mut buffer = TextBuffer::new("a\nb");
        let mut index = LineIndex::from_rope(buffer.rope(), 0);
        let first = buffer.replace(0..0, "\n").unwrap();
        index.apply(buffer.rope(), &first).unwrap();
        let before = index.clone();
        assert!(matches!(
            index.apply(buffer.rope(), &first),
            Err(EditorError::StaleNotification {
                received: 1,
                last_applied: 1
            })
        ));
        assert_eq!(index, before);
    }
}
