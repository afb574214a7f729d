//! Structured edit deltas.
//!
//! Every successful [`crate::TextBuffer::replace`] produces one [`EditDelta`] describing a single
//! contiguous replacement in **character offsets** (Unicode scalar values). Derived-state
//! consumers (line index, colouring cache, annotations) update themselves from the delta alone,
//! without diffing old and new text.

use std::ops::Range;

/// A single contiguous replace operation.
///
/// Semantics:
/// - `range_start..range_start + range_length` is the replaced range in the document **before**
///   the edit.
/// - `range_start..range_start + inserted_length` is the inserted text in the document **after**
///   the edit.
/// - `edit_counter` is the buffer's counter after the edit. Observers use it to detect stale or
///   reordered notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EditDelta {
    /// Start character offset of the replaced range.
    pub range_start: usize,
    /// Number of characters removed.
    pub range_length: usize,
    /// Number of characters inserted.
    pub inserted_length: usize,
    /// Buffer edit counter after this edit.
    pub edit_counter: u64,
}

impl EditDelta {
    /// Exclusive end of the replaced range, in the pre-edit document.
    pub fn old_end(&self) -> usize {
        self.range_start + self.range_length
    }

    /// Exclusive end of the inserted text, in the post-edit document.
    pub fn new_end(&self) -> usize {
        self.range_start + self.inserted_length
    }

    /// The replaced range in the pre-edit document.
    pub fn old_range(&self) -> Range<usize> {
        self.range_start..self.old_end()
    }

    /// The inserted range in the post-edit document.
    pub fn new_range(&self) -> Range<usize> {
        self.range_start..self.new_end()
    }

    /// Map a pre-edit offset at or after [`EditDelta::old_end`] into the post-edit document.
    ///
    /// Offsets inside the replaced range collapse to the end of the inserted text.
    pub fn shift(&self, offset: usize) -> usize {
        if offset < self.range_start {
            offset
        } else if offset < self.old_end() {
            self.new_end()
        } else {
            offset - self.range_length + self.inserted_length
        }
    }

    /// Returns `true` if the edit neither removed nor inserted anything.
    pub fn is_noop(&self) -> bool {
        self.range_length == 0 && self.inserted_length == 0
    }
}
