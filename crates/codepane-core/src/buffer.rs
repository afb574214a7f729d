//! Text storage.
//!
//! [`TextBuffer`] is the single source of truth for document content. It is backed by a
//! [`ropey::Rope`] and addressed in character offsets. Every mutation bumps a monotonically
//! increasing edit counter which is stamped on the resulting [`EditDelta`].

use crate::delta::EditDelta;
use crate::error::EditorError;
use ropey::Rope;
use std::ops::Range;

/// Receives edit notifications synchronously from [`TextBuffer::replace_notifying`].
///
/// Observers see the buffer in its post-edit state and must finish updating their derived state
/// before returning.
pub trait BufferObserver {
    /// Called once per successful edit.
    fn buffer_did_change(&mut self, buffer: &TextBuffer, delta: &EditDelta);
}

/// A mutable character sequence with an edit counter.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    rope: Rope,
    edit_counter: u64,
}

impl TextBuffer {
    /// Create a buffer holding `text`.
    pub fn new(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            edit_counter: 0,
        }
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns `true` if the buffer holds no text.
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Number of edits applied so far.
    pub fn edit_counter(&self) -> u64 {
        self.edit_counter
    }

    /// The underlying rope.
    pub fn rope(&self) -> &Rope {
        &self.rope
    }

    /// The whole text.
    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Read the text in `range`.
    pub fn read(&self, range: Range<usize>) -> Result<String, EditorError> {
        self.check_range(&range)?;
        Ok(self.rope.slice(range).to_string())
    }

    /// Replace `range` with `text`.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> Result<EditDelta, EditorError> {
        self.replace_notifying(range, text, &mut [])
    }

    /// Replace `range` with `text` and notify every observer before returning.
    pub fn replace_notifying(
        &mut self,
        range: Range<usize>,
        text: &str,
        observers: &mut [&mut dyn BufferObserver],
    ) -> Result<EditDelta, EditorError> {
        self.check_range(&range)?;

        if !range.is_empty() {
            self.rope.remove(range.clone());
        }
        if !text.is_empty() {
            self.rope.insert(range.start, text);
        }
        self.edit_counter += 1;

        let delta = EditDelta {
            range_start: range.start,
            range_length: range.len(),
            inserted_length: text.chars().count(),
            edit_counter: self.edit_counter,
        };
        tracing::trace!(?delta, "buffer edited");

        for observer in observers.iter_mut() {
            observer.buffer_did_change(self, &delta);
        }
        Ok(delta)
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), EditorError> {
        let len = self.len();
        if range.end > len {
            return Err(EditorError::out_of_bounds("range end", range.end, len));
        }
        if range.start > range.end {
            return Err(EditorError::out_of_bounds(
                "range start",
                range.start,
                range.end,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(EditDelta, String)>,
    }

    impl BufferObserver for Recorder {
        fn buffer_did_change(&mut self, buffer: &TextBuffer, delta: &EditDelta) {
            self.seen.push((*delta, buffer.text()));
        }
    }

    #[test]
    fn test_replace_and_read() {
        let mut buffer = TextBuffer::new("Hello World");
        let delta = buffer.replace(6..11, "你好").unwrap();
        assert_eq!(buffer.text(), "Hello 你好");
        assert_eq!(buffer.len(), 8);
        assert_eq!(delta.range_start, 6);
        assert_eq!(delta.range_length, 5);
        assert_eq!(delta.inserted_length, 2);
        assert_eq!(delta.edit_counter, 1);
        assert_eq!(buffer.read(6..8).unwrap(), "你好");
    }

    #[test]
    fn test_out_of_bounds_is_rejected_without_mutation() {
        let mut buffer = TextBuffer::new("abc");
        assert!(matches!(
            buffer.replace(2..4, "x"),
            Err(EditorError::OutOfBounds { value: 4, limit: 3, .. })
        ));
        #[allow(clippy::reversed_empty_ranges)]
        let reversed = 2..1;
        assert!(buffer.read(reversed).is_err());
        assert_eq!(buffer.text(), "abc");
        assert_eq!(buffer.edit_counter(), 0);
    }

    #[test]
    fn test_counter_increases_and_observers_see_new_text() {
        let mut buffer = TextBuffer::new("");
        let mut recorder = Recorder::default();
        buffer
            .replace_notifying(0..0, "ab", &mut [&mut recorder])
            .unwrap();
        buffer
            .replace_notifying(1..1, "", &mut [&mut recorder])
            .unwrap();
        assert_eq!(recorder.seen.len(), 2);
        assert_eq!(recorder.seen[0].1, "ab");
        assert!(recorder.seen[0].0.edit_counter < recorder.seen[1].0.edit_counter);
        assert!(recorder.seen[1].0.is_noop());
    }
}
