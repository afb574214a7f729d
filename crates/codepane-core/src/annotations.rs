//! Line-keyed annotations.
//!
//! Annotations (syntax errors, breakpoint markers) are attached to lines rather than offsets.
//! They are assigned in bulk with [`AnnotationIndex::set_annotations`], which replaces the whole
//! set, and are re-keyed on every edit from the [`LineDelta`] produced by the line index.

use crate::error::EditorError;
use crate::line_index::LineDelta;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Annotation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    /// A syntax error reported by an external checker.
    SyntaxError,
    /// A breakpoint marker.
    Breakpoint,
}

/// A marker attached to a line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    /// 0-based line index.
    pub line: usize,
    /// Marker kind.
    pub kind: AnnotationKind,
    /// Human readable message (may be empty).
    #[serde(default)]
    pub message: String,
    /// Optional 0-based column where the problem starts.
    #[serde(default)]
    pub column: Option<usize>,
    /// Optional length (in characters) of the problem.
    #[serde(default)]
    pub length: Option<usize>,
}

impl Annotation {
    /// A syntax error on `line`.
    pub fn syntax_error(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            kind: AnnotationKind::SyntaxError,
            message: message.into(),
            column: None,
            length: None,
        }
    }

    /// A breakpoint marker on `line`.
    pub fn breakpoint(line: usize) -> Self {
        Self {
            line,
            kind: AnnotationKind::Breakpoint,
            message: String::new(),
            column: None,
            length: None,
        }
    }

    /// Narrow the annotation to `column..column + length` within its line.
    pub fn with_span(mut self, column: usize, length: usize) -> Self {
        self.column = Some(column);
        self.length = Some(length);
        self
    }
}

/// External owner of breakpoints.
///
/// The breakpoint set is kept by the host (usually a debugger integration), independent of the
/// error annotations stored in an [`AnnotationIndex`]. Gutter queries merge both.
pub trait BreakpointDelegate {
    /// 0-based lines that currently carry a breakpoint.
    fn breakpoints(&self) -> BTreeSet<usize>;

    /// The user clicked the breakpoint marker area of `line`.
    fn toggle_breakpoint(&self, line: usize) {
        let _ = line;
    }
}

/// Annotations of one view, keyed by line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationIndex {
    by_line: BTreeMap<usize, Vec<Annotation>>,
    last_applied: u64,
}

impl AnnotationIndex {
    /// Create an empty index synchronized with `edit_counter`.
    pub fn new(edit_counter: u64) -> Self {
        Self {
            by_line: BTreeMap::new(),
            last_applied: edit_counter,
        }
    }

    /// Replace the whole annotation set.
    ///
    /// Every annotation must refer to a line below `line_count`; otherwise nothing is replaced
    /// and [`EditorError::OutOfBounds`] is returned.
    pub fn set_annotations(
        &mut self,
        annotations: Vec<Annotation>,
        line_count: usize,
    ) -> Result<(), EditorError> {
        if let Some(bad) = annotations.iter().find(|a| a.line >= line_count) {
            return Err(EditorError::out_of_bounds(
                "annotation line",
                bad.line,
                line_count.saturating_sub(1),
            ));
        }

        self.by_line.clear();
        for annotation in annotations {
            self.by_line
                .entry(annotation.line)
                .or_default()
                .push(annotation);
        }
        Ok(())
    }

    /// Annotations on `line`.
    pub fn annotations_for_line(&self, line: usize) -> &[Annotation] {
        self.by_line.get(&line).map_or(&[], Vec::as_slice)
    }

    /// All annotations ordered by line.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.by_line.values().flatten()
    }

    /// Lines that carry at least one annotation.
    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.by_line.keys().copied()
    }

    /// Total number of annotations.
    pub fn len(&self) -> usize {
        self.by_line.values().map(Vec::len).sum()
    }

    /// Returns `true` if there are no annotations.
    pub fn is_empty(&self) -> bool {
        self.by_line.is_empty()
    }

    /// Remove every annotation.
    pub fn clear(&mut self) {
        self.by_line.clear();
    }

    /// Drop annotations on lines at or past `line_count` and mark the index as synchronized
    /// with `edit_counter`. Returns the number of dropped annotations.
    pub fn resync(&mut self, line_count: usize, edit_counter: u64) -> usize {
        let dropped = self.by_line.split_off(&line_count);
        self.last_applied = edit_counter;
        dropped.values().map(Vec::len).sum()
    }

    /// Re-key annotations after an edit. Returns the number of dropped annotations.
    pub fn apply(&mut self, delta: &LineDelta, edit_counter: u64) -> Result<usize, EditorError> {
        if edit_counter <= self.last_applied {
            return Err(EditorError::StaleNotification {
                received: edit_counter,
                last_applied: self.last_applied,
            });
        }
        self.last_applied = edit_counter;

        // Lines before the edit are untouched.
        let moved = self.by_line.split_off(&delta.first_line);
        let mut dropped = 0;
        for (line, annotations) in moved {
            let Some(new_line) = delta.map_line(line) else {
                dropped += annotations.len();
                continue;
            };
            let slot = self.by_line.entry(new_line).or_default();
            slot.extend(annotations.into_iter().map(|mut a| {
                a.line = new_line;
                a
            }));
        }

        if dropped > 0 {
            tracing::debug!(dropped, "dropped annotations on deleted lines");
        }
        Ok(dropped)
    }
}
