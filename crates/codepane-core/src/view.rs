//! Per-view state.
//!
//! A [`ViewState`] is what one presentation surface keeps about the buffer it displays: its own
//! line index, colouring cache, annotations and autocomplete engine, plus its caret, selection and
//! scroll position. Views sharing a buffer never share any of this.

use crate::annotations::{Annotation, AnnotationIndex, AnnotationKind, BreakpointDelegate};
use crate::autocomplete::{AutocompleteEngine, AutocompleteOptions, WordSupplier, word_prefix_at};
use crate::brackets;
use crate::buffer::{BufferObserver, TextBuffer};
use crate::colouring::{ColouringDelegate, ColouringOptions, Colourizer};
use crate::config::{EditorConfig, GutterOptions};
use crate::delta::EditDelta;
use crate::error::EditorError;
use crate::line_index::{LineIndex, LineRange};
use crate::workspace::{BufferId, ViewId};
use codepane_syntax::{ColourSpan, Syntax};
use std::collections::BTreeSet;
use std::ops::Range;
use std::rc::Weak;
use std::sync::Arc;

/// Sent to a view's subscribers after every edit of its buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedrawRequest {
    /// The view that needs repainting.
    pub view: ViewId,
    /// Character range to repaint, widened to whole lines and to the recoloured region.
    pub range: Range<usize>,
    /// Lines to repaint (including the gutter).
    pub lines: Range<usize>,
    /// Whether the line count changed (every later gutter number moved).
    pub line_count_changed: bool,
    /// Buffer edit counter that caused the request.
    pub edit_counter: u64,
}

/// Callback receiving [`RedrawRequest`]s.
pub type RedrawCallback = Box<dyn FnMut(&RedrawRequest)>;

/// One gutter row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GutterLine {
    /// 0-based line index.
    pub line: usize,
    /// Displayed number, if line numbers are shown.
    pub number: Option<usize>,
    /// Visible annotations on this line.
    pub annotations: Vec<Annotation>,
    /// Whether the line carries a breakpoint (annotation or breakpoint delegate).
    pub breakpoint: bool,
    /// Whether this is the caret's line and current-line highlighting is on.
    pub is_current: bool,
}

/// Buffer text together with its colour spans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledText {
    /// The whole buffer text.
    pub text: String,
    /// Colour spans over `text`, in character offsets.
    pub spans: Vec<ColourSpan>,
}

/// Derived state and presentation state of one view.
pub struct ViewState {
    id: ViewId,
    buffer: BufferId,
    config: EditorConfig,
    lines: LineIndex,
    colourizer: Colourizer,
    annotations: AnnotationIndex,
    autocomplete: AutocompleteEngine,
    colouring_delegate: Option<Weak<dyn ColouringDelegate>>,
    breakpoints: Option<Weak<dyn BreakpointDelegate>>,
    caret: usize,
    selection: Option<Range<usize>>,
    scroll_top: usize,
    callbacks: Vec<RedrawCallback>,
}

impl std::fmt::Debug for ViewState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewState")
            .field("id", &self.id)
            .field("buffer", &self.buffer)
            .field("syntax", &self.config.syntax_definition)
            .field("line_count", &self.lines.line_count())
            .field("annotations", &self.annotations.len())
            .field("caret", &self.caret)
            .field("selection", &self.selection)
            .field("scroll_top", &self.scroll_top)
            .field("callbacks", &self.callbacks.len())
            .finish()
    }
}

impl ViewState {
    /// Create a view over `buffer`.
    pub fn new(
        id: ViewId,
        buffer_id: BufferId,
        buffer: &TextBuffer,
        syntax: Arc<Syntax>,
        mut config: EditorConfig,
    ) -> Self {
        config.syntax_definition = syntax.name().to_string();
        let counter = buffer.edit_counter();
        Self {
            id,
            buffer: buffer_id,
            lines: LineIndex::from_rope(buffer.rope(), counter),
            autocomplete: AutocompleteEngine::new(&syntax, config.autocomplete),
            colourizer: Colourizer::new(syntax, config.colouring, counter),
            annotations: AnnotationIndex::new(counter),
            config,
            colouring_delegate: None,
            breakpoints: None,
            caret: 0,
            selection: None,
            scroll_top: 0,
            callbacks: Vec::new(),
        }
    }

    /// View id.
    pub fn id(&self) -> ViewId {
        self.id
    }

    /// Buffer this view is bound to.
    pub fn buffer_id(&self) -> BufferId {
        self.buffer
    }

    /// Current configuration.
    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The view's line index.
    pub fn line_index(&self) -> &LineIndex {
        &self.lines
    }

    /// The view's annotations.
    pub fn annotations(&self) -> &AnnotationIndex {
        &self.annotations
    }

    /// The active syntax.
    pub fn syntax(&self) -> &Arc<Syntax> {
        self.colourizer.syntax()
    }

    /// Update derived state for an edit of the bound buffer and notify subscribers.
    pub fn apply_edit(
        &mut self,
        buffer: &TextBuffer,
        delta: &EditDelta,
    ) -> Result<RedrawRequest, EditorError> {
        let line_delta = self.lines.apply(buffer.rope(), delta)?;
        let recoloured = self.colourizer.apply_edit(buffer.rope(), &self.lines, delta)?;
        self.annotations.apply(&line_delta, delta.edit_counter)?;

        let line_count_changed = line_delta.old_line_count != line_delta.new_line_count;
        let start = recoloured.start.min(delta.range_start);
        let end = recoloured.end.max(delta.new_end());
        let first_line = self.lines.line_containing(start)?;
        // A changed line count renumbers every following gutter line.
        let last_line = if line_count_changed {
            self.lines.line_count().saturating_sub(1)
        } else {
            self.lines
                .line_containing(end.saturating_sub(1).max(start))?
        };

        let request = RedrawRequest {
            view: self.id,
            range: self.lines.line_start(first_line)?
                ..self.lines.line_end_with_terminator(last_line)?,
            lines: first_line..last_line + 1,
            line_count_changed,
            edit_counter: delta.edit_counter,
        };
        for callback in &mut self.callbacks {
            callback(&request);
        }
        Ok(request)
    }

    /// Rebind to another buffer, rebuilding every piece of derived state.
    ///
    /// Annotations are cleared; caret, selection and scroll position are reset.
    pub fn rebind(&mut self, buffer_id: BufferId, buffer: &TextBuffer) {
        self.buffer = buffer_id;
        self.resync(buffer);
        self.annotations = AnnotationIndex::new(buffer.edit_counter());
        self.caret = 0;
        self.selection = None;
        self.scroll_top = 0;
    }

    /// Rebuild the line index and colouring cache from the buffer, keeping annotations.
    pub fn resync(&mut self, buffer: &TextBuffer) {
        let counter = buffer.edit_counter();
        self.lines = LineIndex::from_rope(buffer.rope(), counter);
        let mut colourizer = Colourizer::new(
            self.colourizer.syntax().clone(),
            self.colourizer.options(),
            counter,
        );
        colourizer.set_delegate(self.colouring_delegate.clone());
        self.colourizer = colourizer;
        let dropped = self.annotations.resync(self.lines.line_count(), counter);
        if dropped > 0 {
            tracing::debug!(view = self.id.get(), dropped, "dropped annotations past the last line");
        }
    }

    /// Activate a syntax. Colouring is recomputed on the next query and completions are
    /// rebuilt.
    pub fn set_syntax(&mut self, syntax: Arc<Syntax>) {
        self.config.syntax_definition = syntax.name().to_string();
        self.autocomplete.set_syntax(&syntax);
        self.colourizer.set_syntax(syntax);
    }

    /// Change colouring options.
    pub fn set_colouring_options(&mut self, options: ColouringOptions) {
        self.config.colouring = options;
        self.colourizer.set_options(options);
    }

    /// Change autocomplete options.
    pub fn set_autocomplete_options(&mut self, options: AutocompleteOptions) {
        self.config.autocomplete = options;
        self.autocomplete.set_options(options);
    }

    /// Change gutter options.
    pub fn set_gutter_options(&mut self, options: GutterOptions) {
        self.config.gutter = options;
    }

    /// Set (or clear) the colouring delegate.
    pub fn set_colouring_delegate(&mut self, delegate: Option<Weak<dyn ColouringDelegate>>) {
        self.colouring_delegate = delegate.clone();
        self.colourizer.set_delegate(delegate);
    }

    /// Set (or clear) the word supplier.
    pub fn set_word_supplier(&mut self, supplier: Option<Weak<dyn WordSupplier>>) {
        self.autocomplete.set_supplier(supplier);
    }

    /// Set (or clear) the breakpoint delegate.
    pub fn set_breakpoint_delegate(&mut self, delegate: Option<Weak<dyn BreakpointDelegate>>) {
        self.breakpoints = delegate;
    }

    /// Forward a breakpoint toggle on `line` to the breakpoint delegate.
    pub fn toggle_breakpoint(&self, line: usize) -> Result<(), EditorError> {
        self.lines.line_start(line)?;
        if let Some(delegate) = self.breakpoints.as_ref().and_then(Weak::upgrade) {
            delegate.toggle_breakpoint(line);
        }
        Ok(())
    }

    /// Replace every annotation of this view.
    pub fn set_annotations(&mut self, annotations: Vec<Annotation>) -> Result<(), EditorError> {
        self.annotations
            .set_annotations(annotations, self.lines.line_count())
    }

    /// Annotations on `line`.
    pub fn annotations_for_line(&self, line: usize) -> &[Annotation] {
        self.annotations.annotations_for_line(line)
    }

    /// The supplier's words changed.
    pub fn invalidate_completions(&mut self) {
        self.autocomplete.invalidate();
    }

    /// Completions for `prefix`. Empty when autocomplete is disabled.
    pub fn suggest(&mut self, prefix: &str, case_sensitive: bool) -> Vec<String> {
        if !self.config.autocomplete.enabled {
            return Vec::new();
        }
        self.autocomplete.suggest(prefix, case_sensitive)
    }

    /// The partially typed word before the caret and its completions.
    pub fn completions_at_caret(&mut self, buffer: &TextBuffer) -> (Range<usize>, Vec<String>) {
        let caret = self.caret(buffer);
        let Ok(line) = self.lines.line_containing(caret) else {
            return (caret..caret, Vec::new());
        };
        let Ok(start) = self.lines.line_start(line) else {
            return (caret..caret, Vec::new());
        };
        let head = buffer.read(start..caret).unwrap_or_default();
        let local = word_prefix_at(&head, caret - start);
        let range = start + local.start..start + local.end;
        let prefix: String = head
            .chars()
            .skip(local.start)
            .take(local.end - local.start)
            .collect();
        if prefix.is_empty() {
            return (range, Vec::new());
        }
        let case_sensitive = self.config.autocomplete.case_sensitive;
        let words = self.suggest(&prefix, case_sensitive);
        (range, words)
    }

    /// Colour spans overlapping `range`.
    pub fn spans(&mut self, buffer: &TextBuffer, range: Range<usize>) -> Vec<ColourSpan> {
        self.colourizer.spans_in(buffer.rope(), range)
    }

    /// Offset of the bracket paired with the one at `offset`, ignoring brackets in strings and
    /// comments.
    pub fn matching_bracket(
        &mut self,
        buffer: &TextBuffer,
        offset: usize,
    ) -> Result<Option<usize>, EditorError> {
        let len = buffer.len();
        if offset > len {
            return Err(EditorError::out_of_bounds("offset", offset, len));
        }
        let spans = self.colourizer.spans(buffer.rope());
        Ok(brackets::matching_bracket(buffer.rope(), &spans, offset))
    }

    /// Run a standalone colouring pass over `region` (not cached).
    pub fn colourize(
        &self,
        buffer: &TextBuffer,
        region: Range<usize>,
    ) -> Result<Vec<ColourSpan>, EditorError> {
        let len = buffer.len();
        if region.end > len || region.start > region.end {
            return Err(EditorError::out_of_bounds("region end", region.end, len));
        }
        Ok(self.colourizer.colourize(buffer.rope(), region))
    }

    /// Buffer text with colour spans.
    pub fn styled_text(&mut self, buffer: &TextBuffer) -> StyledText {
        StyledText {
            text: buffer.text(),
            spans: self.colourizer.spans(buffer.rope()),
        }
    }

    /// Gutter rows for `lines` (clamped to the line count).
    pub fn gutter_lines(&self, buffer: &TextBuffer, lines: Range<usize>) -> Vec<GutterLine> {
        let gutter = self.config.gutter;
        let end = lines.end.min(self.lines.line_count());
        let breakpoints: BTreeSet<usize> = self
            .breakpoints
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|delegate| delegate.breakpoints())
            .unwrap_or_default();
        let current = self
            .lines
            .line_containing(self.caret(buffer))
            .ok()
            .filter(|_| gutter.highlights_current_line);

        (lines.start..end)
            .map(|line| {
                let annotations: Vec<Annotation> = self
                    .annotations
                    .annotations_for_line(line)
                    .iter()
                    .filter(|a| {
                        gutter.shows_syntax_errors || a.kind != AnnotationKind::SyntaxError
                    })
                    .cloned()
                    .collect();
                let breakpoint = breakpoints.contains(&line)
                    || annotations
                        .iter()
                        .any(|a| a.kind == AnnotationKind::Breakpoint);
                GutterLine {
                    line,
                    number: gutter
                        .shows_line_numbers
                        .then(|| line + gutter.starting_line_number),
                    annotations,
                    breakpoint,
                    is_current: current == Some(line),
                }
            })
            .collect()
    }

    /// Move the caret to the start of 1-based `line_number`, optionally selecting the line.
    pub fn go_to_line(
        &mut self,
        line_number: usize,
        highlight: bool,
    ) -> Result<LineRange, EditorError> {
        let count = self.lines.line_count();
        if line_number == 0 || line_number > count {
            return Err(EditorError::out_of_bounds("line number", line_number, count));
        }
        let line = line_number - 1;
        let range = self.lines.line_range(line)?;
        let end = self.lines.line_end_with_terminator(line)?;
        self.caret = range.start;
        self.selection = highlight.then_some(range.start..end);
        Ok(range)
    }

    /// Caret offset, clamped to the buffer.
    pub fn caret(&self, buffer: &TextBuffer) -> usize {
        self.caret.min(buffer.len())
    }

    /// Move the caret. The selection is cleared.
    pub fn set_caret(&mut self, buffer: &TextBuffer, offset: usize) -> Result<(), EditorError> {
        if offset > buffer.len() {
            return Err(EditorError::out_of_bounds("caret", offset, buffer.len()));
        }
        self.caret = offset;
        self.selection = None;
        Ok(())
    }

    /// Selection, clamped to the buffer.
    pub fn selection(&self, buffer: &TextBuffer) -> Option<Range<usize>> {
        let len = buffer.len();
        self.selection
            .as_ref()
            .map(|s| s.start.min(len)..s.end.min(len))
    }

    /// Set or clear the selection.
    pub fn set_selection(
        &mut self,
        buffer: &TextBuffer,
        selection: Option<Range<usize>>,
    ) -> Result<(), EditorError> {
        if let Some(range) = selection.as_ref()
            && (range.end > buffer.len() || range.start > range.end)
        {
            return Err(EditorError::out_of_bounds(
                "selection end",
                range.end,
                buffer.len(),
            ));
        }
        self.selection = selection;
        Ok(())
    }

    /// Top visible line, clamped to the line count.
    pub fn scroll_top(&self) -> usize {
        self.scroll_top
            .min(self.lines.line_count().saturating_sub(1))
    }

    /// Set the top visible line.
    pub fn set_scroll_top(&mut self, line: usize) {
        self.scroll_top = line;
    }

    /// Subscribe to redraw requests.
    pub fn subscribe(&mut self, callback: RedrawCallback) {
        self.callbacks.push(callback);
    }
}

impl BufferObserver for ViewState {
    fn buffer_did_change(&mut self, buffer: &TextBuffer, delta: &EditDelta) {
        if let Err(err) = self.apply_edit(buffer, delta) {
            tracing::warn!(view = self.id.get(), "rebuilding view state after failed update: {err}");
            self.resync(buffer);
        }
    }
}
