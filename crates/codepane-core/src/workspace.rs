//! Workspace: shared buffers and the views bound to them.
//!
//! The [`Workspace`] owns every open [`TextBuffer`] and every [`ViewState`] in id-keyed maps.
//! A buffer may be displayed by several views (split panes). Edits go through
//! [`Workspace::replace`], which mutates the buffer and fans the resulting [`EditDelta`] out to
//! every attached view before returning, so each view's line index, colouring cache and
//! annotations are current by the time the caller looks at them.
//!
//! Views never share derived state: annotations set on one view are invisible to another view of
//! the same buffer, and each view keeps its own caret, selection and scroll position.

use crate::annotations::{Annotation, BreakpointDelegate};
use crate::autocomplete::{AutocompleteOptions, WordSupplier};
use crate::buffer::{BufferObserver, TextBuffer};
use crate::colouring::{ColouringDelegate, ColouringOptions};
use crate::config::{EditorConfig, GutterOptions};
use crate::delta::EditDelta;
use crate::error::EditorError;
use crate::line_index::LineRange;
use crate::view::{GutterLine, RedrawRequest, StyledText, ViewState};
use codepane_syntax::{Category, ColourSpan, PLAIN_TEXT, Syntax, SyntaxSet};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::rc::Weak;
use std::sync::Arc;
use thiserror::Error;

/// Opaque identifier for an open buffer in a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(u64);

impl BufferId {
    #[cfg(test)]
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Opaque identifier for a view in a [`Workspace`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ViewId(u64);

impl ViewId {
    #[cfg(test)]
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the underlying numeric id.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Result of opening a buffer (a buffer always starts with a default view).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenBufferResult {
    /// The created buffer id.
    pub buffer_id: BufferId,
    /// The initial view id into that buffer.
    pub view_id: ViewId,
}

/// Workspace-level errors.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("buffer {} not found", .0.get())]
    /// A buffer id was not found.
    BufferNotFound(BufferId),

    #[error("view {} not found", .0.get())]
    /// A view id was not found.
    ViewNotFound(ViewId),

    #[error(transparent)]
    /// The buffer or view rejected the operation.
    Editor(#[from] EditorError),
}

#[derive(Debug)]
struct BufferEntry {
    buffer: TextBuffer,
    views: BTreeSet<ViewId>,
}

/// Buffers, views and the syntax registry.
pub struct Workspace {
    syntaxes: SyntaxSet,
    default_config: EditorConfig,
    next_buffer_id: u64,
    buffers: BTreeMap<BufferId, BufferEntry>,
    next_view_id: u64,
    views: BTreeMap<ViewId, ViewState>,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::with_config(EditorConfig::default())
    }
}

impl std::fmt::Debug for Workspace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("buffer_count", &self.buffers.len())
            .field("view_count", &self.views.len())
            .field("syntaxes", &self.syntaxes.names().collect::<Vec<_>>())
            .field("default_syntax", &self.default_config.syntax_definition)
            .finish()
    }
}

impl Workspace {
    /// Create an empty workspace with the bundled syntax definitions and default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty workspace whose new views start from `config`.
    pub fn with_config(config: EditorConfig) -> Self {
        Self {
            syntaxes: SyntaxSet::with_builtins(),
            default_config: config,
            next_buffer_id: 1,
            buffers: BTreeMap::new(),
            next_view_id: 1,
            views: BTreeMap::new(),
        }
    }

    /// The syntax registry. Load extra definitions here before activating them.
    pub fn syntaxes_mut(&mut self) -> &mut SyntaxSet {
        &mut self.syntaxes
    }

    /// Configuration used for new views.
    pub fn default_config(&self) -> &EditorConfig {
        &self.default_config
    }

    /// Change the configuration used for new views. Existing views are not touched.
    pub fn set_default_config(&mut self, config: EditorConfig) {
        self.default_config = config;
    }

    /// Returns the number of open buffers.
    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    /// Returns `true` if there are no open buffers.
    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Returns the number of open views.
    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Open a new buffer holding `text`, creating an initial view.
    pub fn open_buffer(&mut self, text: &str) -> Result<OpenBufferResult, WorkspaceError> {
        let buffer_id = BufferId(self.next_buffer_id);
        self.next_buffer_id = self.next_buffer_id.saturating_add(1);
        self.buffers.insert(
            buffer_id,
            BufferEntry {
                buffer: TextBuffer::new(text),
                views: BTreeSet::new(),
            },
        );

        let view_id = self.create_view(buffer_id)?;
        Ok(OpenBufferResult { buffer_id, view_id })
    }

    /// Close a buffer and all its views.
    pub fn close_buffer(&mut self, id: BufferId) -> Result<(), WorkspaceError> {
        let Some(entry) = self.buffers.remove(&id) else {
            return Err(WorkspaceError::BufferNotFound(id));
        };
        for view_id in entry.views {
            self.views.remove(&view_id);
        }
        Ok(())
    }

    /// Create a new view into an existing buffer, configured from the default configuration.
    pub fn create_view(&mut self, buffer: BufferId) -> Result<ViewId, WorkspaceError> {
        let config = self.default_config.clone();
        let syntax = self.resolve_syntax(&config.syntax_definition)?;
        let Some(entry) = self.buffers.get_mut(&buffer) else {
            return Err(WorkspaceError::BufferNotFound(buffer));
        };

        let view_id = ViewId(self.next_view_id);
        self.next_view_id = self.next_view_id.saturating_add(1);

        let state = ViewState::new(view_id, buffer, &entry.buffer, syntax, config);
        entry.views.insert(view_id);
        self.views.insert(view_id, state);
        Ok(view_id)
    }

    /// Close a view. The buffer stays open even if this was its last view.
    pub fn close_view(&mut self, id: ViewId) -> Result<(), WorkspaceError> {
        let Some(view) = self.views.remove(&id) else {
            return Err(WorkspaceError::ViewNotFound(id));
        };
        if let Some(entry) = self.buffers.get_mut(&view.buffer_id()) {
            entry.views.remove(&id);
        }
        Ok(())
    }

    /// Bind `view` to `buffer`, detaching it from its current buffer.
    ///
    /// The view's line index and colouring cache are rebuilt against the new buffer; its
    /// annotations, caret, selection and scroll position are reset.
    pub fn attach_shared_buffer(
        &mut self,
        view: ViewId,
        buffer: BufferId,
    ) -> Result<(), WorkspaceError> {
        let views = &mut self.views;
        let buffers = &mut self.buffers;

        let Some(state) = views.get_mut(&view) else {
            return Err(WorkspaceError::ViewNotFound(view));
        };
        if !buffers.contains_key(&buffer) {
            return Err(WorkspaceError::BufferNotFound(buffer));
        }

        let previous = state.buffer_id();
        if let Some(entry) = buffers.get_mut(&previous) {
            entry.views.remove(&view);
        }
        let Some(entry) = buffers.get_mut(&buffer) else {
            return Err(WorkspaceError::BufferNotFound(buffer));
        };
        entry.views.insert(view);
        state.rebind(buffer, &entry.buffer);
        tracing::debug!(
            view = view.get(),
            from = previous.get(),
            to = buffer.get(),
            "view attached to buffer"
        );
        Ok(())
    }

    /// Replace `range` of the buffer displayed by `view` with `text`.
    ///
    /// Every view of that buffer has updated its derived state and notified its subscribers
    /// before this returns.
    pub fn replace(
        &mut self,
        view: ViewId,
        range: Range<usize>,
        text: &str,
    ) -> Result<EditDelta, WorkspaceError> {
        let buffer_id = self.buffer_id_for_view(view)?;

        // Borrow maps separately so the buffer and its views can be used together.
        let views = &mut self.views;
        let buffers = &mut self.buffers;
        let Some(entry) = buffers.get_mut(&buffer_id) else {
            return Err(WorkspaceError::BufferNotFound(buffer_id));
        };

        let mut observers: Vec<&mut dyn BufferObserver> = views
            .iter_mut()
            .filter(|(id, _)| entry.views.contains(*id))
            .map(|(_, state)| state as &mut dyn BufferObserver)
            .collect();
        let delta = entry
            .buffer
            .replace_notifying(range, text, &mut observers)?;
        tracing::debug!(
            buffer = buffer_id.get(),
            views = observers.len(),
            counter = delta.edit_counter,
            "edit broadcast"
        );
        Ok(delta)
    }

    /// Text of the buffer displayed by `view`.
    pub fn buffer_text(&self, view: ViewId) -> Result<String, WorkspaceError> {
        let (_, buffer) = self.view_and_buffer(view)?;
        Ok(buffer.text())
    }

    /// Read `range` of the buffer displayed by `view`.
    pub fn read(&self, view: ViewId, range: Range<usize>) -> Result<String, WorkspaceError> {
        let (_, buffer) = self.view_and_buffer(view)?;
        Ok(buffer.read(range)?)
    }

    /// Character count of the buffer displayed by `view`.
    pub fn char_count(&self, view: ViewId) -> Result<usize, WorkspaceError> {
        let (_, buffer) = self.view_and_buffer(view)?;
        Ok(buffer.len())
    }

    /// Edit counter of the buffer displayed by `view`.
    pub fn edit_counter(&self, view: ViewId) -> Result<u64, WorkspaceError> {
        let (_, buffer) = self.view_and_buffer(view)?;
        Ok(buffer.edit_counter())
    }

    /// Line count as seen by `view`.
    pub fn line_count(&self, view: ViewId) -> Result<usize, WorkspaceError> {
        Ok(self.view(view)?.line_index().line_count())
    }

    /// Line containing `offset`, as seen by `view`.
    pub fn line_containing(&self, view: ViewId, offset: usize) -> Result<usize, WorkspaceError> {
        Ok(self.view(view)?.line_index().line_containing(offset)?)
    }

    /// Start and length of `line`, as seen by `view`.
    pub fn line_range(&self, view: ViewId, line: usize) -> Result<LineRange, WorkspaceError> {
        Ok(self.view(view)?.line_index().line_range(line)?)
    }

    /// Colour spans of `view` overlapping `range`.
    pub fn spans(
        &mut self,
        view: ViewId,
        range: Range<usize>,
    ) -> Result<Vec<ColourSpan>, WorkspaceError> {
        let (state, buffer) = self.view_and_buffer_mut(view)?;
        Ok(state.spans(buffer, range))
    }

    /// Run an uncached colouring pass of `view` over `region`.
    pub fn colourize(
        &self,
        view: ViewId,
        region: Range<usize>,
    ) -> Result<Vec<ColourSpan>, WorkspaceError> {
        let (state, buffer) = self.view_and_buffer(view)?;
        Ok(state.colourize(buffer, region)?)
    }

    /// Offset of the bracket paired with the one at `offset` in `view`, or `None` if there is
    /// none. Brackets in strings and comments are ignored.
    pub fn matching_bracket(
        &mut self,
        view: ViewId,
        offset: usize,
    ) -> Result<Option<usize>, WorkspaceError> {
        let (state, buffer) = self.view_and_buffer_mut(view)?;
        Ok(state.matching_bracket(buffer, offset)?)
    }

    /// Buffer text of `view` with its colour spans.
    pub fn styled_text(&mut self, view: ViewId) -> Result<StyledText, WorkspaceError> {
        let (state, buffer) = self.view_and_buffer_mut(view)?;
        Ok(state.styled_text(buffer))
    }

    /// Activate the syntax definition named `name` for `view`.
    ///
    /// On failure the previous definition stays active.
    pub fn set_syntax_definition(&mut self, view: ViewId, name: &str) -> Result<(), WorkspaceError> {
        if !self.views.contains_key(&view) {
            return Err(WorkspaceError::ViewNotFound(view));
        }
        let syntax = self.syntaxes.get(name).map_err(|source| {
            tracing::warn!(view = view.get(), syntax = name, "cannot activate syntax definition: {source}");
            EditorError::InvalidSyntaxDefinition {
                name: name.to_string(),
                source,
            }
        })?;
        self.view_mut(view)?.set_syntax(syntax);
        Ok(())
    }

    /// Configuration of `view`.
    pub fn config(&self, view: ViewId) -> Result<&EditorConfig, WorkspaceError> {
        Ok(self.view(view)?.config())
    }

    /// Change the colouring options of `view`.
    pub fn set_colouring_options(
        &mut self,
        view: ViewId,
        options: ColouringOptions,
    ) -> Result<(), WorkspaceError> {
        self.view_mut(view)?.set_colouring_options(options);
        Ok(())
    }

    /// Enable or disable one colouring category of `view`.
    pub fn set_category_enabled(
        &mut self,
        view: ViewId,
        category: Category,
        enabled: bool,
    ) -> Result<(), WorkspaceError> {
        let state = self.view_mut(view)?;
        let mut options = state.config().colouring;
        options.set_category(category, enabled);
        state.set_colouring_options(options);
        Ok(())
    }

    /// Change the autocomplete options of `view`.
    pub fn set_autocomplete_options(
        &mut self,
        view: ViewId,
        options: AutocompleteOptions,
    ) -> Result<(), WorkspaceError> {
        self.view_mut(view)?.set_autocomplete_options(options);
        Ok(())
    }

    /// Change the gutter options of `view`.
    pub fn set_gutter_options(
        &mut self,
        view: ViewId,
        options: GutterOptions,
    ) -> Result<(), WorkspaceError> {
        self.view_mut(view)?.set_gutter_options(options);
        Ok(())
    }

    /// Set (or clear) the colouring delegate of `view`.
    pub fn set_colouring_delegate(
        &mut self,
        view: ViewId,
        delegate: Option<Weak<dyn ColouringDelegate>>,
    ) -> Result<(), WorkspaceError> {
        self.view_mut(view)?.set_colouring_delegate(delegate);
        Ok(())
    }

    /// Set (or clear) the word supplier of `view`.
    pub fn set_word_supplier(
        &mut self,
        view: ViewId,
        supplier: Option<Weak<dyn WordSupplier>>,
    ) -> Result<(), WorkspaceError> {
        self.view_mut(view)?.set_word_supplier(supplier);
        Ok(())
    }

    /// Set (or clear) the breakpoint delegate of `view`.
    pub fn set_breakpoint_delegate(
        &mut self,
        view: ViewId,
        delegate: Option<Weak<dyn BreakpointDelegate>>,
    ) -> Result<(), WorkspaceError> {
        self.view_mut(view)?.set_breakpoint_delegate(delegate);
        Ok(())
    }

    /// Forward a breakpoint toggle on `line` of `view` to its breakpoint delegate.
    pub fn toggle_breakpoint(&self, view: ViewId, line: usize) -> Result<(), WorkspaceError> {
        Ok(self.view(view)?.toggle_breakpoint(line)?)
    }

    /// Tell `view` that its word supplier's words changed.
    pub fn invalidate_completions(&mut self, view: ViewId) -> Result<(), WorkspaceError> {
        self.view_mut(view)?.invalidate_completions();
        Ok(())
    }

    /// Replace every annotation of `view`.
    pub fn set_annotations(
        &mut self,
        view: ViewId,
        annotations: Vec<Annotation>,
    ) -> Result<(), WorkspaceError> {
        Ok(self.view_mut(view)?.set_annotations(annotations)?)
    }

    /// Annotations of `view` on `line`.
    pub fn annotations_for_line(
        &self,
        view: ViewId,
        line: usize,
    ) -> Result<Vec<Annotation>, WorkspaceError> {
        Ok(self.view(view)?.annotations_for_line(line).to_vec())
    }

    /// Completions for `prefix` using the view's configured case sensitivity.
    pub fn suggest(&mut self, view: ViewId, prefix: &str) -> Result<Vec<String>, WorkspaceError> {
        let state = self.view_mut(view)?;
        let case_sensitive = state.config().autocomplete.case_sensitive;
        Ok(state.suggest(prefix, case_sensitive))
    }

    /// Completions for `prefix` with explicit case sensitivity.
    pub fn suggest_with_case(
        &mut self,
        view: ViewId,
        prefix: &str,
        case_sensitive: bool,
    ) -> Result<Vec<String>, WorkspaceError> {
        Ok(self.view_mut(view)?.suggest(prefix, case_sensitive))
    }

    /// The partially typed word before the caret of `view` and its completions.
    pub fn completions_at_cursor(
        &mut self,
        view: ViewId,
    ) -> Result<(Range<usize>, Vec<String>), WorkspaceError> {
        let (state, buffer) = self.view_and_buffer_mut(view)?;
        Ok(state.completions_at_caret(buffer))
    }

    /// Move the caret of `view` to 1-based `line_number`, selecting the line if `highlight`.
    pub fn go_to_line(
        &mut self,
        view: ViewId,
        line_number: usize,
        highlight: bool,
    ) -> Result<LineRange, WorkspaceError> {
        Ok(self.view_mut(view)?.go_to_line(line_number, highlight)?)
    }

    /// Gutter rows of `view` for `lines`.
    pub fn gutter_lines(
        &self,
        view: ViewId,
        lines: Range<usize>,
    ) -> Result<Vec<GutterLine>, WorkspaceError> {
        let (state, buffer) = self.view_and_buffer(view)?;
        Ok(state.gutter_lines(buffer, lines))
    }

    /// Caret of `view`, clamped to the buffer.
    pub fn cursor_for_view(&self, view: ViewId) -> Result<usize, WorkspaceError> {
        let (state, buffer) = self.view_and_buffer(view)?;
        Ok(state.caret(buffer))
    }

    /// Move the caret of `view`.
    pub fn set_cursor(&mut self, view: ViewId, offset: usize) -> Result<(), WorkspaceError> {
        let (state, buffer) = self.view_and_buffer_mut(view)?;
        Ok(state.set_caret(buffer, offset)?)
    }

    /// Selection of `view`, clamped to the buffer.
    pub fn selection_for_view(
        &self,
        view: ViewId,
    ) -> Result<Option<Range<usize>>, WorkspaceError> {
        let (state, buffer) = self.view_and_buffer(view)?;
        Ok(state.selection(buffer))
    }

    /// Set or clear the selection of `view`.
    pub fn set_selection(
        &mut self,
        view: ViewId,
        selection: Option<Range<usize>>,
    ) -> Result<(), WorkspaceError> {
        let (state, buffer) = self.view_and_buffer_mut(view)?;
        Ok(state.set_selection(buffer, selection)?)
    }

    /// Top visible line of `view`.
    pub fn scroll_top_for_view(&self, view: ViewId) -> Result<usize, WorkspaceError> {
        Ok(self.view(view)?.scroll_top())
    }

    /// Set the top visible line of `view`.
    pub fn set_scroll_top(&mut self, view: ViewId, line: usize) -> Result<(), WorkspaceError> {
        self.view_mut(view)?.set_scroll_top(line);
        Ok(())
    }

    /// Subscribe to redraw requests of `view`.
    pub fn subscribe_view<F>(&mut self, view: ViewId, callback: F) -> Result<(), WorkspaceError>
    where
        F: FnMut(&RedrawRequest) + 'static,
    {
        self.view_mut(view)?.subscribe(Box::new(callback));
        Ok(())
    }

    /// Buffer displayed by `view`.
    pub fn buffer_id_for_view(&self, view: ViewId) -> Result<BufferId, WorkspaceError> {
        self.views
            .get(&view)
            .map(ViewState::buffer_id)
            .ok_or(WorkspaceError::ViewNotFound(view))
    }

    /// Views attached to `buffer`, in creation order.
    pub fn views_of_buffer(&self, buffer: BufferId) -> Result<Vec<ViewId>, WorkspaceError> {
        self.buffers
            .get(&buffer)
            .map(|entry| entry.views.iter().copied().collect())
            .ok_or(WorkspaceError::BufferNotFound(buffer))
    }

    /// Active syntax of `view`.
    pub fn syntax_for_view(&self, view: ViewId) -> Result<Arc<Syntax>, WorkspaceError> {
        Ok(self.view(view)?.syntax().clone())
    }

    fn resolve_syntax(&mut self, name: &str) -> Result<Arc<Syntax>, WorkspaceError> {
        match self.syntaxes.get(name) {
            Ok(syntax) => Ok(syntax),
            Err(err) if name != PLAIN_TEXT => {
                tracing::warn!(syntax = name, "falling back to plain text: {err}");
                self.resolve_syntax(PLAIN_TEXT)
            }
            Err(source) => Err(EditorError::InvalidSyntaxDefinition {
                name: name.to_string(),
                source,
            }
            .into()),
        }
    }

    fn view(&self, id: ViewId) -> Result<&ViewState, WorkspaceError> {
        self.views.get(&id).ok_or(WorkspaceError::ViewNotFound(id))
    }

    fn view_mut(&mut self, id: ViewId) -> Result<&mut ViewState, WorkspaceError> {
        self.views
            .get_mut(&id)
            .ok_or(WorkspaceError::ViewNotFound(id))
    }

    fn view_and_buffer(&self, id: ViewId) -> Result<(&ViewState, &TextBuffer), WorkspaceError> {
        let state = self.view(id)?;
        let buffer_id = state.buffer_id();
        let entry = self
            .buffers
            .get(&buffer_id)
            .ok_or(WorkspaceError::BufferNotFound(buffer_id))?;
        Ok((state, &entry.buffer))
    }

    fn view_and_buffer_mut(
        &mut self,
        id: ViewId,
    ) -> Result<(&mut ViewState, &TextBuffer), WorkspaceError> {
        let state = self
            .views
            .get_mut(&id)
            .ok_or(WorkspaceError::ViewNotFound(id))?;
        let buffer_id = state.buffer_id();
        let entry = self
            .buffers
            .get(&buffer_id)
            .ok_or(WorkspaceError::BufferNotFound(buffer_id))?;
        Ok((state, &entry.buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_open_and_close_lifecycle() {
        let mut ws = Workspace::new();
        let opened = ws.open_buffer("hello\nworld").unwrap();
        let second = ws.create_view(opened.buffer_id).unwrap();
        assert_eq!(ws.len(), 1);
        assert_eq!(ws.view_count(), 2);
        assert_eq!(
            ws.views_of_buffer(opened.buffer_id).unwrap(),
            vec![opened.view_id, second]
        );

        ws.close_view(second).unwrap();
        assert_eq!(ws.len(), 1);
        assert!(matches!(
            ws.close_view(second),
            Err(WorkspaceError::ViewNotFound(id)) if id == second
        ));

        ws.close_view(opened.view_id).unwrap();
        assert_eq!(ws.len(), 1, "closing the last view keeps the buffer");
        let again = ws.create_view(opened.buffer_id).unwrap();
        assert_eq!(ws.buffer_text(again).unwrap(), "hello\nworld");

        ws.close_buffer(opened.buffer_id).unwrap();
        assert!(ws.is_empty());
        assert_eq!(ws.view_count(), 0);
        assert!(matches!(
            ws.create_view(opened.buffer_id),
            Err(WorkspaceError::BufferNotFound(_))
        ));
    }

    #[test]
    fn test_edit_reaches_every_view_of_the_buffer() {
        let mut ws = Workspace::new();
        let a = ws.open_buffer("one\ntwo").unwrap();
        let b = ws.create_view(a.buffer_id).unwrap();
        let other = ws.open_buffer("elsewhere").unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        for view in [a.view_id, b, other.view_id] {
            let sink = seen.clone();
            ws.subscribe_view(view, move |request: &RedrawRequest| {
                sink.borrow_mut().push(request.view)
            })
            .unwrap();
        }

        let delta = ws.replace(b, 3..3, "\nthree").unwrap();
        assert_eq!(delta.edit_counter, 1);
        assert_eq!(seen.borrow().as_slice(), [a.view_id, b]);
        assert_eq!(ws.line_count(a.view_id).unwrap(), 3);
        assert_eq!(ws.line_count(b).unwrap(), 3);
        assert_eq!(ws.line_count(other.view_id).unwrap(), 1);
    }

    #[test]
    fn test_unknown_syntax_keeps_previous_definition() {
        let mut ws = Workspace::new();
        let opened = ws.open_buffer("fn main() {}").unwrap();
        ws.set_syntax_definition(opened.view_id, "Rust").unwrap();

        let err = ws
            .set_syntax_definition(opened.view_id, "Klingon")
            .unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::Editor(EditorError::InvalidSyntaxDefinition { ref name, .. })
                if name == "Klingon"
        ));
        assert_eq!(ws.syntax_for_view(opened.view_id).unwrap().name(), "Rust");
        assert_eq!(ws.config(opened.view_id).unwrap().syntax_definition, "Rust");
    }

    #[test]
    fn test_unknown_default_syntax_falls_back_to_plain_text() {
        let mut config = EditorConfig::default();
        config.syntax_definition = "Missing".to_string();
        let mut ws = Workspace::with_config(config);
        let opened = ws.open_buffer("text").unwrap();
        assert_eq!(
            ws.syntax_for_view(opened.view_id).unwrap().name(),
            PLAIN_TEXT
        );
    }

    #[test]
    fn test_attach_shared_buffer_moves_the_view() {
        let mut ws = Workspace::new();
        let first = ws.open_buffer("a\nb\nc").unwrap();
        let second = ws.open_buffer("single").unwrap();
        ws.set_cursor(first.view_id, 4).unwrap();

        ws.attach_shared_buffer(first.view_id, second.buffer_id)
            .unwrap();
        assert_eq!(
            ws.buffer_id_for_view(first.view_id).unwrap(),
            second.buffer_id
        );
        assert!(ws.views_of_buffer(first.buffer_id).unwrap().is_empty());
        assert_eq!(
            ws.views_of_buffer(second.buffer_id).unwrap(),
            vec![first.view_id, second.view_id]
        );
        assert_eq!(ws.line_count(first.view_id).unwrap(), 1);
        assert_eq!(ws.cursor_for_view(first.view_id).unwrap(), 0);

        ws.replace(second.view_id, 0..0, "x\n").unwrap();
        assert_eq!(ws.line_count(first.view_id).unwrap(), 2);
    }

    #[test]
    fn test_reads_clamp_to_a_shrunk_buffer() {
        let mut ws = Workspace::new();
        let a = ws.open_buffer("0123456789").unwrap();
        let b = ws.create_view(a.buffer_id).unwrap();
        ws.set_cursor(b, 9).unwrap();
        ws.set_selection(b, Some(5..10)).unwrap();

        ws.replace(a.view_id, 2..10, "").unwrap();
        assert_eq!(ws.cursor_for_view(b).unwrap(), 2);
        assert_eq!(ws.selection_for_view(b).unwrap(), Some(2..2));
    }
}
