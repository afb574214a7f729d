#![warn(missing_docs)]
//! codepane-core - a headless source-editing core
//!
//! # Overview
//!
//! `codepane-core` keeps everything a source editor derives from its text, without drawing any of
//! it. A host toolkit renders the colour spans, gutter rows and redraw requests it produces.
//!
//! # Core Features
//!
//! - **Shared buffers**: one rope-backed [`TextBuffer`] may be displayed by several views
//! - **Line index**: incremental line start table with `\n`, `\r\n` and `\r` terminators
//! - **Incremental colouring**: only the lines around an edit are rescanned, resynchronising with
//!   the previous spans as soon as possible
//! - **Annotations**: syntax error and breakpoint markers that follow their lines across edits
//! - **Autocomplete**: keyword and host-supplied candidates with prefix matching
//!
//! # Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Workspace (buffers, views, fan-out)        │  ← Public API
//! ├─────────────────────────────────────────────┤
//! │  ViewState (caret, gutter, redraw)          │  ← Per view
//! ├─────────────────────────────────────────────┤
//! │  LineIndex / Colourizer / Annotations /     │
//! │  AutocompleteEngine                         │  ← Derived state
//! ├─────────────────────────────────────────────┤
//! │  TextBuffer (ropey)                         │  ← Text storage
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use codepane_core::{Annotation, Category, Workspace};
//!
//! let mut workspace = Workspace::new();
//! let opened = workspace.open_buffer("fn main() {\n    let x = 1;\n}\n").unwrap();
//! let split = workspace.create_view(opened.buffer_id).unwrap();
//! workspace.set_syntax_definition(opened.view_id, "Rust").unwrap();
//!
//! let spans = workspace.spans(opened.view_id, 0..11).unwrap();
//! assert_eq!(spans[0].category, Category::Keyword);
//!
//! workspace
//!     .set_annotations(opened.view_id, vec![Annotation::syntax_error(1, "unused variable")])
//!     .unwrap();
//! workspace.replace(split, 0..0, "// entry point\n").unwrap();
//!
//! // Both views see the new line; only the first carries the annotation, now on line 2.
//! assert_eq!(workspace.line_count(split).unwrap(), 5);
//! assert_eq!(workspace.annotations_for_line(opened.view_id, 2).unwrap().len(), 1);
//! assert!(workspace.annotations_for_line(split, 2).unwrap().is_empty());
//! ```
//!
//! # Module Description
//!
//! - [`buffer`] - rope-backed text storage with an edit counter
//! - [`line_index`] - incremental line index
//! - [`colouring`] - incremental colourizer over `codepane-syntax`
//! - [`annotations`] - line-keyed annotations
//! - [`autocomplete`] - completion candidates and the suggestion debouncer
//! - [`brackets`] - matching-bracket lookup
//! - [`view`] - per-view state
//! - [`workspace`] - buffers, views and edit fan-out
//! - [`config`] - YAML-loadable view configuration

pub mod annotations;
pub mod autocomplete;
pub mod brackets;
pub mod buffer;
pub mod colouring;
pub mod config;
pub mod delta;
pub mod error;
pub mod line_index;
pub mod view;
pub mod workspace;

pub use annotations::{Annotation, AnnotationIndex, AnnotationKind, BreakpointDelegate};
pub use autocomplete::{
    AutocompleteEngine, AutocompleteOptions, CandidateSource, DEFAULT_DELAY_MS,
    SuggestionDebouncer, SuggestionTicket, WordSupplier, word_prefix_at,
};
pub use brackets::matching_bracket;
pub use buffer::{BufferObserver, TextBuffer};
pub use codepane_syntax::{
    Category, CategorySet, ColourSpan, PLAIN_TEXT, Syntax, SyntaxError, SyntaxSet,
};
pub use colouring::{ColouringDelegate, ColouringOptions, Colourizer};
pub use config::{EditorConfig, GutterOptions};
pub use delta::EditDelta;
pub use error::EditorError;
pub use line_index::{LineDelta, LineIndex, LineRange};
pub use view::{GutterLine, RedrawCallback, RedrawRequest, StyledText, ViewState};
pub use workspace::{BufferId, OpenBufferResult, ViewId, Workspace, WorkspaceError};
