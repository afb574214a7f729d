//! Error types.

use codepane_syntax::SyntaxError;
use thiserror::Error;

#[derive(Debug, Error)]
/// Errors reported by buffers, derived state and views.
pub enum EditorError {
    #[error("{what} {value} is out of bounds (limit {limit})")]
    /// An offset, range or line index lies outside the current buffer or line bounds.
    OutOfBounds {
        /// What was being addressed (`"offset"`, `"range end"`, `"line"`, ...).
        what: &'static str,
        /// The rejected value.
        value: usize,
        /// The largest accepted value.
        limit: usize,
    },

    #[error("cannot activate syntax definition '{name}': {source}")]
    /// A syntax definition is unknown or malformed. The previous definition stays active.
    InvalidSyntaxDefinition {
        /// Requested definition name.
        name: String,
        /// Underlying failure.
        #[source]
        source: SyntaxError,
    },

    #[error("stale edit notification #{received} (already applied #{last_applied})")]
    /// An observer received an edit it (or a later one) has already processed.
    StaleNotification {
        /// Edit counter carried by the rejected notification.
        received: u64,
        /// Last edit counter the observer applied.
        last_applied: u64,
    },
}

impl EditorError {
    pub(crate) fn out_of_bounds(what: &'static str, value: usize, limit: usize) -> Self {
        Self::OutOfBounds { what, value, limit }
    }
}
