//! Error types.

use thiserror::Error;

#[derive(Debug, Error)]
/// Errors produced while loading or compiling syntax definitions.
pub enum SyntaxError {
    #[error("YAML parse error: {0}")]
    /// YAML parsing failed.
    Yaml(#[from] serde_yaml::Error),

    #[error("unknown syntax definition '{0}'")]
    /// No definition with this name is registered.
    UnknownSyntax(String),

    #[error("regex compile error for pattern '{pattern}': {message}")]
    /// A regex pattern failed to compile.
    RegexCompile {
        /// The regex pattern string.
        pattern: String,
        /// The compiler error message.
        message: String,
    },

    #[error("invalid rule #{index}: {reason}")]
    /// A rule is neither a pattern nor a begin/end pair, or mixes both.
    InvalidRule {
        /// Position of the rule in the definition's `rules` list.
        index: usize,
        /// What is wrong with it.
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
/// Errors produced by the region scanner.
pub enum ScanError {
    #[error("scan window ends before the scan could be decided")]
    /// The text window handed to the scanner does not reach far enough past the region.
    ///
    /// Callers should retry with a larger window.
    NeedMoreText,
}
