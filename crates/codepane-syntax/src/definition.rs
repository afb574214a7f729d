//! Raw YAML syntax definitions.

use crate::category::Category;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
/// Raw YAML syntax definition.
///
/// ```yaml
/// name: Shell
/// file_extensions: [sh]
/// keywords: [if, then, fi]
/// rules:
///   - category: comment
///     begin: "#"
///   - category: string
///     begin: '"'
///     end: '"'
///     escape: '\'
///     multiline: true
///   - category: variable
///     pattern: '\$\w+'
/// ```
pub struct SyntaxDefinition {
    /// Unique name used to activate the definition.
    pub name: String,

    #[serde(default)]
    /// File extensions associated with this syntax.
    pub file_extensions: Vec<String>,

    #[serde(default = "default_true")]
    /// Whether keywords and autocomplete words match case-sensitively.
    pub keywords_case_sensitive: bool,

    #[serde(default)]
    /// Words coloured as [`Category::Keyword`] and offered by autocomplete.
    pub keywords: Vec<String>,

    #[serde(default)]
    /// Words coloured as [`Category::Autocomplete`] and offered by autocomplete.
    pub autocomplete_words: Vec<String>,

    #[serde(default)]
    /// Ordered pattern rules.
    pub rules: Vec<RawRule>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
/// A single rule in a [`SyntaxDefinition`].
///
/// Exactly one of `pattern` or `begin` must be set.
pub struct RawRule {
    /// Category assigned to text recognised by this rule.
    pub category: Category,

    #[serde(default)]
    /// Single-line regex recogniser.
    pub pattern: Option<String>,

    #[serde(default)]
    /// Opening delimiter regex of a delimited rule.
    pub begin: Option<String>,

    #[serde(default)]
    /// Closing delimiter regex of a delimited rule. `None` means "until end of line".
    pub end: Option<String>,

    #[serde(default)]
    /// Escape character that prevents the next character from closing the span.
    pub escape: Option<char>,

    #[serde(default)]
    /// Whether a delimited span may continue across line terminators.
    pub multiline: bool,

    #[serde(default)]
    /// Whether the span is confined to its opening line, ending at a closer on that line or at
    /// the line end. Overrides `multiline`.
    pub stop_at_end_of_line: bool,
}
