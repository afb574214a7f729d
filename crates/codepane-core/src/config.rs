//! View configuration.
//!
//! [`EditorConfig`] groups every per-view switch. It can be built in code or loaded from YAML;
//! missing fields take their defaults.
//!
//! ```yaml
//! syntax_definition: Rust
//! colouring:
//!   multiline_strings: false
//!   categories: [keyword, comment, string]
//! autocomplete:
//!   delay_ms: 300
//!   source: both
//! gutter:
//!   starting_line_number: 0
//! ```

use crate::autocomplete::AutocompleteOptions;
use crate::colouring::ColouringOptions;
use codepane_syntax::PLAIN_TEXT;
use serde::{Deserialize, Serialize};

/// Gutter switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GutterOptions {
    /// Whether line numbers are reported.
    pub shows_line_numbers: bool,
    /// Number displayed for the first line.
    pub starting_line_number: usize,
    /// Whether syntax error annotations are reported to the gutter.
    pub shows_syntax_errors: bool,
    /// Whether the caret's line is flagged as current.
    pub highlights_current_line: bool,
}

impl Default for GutterOptions {
    fn default() -> Self {
        Self {
            shows_line_numbers: true,
            starting_line_number: 1,
            shows_syntax_errors: true,
            highlights_current_line: false,
        }
    }
}

/// Per-view configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Name of the syntax definition activated for new views.
    pub syntax_definition: String,
    /// Colouring switches.
    pub colouring: ColouringOptions,
    /// Autocomplete switches.
    pub autocomplete: AutocompleteOptions,
    /// Gutter switches.
    pub gutter: GutterOptions,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            syntax_definition: PLAIN_TEXT.to_string(),
            colouring: ColouringOptions::default(),
            autocomplete: AutocompleteOptions::default(),
            gutter: GutterOptions::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a YAML document. Missing fields keep their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autocomplete::CandidateSource;
    use codepane_syntax::Category;

    #[test]
    fn test_defaults_from_empty_document() {
        let config = EditorConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.syntax_definition, PLAIN_TEXT);
        assert!(config.colouring.syntax_coloured);
        assert_eq!(config.gutter.starting_line_number, 1);
    }

    #[test]
    fn test_partial_sections() {
        let config = EditorConfig::from_yaml_str(
            "syntax_definition: Rust\ncolouring:\n  multiline_strings: false\n  categories: [keyword, comment]\nautocomplete:\n  delay_ms: 300\n  source: both\ngutter:\n  starting_line_number: 0\n",
        )
        .unwrap();
        assert_eq!(config.syntax_definition, "Rust");
        assert!(!config.colouring.multiline_strings);
        assert!(config.colouring.categories.contains(Category::Comment));
        assert!(!config.colouring.categories.contains(Category::String));
        assert_eq!(config.autocomplete.delay_ms, 300);
        assert_eq!(config.autocomplete.source, CandidateSource::Both);
        assert!(config.autocomplete.enabled);
        assert_eq!(config.gutter.starting_line_number, 0);
        assert!(config.gutter.shows_line_numbers);
    }

    #[test]
    fn test_yaml_round_trip_and_errors() {
        let mut config = EditorConfig::default();
        config.gutter.highlights_current_line = true;
        let yaml = config.to_yaml_string().unwrap();
        assert_eq!(EditorConfig::from_yaml_str(&yaml).unwrap(), config);

        assert!(EditorConfig::from_yaml_str("colouring: [1, 2]").is_err());
    }
}
