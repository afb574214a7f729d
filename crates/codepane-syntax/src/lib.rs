#![warn(missing_docs)]
//! `codepane-syntax` - YAML syntax definitions and a region scanner for `codepane-core`.
//!
//! A syntax definition is an ordered list of rules plus keyword and autocomplete word lists.
//! Definitions are registered in a [`SyntaxSet`], compiled on first use, and scanned with
//! [`scan`] one region at a time.
//!
//! ```rust
//! use codepane_syntax::{Category, ScanOptions, SyntaxSet, scan_text};
//!
//! let mut set = SyntaxSet::new();
//! let name = set
//!     .load_from_str("name: Demo\nkeywords: [bar]\nrules:\n  - category: comment\n    begin: '#'\n")
//!     .unwrap();
//! let syntax = set.get(&name).unwrap();
//!
//! let spans = scan_text(&syntax, "bar baz # bar", &ScanOptions::default());
//! assert_eq!(spans.len(), 2);
//! assert_eq!(spans[0].category, Category::Keyword);
//! assert_eq!(spans[1].range(), 8..13);
//! ```

pub mod category;
pub mod definition;
pub mod error;
pub mod scanner;
pub mod set;
pub mod syntax;

pub use category::{Category, CategorySet, ColourSpan, normalize_spans};
pub use definition::{RawRule, SyntaxDefinition};
pub use error::{ScanError, SyntaxError};
pub use scanner::{ScanOptions, ScanOutput, TextWindow, scan, scan_text};
pub use set::{PLAIN_TEXT, SyntaxSet};
pub use syntax::{Matcher, Rule, Syntax};
