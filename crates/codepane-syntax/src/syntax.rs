//! Compiled syntax definitions.

use crate::category::Category;
use crate::definition::{RawRule, SyntaxDefinition};
use crate::error::SyntaxError;
use regex::{Regex, RegexBuilder};

/// How a rule recognises text.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// A regex matched within a single line.
    Pattern(Regex),
    /// A span opened by `begin` and closed by `end` (or the end of the line when `end` is `None`).
    Delimited {
        /// Opening delimiter, matched within a single line.
        begin: Regex,
        /// Closing delimiter.
        end: Option<Regex>,
        /// Escape character that prevents the following character from closing the span.
        escape: Option<char>,
    },
}

/// A compiled rule.
#[derive(Debug, Clone)]
pub struct Rule {
    category: Category,
    matcher: Matcher,
    multiline: bool,
    stop_at_end_of_line: bool,
}

impl Rule {
    /// Build a single-line pattern rule.
    pub fn pattern(category: Category, pattern: &str) -> Result<Self, SyntaxError> {
        Ok(Self {
            category,
            matcher: Matcher::Pattern(compile_regex(pattern, true)?),
            multiline: false,
            stop_at_end_of_line: false,
        })
    }

    /// Build a delimited rule.
    pub fn delimited(
        category: Category,
        begin: &str,
        end: Option<&str>,
        escape: Option<char>,
    ) -> Result<Self, SyntaxError> {
        Ok(Self {
            category,
            matcher: Matcher::Delimited {
                begin: compile_regex(begin, true)?,
                end: end.map(|e| compile_regex(e, true)).transpose()?,
                escape,
            },
            multiline: false,
            stop_at_end_of_line: false,
        })
    }

    /// Allow the span to continue across line terminators.
    pub fn with_multiline(mut self, multiline: bool) -> Self {
        self.multiline = multiline;
        self
    }

    /// Confine the span to its opening line, even for a multiline rule.
    pub fn with_stop_at_end_of_line(mut self, stop: bool) -> Self {
        self.stop_at_end_of_line = stop;
        self
    }

    /// The category assigned by this rule.
    pub fn category(&self) -> Category {
        self.category
    }

    /// The recogniser.
    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    /// Whether the rule may span lines.
    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    /// Whether an unterminated span stops at the end of its line.
    pub fn stops_at_end_of_line(&self) -> bool {
        self.stop_at_end_of_line
    }

    fn from_raw(index: usize, raw: &RawRule) -> Result<Self, SyntaxError> {
        let rule = match (&raw.pattern, &raw.begin) {
            (Some(pattern), None) => {
                if raw.end.is_some() || raw.escape.is_some() {
                    return Err(SyntaxError::InvalidRule {
                        index,
                        reason: "`end` and `escape` require `begin`",
                    });
                }
                Self::pattern(raw.category, pattern)?
            }
            (None, Some(begin)) => {
                Self::delimited(raw.category, begin, raw.end.as_deref(), raw.escape)?
            }
            (Some(_), Some(_)) => {
                return Err(SyntaxError::InvalidRule {
                    index,
                    reason: "`pattern` and `begin` are mutually exclusive",
                });
            }
            (None, None) => {
                return Err(SyntaxError::InvalidRule {
                    index,
                    reason: "one of `pattern` or `begin` is required",
                });
            }
        };
        Ok(rule
            .with_multiline(raw.multiline)
            .with_stop_at_end_of_line(raw.stop_at_end_of_line))
    }
}

/// A compiled, ready-to-scan syntax definition.
#[derive(Debug, Clone)]
pub struct Syntax {
    name: String,
    file_extensions: Vec<String>,
    keywords_case_sensitive: bool,
    keywords: Vec<String>,
    autocomplete_words: Vec<String>,
    rules: Vec<Rule>,
}

impl Syntax {
    /// Compile a raw definition.
    ///
    /// Explicit rules keep their order; the keyword list and the autocomplete word list are
    /// appended as word-bounded pattern rules (in that order).
    pub fn compile(definition: SyntaxDefinition) -> Result<Self, SyntaxError> {
        let mut rules = definition
            .rules
            .iter()
            .enumerate()
            .map(|(index, raw)| Rule::from_raw(index, raw))
            .collect::<Result<Vec<_>, _>>()?;

        let case_sensitive = definition.keywords_case_sensitive;
        if let Some(pattern) = word_list_pattern(&definition.keywords) {
            rules.push(Rule {
                category: Category::Keyword,
                matcher: Matcher::Pattern(compile_regex(&pattern, case_sensitive)?),
                multiline: false,
                stop_at_end_of_line: false,
            });
        }
        if let Some(pattern) = word_list_pattern(&definition.autocomplete_words) {
            rules.push(Rule {
                category: Category::Autocomplete,
                matcher: Matcher::Pattern(compile_regex(&pattern, case_sensitive)?),
                multiline: false,
                stop_at_end_of_line: false,
            });
        }

        Ok(Self {
            name: definition.name,
            file_extensions: definition.file_extensions,
            keywords_case_sensitive: case_sensitive,
            keywords: definition.keywords,
            autocomplete_words: definition.autocomplete_words,
            rules,
        })
    }

    /// Build a syntax directly from compiled rules (no keyword lists).
    pub fn from_rules(name: impl Into<String>, rules: Vec<Rule>) -> Self {
        Self {
            name: name.into(),
            file_extensions: Vec::new(),
            keywords_case_sensitive: true,
            keywords: Vec::new(),
            autocomplete_words: Vec::new(),
            rules,
        }
    }

    /// Definition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Associated file extensions.
    pub fn file_extensions(&self) -> &[String] {
        &self.file_extensions
    }

    /// Whether keyword lists match case-sensitively.
    pub fn keywords_case_sensitive(&self) -> bool {
        self.keywords_case_sensitive
    }

    /// Keyword list.
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Autocomplete word list.
    pub fn autocomplete_words(&self) -> &[String] {
        &self.autocomplete_words
    }

    /// Keywords followed by autocomplete words.
    pub fn completion_words(&self) -> impl Iterator<Item = &str> {
        self.keywords
            .iter()
            .chain(self.autocomplete_words.iter())
            .map(String::as_str)
    }

    /// Compiled rules in match-priority order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

fn compile_regex(pattern: &str, case_sensitive: bool) -> Result<Regex, SyntaxError> {
    RegexBuilder::new(pattern)
        .case_insensitive(!case_sensitive)
        .build()
        .map_err(|err| SyntaxError::RegexCompile {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Build an alternation that matches any of `words` as a whole word.
///
/// `\b` is only added on sides where the word itself starts/ends with a word character, so
/// entries such as `#include` still match.
fn word_list_pattern(words: &[String]) -> Option<String> {
    let mut words: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return None;
    }
    words.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
    words.dedup();

    let alternatives: Vec<String> = words
        .iter()
        .map(|word| {
            let leading = word.chars().next().is_some_and(is_word_char);
            let trailing = word.chars().last().is_some_and(is_word_char);
            format!(
                "{}{}{}",
                if leading { r"\b" } else { "" },
                regex::escape(word),
                if trailing { r"\b" } else { "" }
            )
        })
        .collect();
    Some(format!("(?:{})", alternatives.join("|")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition(yaml: &str) -> SyntaxDefinition {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_keywords_append_a_word_bounded_rule() {
        let syntax = Syntax::compile(definition(
            "name: T\nkeywords: [bar, '#include']\nrules:\n  - category: comment\n    begin: '//'\n",
        ))
        .unwrap();
        assert_eq!(syntax.rules().len(), 2);
        assert_eq!(syntax.rules()[1].category(), Category::Keyword);

        let Matcher::Pattern(regex) = syntax.rules()[1].matcher() else {
            panic!("keyword rule should be a pattern");
        };
        assert!(regex.is_match("bar baz"));
        assert!(!regex.is_match("barbaz"));
        assert!(regex.is_match("#include <x>"));
    }

    #[test]
    fn test_case_insensitive_keywords() {
        let syntax = Syntax::compile(definition(
            "name: T\nkeywords_case_sensitive: false\nkeywords: [select]\n",
        ))
        .unwrap();
        let Matcher::Pattern(regex) = syntax.rules()[0].matcher() else {
            panic!("keyword rule should be a pattern");
        };
        assert!(regex.is_match("SELECT *"));
    }

    #[test]
    fn test_invalid_rules_are_rejected() {
        let err = Syntax::compile(definition(
            "name: T\nrules:\n  - category: string\n    pattern: 'a'\n    begin: 'b'\n",
        ))
        .unwrap_err();
        assert!(matches!(err, SyntaxError::InvalidRule { index: 0, .. }));

        let err = Syntax::compile(definition(
            "name: T\nrules:\n  - category: number\n    pattern: '(['\n",
        ))
        .unwrap_err();
        assert!(matches!(err, SyntaxError::RegexCompile { .. }));
    }
}
