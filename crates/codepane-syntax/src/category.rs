//! Syntax categories and coloured spans.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// The fixed set of categories a span can be coloured with.
///
/// The UI/theme layer maps categories to actual colours; the core never deals with colours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Language keywords.
    Keyword,
    /// String literals.
    String,
    /// Line and block comments.
    Comment,
    /// Numeric literals.
    Number,
    /// Variables (e.g. `$name` in shell-like languages).
    Variable,
    /// Commands (e.g. `<tag>` in markup).
    Command,
    /// Instructions (e.g. `<?php ... ?>` processing instructions).
    Instruction,
    /// Attributes (e.g. `key=` inside a tag).
    Attribute,
    /// Words from the definition's autocomplete list.
    Autocomplete,
    /// Explicitly uncoloured text.
    Plain,
}

impl Category {
    /// All categories, in declaration order.
    pub const ALL: [Category; 10] = [
        Category::Keyword,
        Category::String,
        Category::Comment,
        Category::Number,
        Category::Variable,
        Category::Command,
        Category::Instruction,
        Category::Attribute,
        Category::Autocomplete,
        Category::Plain,
    ];

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

/// A bitset of [`Category`] values.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Category>", into = "Vec<Category>")]
pub struct CategorySet(u16);

impl CategorySet {
    /// The empty set.
    pub const fn empty() -> Self {
        Self(0)
    }

    /// The set of every category.
    pub fn all() -> Self {
        Category::ALL.into_iter().collect()
    }

    /// Returns `true` if `category` is in the set.
    pub fn contains(self, category: Category) -> bool {
        self.0 & category.bit() != 0
    }

    /// Add `category` to the set. Returns `true` if it was not present before.
    pub fn insert(&mut self, category: Category) -> bool {
        let added = !self.contains(category);
        self.0 |= category.bit();
        added
    }

    /// Remove `category` from the set. Returns `true` if it was present before.
    pub fn remove(&mut self, category: Category) -> bool {
        let removed = self.contains(category);
        self.0 &= !category.bit();
        removed
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate over the contained categories in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Category> {
        Category::ALL.into_iter().filter(move |c| self.contains(*c))
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::all()
    }
}

impl std::fmt::Debug for CategorySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Category> for CategorySet {
    fn from_iter<I: IntoIterator<Item = Category>>(iter: I) -> Self {
        let mut set = Self::empty();
        for category in iter {
            set.insert(category);
        }
        set
    }
}

impl From<Vec<Category>> for CategorySet {
    fn from(categories: Vec<Category>) -> Self {
        categories.into_iter().collect()
    }
}

impl From<CategorySet> for Vec<Category> {
    fn from(set: CategorySet) -> Self {
        set.iter().collect()
    }
}

/// A contiguous character range tagged with one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColourSpan {
    /// Start character offset (inclusive).
    pub start: usize,
    /// End character offset (exclusive).
    pub end: usize,
    /// Category of the span.
    pub category: Category,
}

impl ColourSpan {
    /// Create a new span.
    pub fn new(start: usize, end: usize, category: Category) -> Self {
        Self {
            start,
            end,
            category,
        }
    }

    /// The span as a `Range`.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the span covers no characters.
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns `true` if the span shares at least one character with `range`.
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }
}

/// Sort spans by start, clip them to `bounds`, and drop empty or overlapping ones.
///
/// When two spans overlap, the one that starts first is kept.
/// Returns the number of spans that were dropped or clipped.
pub fn normalize_spans(spans: &mut Vec<ColourSpan>, bounds: Range<usize>) -> usize {
    spans.sort_by_key(|s| (s.start, std::cmp::Reverse(s.end)));

    let mut changed = 0;
    let mut out: Vec<ColourSpan> = Vec::with_capacity(spans.len());
    for span in spans.drain(..) {
        let start = span.start.max(bounds.start);
        let end = span.end.min(bounds.end);
        if start >= end || out.last().is_some_and(|prev| prev.end > start) {
            changed += 1;
            continue;
        }
        if start != span.start || end != span.end {
            changed += 1;
        }
        out.push(ColourSpan::new(start, end, span.category));
    }

    *spans = out;
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_set_ops() {
        let mut set = CategorySet::empty();
        assert!(set.is_empty());
        assert!(set.insert(Category::Comment));
        assert!(!set.insert(Category::Comment));
        assert!(set.contains(Category::Comment));
        assert!(!set.contains(Category::String));
        assert!(set.remove(Category::Comment));
        assert!(set.is_empty());

        let all = CategorySet::all();
        assert_eq!(all.iter().count(), Category::ALL.len());
    }

    #[test]
    fn test_category_set_serde_as_list() {
        let set: CategorySet = serde_yaml::from_str("[keyword, comment]").unwrap();
        assert!(set.contains(Category::Keyword));
        assert!(set.contains(Category::Comment));
        assert!(!set.contains(Category::Number));
    }

    #[test]
    fn test_normalize_spans_drops_overlaps_and_clips() {
        let mut spans = vec![
            ColourSpan::new(5, 9, Category::String),
            ColourSpan::new(0, 3, Category::Keyword),
            ColourSpan::new(2, 4, Category::Number),
            ColourSpan::new(8, 20, Category::Comment),
        ];
        let changed = normalize_spans(&mut spans, 0..10);
        assert_eq!(
            spans,
            vec![
                ColourSpan::new(0, 3, Category::Keyword),
                ColourSpan::new(5, 9, Category::String),
            ]
        );
        assert!(changed > 0);
    }
}
