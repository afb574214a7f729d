//! Incremental syntax colouring.
//!
//! [`Colourizer`] keeps a cache of [`ColourSpan`]s for one buffer and keeps it equal to what a
//! full-buffer scan of the current text would produce.
//!
//! On an edit the colourizer rescans from the start of the line before the edit (moved back to
//! the start of any cached span crossing that point) and keeps scanning line by line until it reaches a line start
//! past the edit where both the new scan and the old cache sit between spans. From there on the
//! old spans are still valid and are shifted instead of rescanned.

use crate::delta::EditDelta;
use crate::error::EditorError;
use crate::line_index::LineIndex;
use codepane_syntax::{
    Category, CategorySet, ColourSpan, ScanError, ScanOptions, Syntax, TextWindow,
    normalize_spans, scan,
};
use ropey::Rope;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::rc::Weak;
use std::sync::Arc;

/// Extra text loaded past a pass region before the scanner asks for more.
const WINDOW_SLACK: usize = 4096;

/// External collaborator consulted around every colouring pass.
///
/// Both methods have pass-through defaults.
pub trait ColouringDelegate {
    /// Called before a pass over `range`. Returning `false` skips the pass and leaves the
    /// region uncoloured.
    fn will_colour_region(&self, range: Range<usize>) -> bool {
        let _ = range;
        true
    }

    /// Called after a pass over `range` with the spans it produced. The returned spans replace
    /// them; they are clipped to the pass and normalized before being cached.
    fn did_colour_region(&self, range: Range<usize>, spans: Vec<ColourSpan>) -> Vec<ColourSpan> {
        let _ = range;
        spans
    }
}

/// Colouring switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColouringOptions {
    /// Master switch. When off no spans are produced.
    pub syntax_coloured: bool,
    /// Whether multiline string rules may span lines.
    pub multiline_strings: bool,
    /// Whether every rule is confined to a single line.
    pub only_until_end_of_line: bool,
    /// Categories that are coloured.
    pub categories: CategorySet,
}

impl Default for ColouringOptions {
    fn default() -> Self {
        let scan = ScanOptions::default();
        Self {
            syntax_coloured: true,
            multiline_strings: scan.multiline_strings,
            only_until_end_of_line: scan.only_until_end_of_line,
            categories: scan.categories,
        }
    }
}

impl ColouringOptions {
    /// Options handed to the scanner.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            categories: self.categories,
            multiline_strings: self.multiline_strings,
            only_until_end_of_line: self.only_until_end_of_line,
        }
    }

    /// Enable or disable one category.
    pub fn set_category(&mut self, category: Category, enabled: bool) {
        if enabled {
            self.categories.insert(category);
        } else {
            self.categories.remove(category);
        }
    }
}

struct PassOutput {
    spans: Vec<ColourSpan>,
    resume_at: usize,
}

/// Span cache for one buffer.
pub struct Colourizer {
    syntax: Arc<Syntax>,
    options: ColouringOptions,
    spans: Vec<ColourSpan>,
    dirty: bool,
    last_applied: u64,
    delegate: Option<Weak<dyn ColouringDelegate>>,
}

impl std::fmt::Debug for Colourizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Colourizer")
            .field("syntax", &self.syntax.name())
            .field("options", &self.options)
            .field("span_count", &self.spans.len())
            .field("dirty", &self.dirty)
            .field("last_applied", &self.last_applied)
            .field("has_delegate", &self.delegate.is_some())
            .finish()
    }
}

impl Colourizer {
    /// Create a colourizer. The first query colours the whole buffer.
    pub fn new(syntax: Arc<Syntax>, options: ColouringOptions, edit_counter: u64) -> Self {
        Self {
            syntax,
            options,
            spans: Vec::new(),
            dirty: true,
            last_applied: edit_counter,
            delegate: None,
        }
    }

    /// The active syntax.
    pub fn syntax(&self) -> &Arc<Syntax> {
        &self.syntax
    }

    /// Current options.
    pub fn options(&self) -> ColouringOptions {
        self.options
    }

    /// Edit counter of the last applied delta.
    pub fn last_applied(&self) -> u64 {
        self.last_applied
    }

    /// Returns `true` if the next query recolours the whole buffer.
    pub fn needs_full_recolour(&self) -> bool {
        self.dirty
    }

    /// Switch syntax. The whole cache is invalidated.
    pub fn set_syntax(&mut self, syntax: Arc<Syntax>) {
        self.syntax = syntax;
        self.invalidate();
    }

    /// Change options.
    ///
    /// Disabling categories drops their cached spans and keeps everything else. Any other change
    /// (including re-enabling a category) invalidates the whole cache.
    pub fn set_options(&mut self, options: ColouringOptions) {
        let old = self.options;
        self.options = options;
        if old == options {
            return;
        }

        let only_disabled = old.syntax_coloured == options.syntax_coloured
            && old.multiline_strings == options.multiline_strings
            && old.only_until_end_of_line == options.only_until_end_of_line
            && options.categories.iter().all(|c| old.categories.contains(c));
        if only_disabled && !self.dirty {
            let before = self.spans.len();
            self.spans.retain(|s| options.categories.contains(s.category));
            tracing::debug!(
                dropped = before - self.spans.len(),
                "dropped spans of disabled categories"
            );
        } else {
            self.invalidate();
        }
    }

    /// Set (or clear) the colouring delegate.
    pub fn set_delegate(&mut self, delegate: Option<Weak<dyn ColouringDelegate>>) {
        self.delegate = delegate;
    }

    /// Drop the cache; the next query recolours the whole buffer.
    pub fn invalidate(&mut self) {
        self.spans.clear();
        self.dirty = true;
    }

    /// Colour the whole buffer now if the cache was invalidated. Returns the recoloured range.
    pub fn ensure_coloured(&mut self, rope: &Rope) -> Option<Range<usize>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        let len = rope.len_chars();
        self.spans = if self.options.syntax_coloured {
            self.pass(rope, 0..len)
                .map(|out| out.spans)
                .unwrap_or_default()
        } else {
            Vec::new()
        };
        tracing::debug!(
            syntax = self.syntax.name(),
            spans = self.spans.len(),
            "full recolour"
        );
        Some(0..len)
    }

    /// All cached spans.
    pub fn spans(&mut self, rope: &Rope) -> Vec<ColourSpan> {
        self.ensure_coloured(rope);
        self.spans.clone()
    }

    /// Cached spans overlapping `range`.
    pub fn spans_in(&mut self, rope: &Rope, range: Range<usize>) -> Vec<ColourSpan> {
        self.ensure_coloured(rope);
        let first = self.spans.partition_point(|s| s.end <= range.start);
        self.spans[first..]
            .iter()
            .take_while(|s| s.start < range.end)
            .copied()
            .collect()
    }

    /// Run one colouring pass over `region` without touching the cache.
    ///
    /// Spans starting inside the region are reported whole, even if they end past it. Returns an
    /// empty list if the delegate refuses the pass or colouring is switched off.
    pub fn colourize(&self, rope: &Rope, region: Range<usize>) -> Vec<ColourSpan> {
        if !self.options.syntax_coloured {
            return Vec::new();
        }
        self.pass(rope, region)
            .map(|out| out.spans)
            .unwrap_or_default()
    }

    /// Update the cache for an edit.
    ///
    /// `rope` and `lines` describe the buffer after the edit. Returns the recoloured range in
    /// post-edit offsets.
    pub fn apply_edit(
        &mut self,
        rope: &Rope,
        lines: &LineIndex,
        delta: &EditDelta,
    ) -> Result<Range<usize>, EditorError> {
        if delta.edit_counter <= self.last_applied {
            return Err(EditorError::StaleNotification {
                received: delta.edit_counter,
                last_applied: self.last_applied,
            });
        }
        self.last_applied = delta.edit_counter;

        let len = rope.len_chars();
        if !self.options.syntax_coloured {
            self.spans.clear();
            return Ok(delta.new_range());
        }
        if self.dirty {
            return Ok(0..len);
        }

        let s = delta.range_start;
        let new_end = delta.new_end();
        let to_old = |offset: usize| offset + delta.range_length - delta.inserted_length;

        // Restart point: start of the line before the edited line, widened to span starts.
        let line = lines.line_containing(s)?;
        let mut restart = lines.line_start(line.saturating_sub(1))?;
        let crossing = self.spans.partition_point(|s| s.end <= restart);
        if let Some(cached) = self.spans.get(crossing)
            && cached.start < restart
        {
            restart = cached.start;
        }

        let mut fresh = Vec::new();
        let mut pos = restart;
        let mut region_end = lines.next_line_start_after(new_end).unwrap_or(len);
        let synced_at = loop {
            let Some(out) = self.pass(rope, pos..region_end) else {
                break region_end;
            };
            fresh.extend(out.spans);
            pos = out.resume_at.max(region_end);
            if pos >= len {
                break len;
            }
            if pos > new_end && lines.is_line_start(pos) && self.old_cache_free_at(to_old(pos)) {
                break pos;
            }
            region_end = lines.next_line_start_after(pos).unwrap_or(len);
        };

        let keep_before = self.spans.partition_point(|s| s.start < restart);
        let old_sync = to_old(synced_at);
        let keep_after = self.spans.partition_point(|s| s.start < old_sync);
        let mut tail: Vec<ColourSpan> = self.spans.drain(keep_after..).collect();
        for cached in &mut tail {
            cached.start = delta.shift(cached.start);
            cached.end = delta.shift(cached.end);
        }
        self.spans.truncate(keep_before);
        let fresh_count = fresh.len();
        self.spans.extend(fresh);
        self.spans.extend(tail);

        tracing::debug!(
            restart,
            synced_at,
            fresh = fresh_count,
            "incremental recolour"
        );
        Ok(restart..synced_at)
    }

    fn old_cache_free_at(&self, offset: usize) -> bool {
        let after = self.spans.partition_point(|s| s.start < offset);
        after == 0 || self.spans[after - 1].end <= offset
    }

    fn pass(&self, rope: &Rope, region: Range<usize>) -> Option<PassOutput> {
        let delegate = self.delegate.as_ref().and_then(Weak::upgrade);
        if let Some(delegate) = delegate.as_ref()
            && !delegate.will_colour_region(region.clone())
        {
            tracing::warn!(?region, "colouring delegate refused pass");
            return None;
        }

        let len = rope.len_chars();
        let window_start = region.start.saturating_sub(1);
        let options = self.options.scan_options();
        let mut slack = WINDOW_SLACK;
        let out = loop {
            let window_end = region.end.saturating_add(slack).min(len);
            let text = rope.slice(window_start..window_end).to_string();
            let window = TextWindow::new(&text, window_start, window_end == len);
            match scan(&self.syntax, &window, region.clone(), &options) {
                Ok(out) => break out,
                Err(ScanError::NeedMoreText) => slack = slack.saturating_mul(2),
            }
        };

        let Some(delegate) = delegate else {
            return Some(PassOutput {
                spans: out.spans,
                resume_at: out.resume_at,
            });
        };

        let mut amended = delegate.did_colour_region(region.clone(), out.spans);
        let adjusted = normalize_spans(&mut amended, region.start..out.resume_at);
        if adjusted > 0 {
            tracing::warn!(
                ?region,
                adjusted,
                "colouring delegate returned overlapping or out-of-range spans"
            );
        }
        Some(PassOutput {
            spans: amended,
            resume_at: out.resume_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::TextBuffer;
    use codepane_syntax::{SyntaxDefinition, scan_text};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DEF: &str = r#"
name: Test
keywords: [bar, let]
rules:
  - category: comment
    begin: '//'
  - category: comment
    begin: '/\*'
    end: '\*/'
    multiline: true
  - category: string
    begin: '"'
    end: '"'
    escape: '\'
    multiline: true
  - category: number
    pattern: '\b\d+\b'
"#;

    fn syntax() -> Arc<Syntax> {
        let definition: SyntaxDefinition = serde_yaml::from_str(DEF).unwrap();
        Arc::new(Syntax::compile(definition).unwrap())
    }

    struct Fixture {
        buffer: TextBuffer,
        lines: LineIndex,
        colourizer: Colourizer,
    }

    impl Fixture {
        fn new(text: &str) -> Self {
            let buffer = TextBuffer::new(text);
            let lines = LineIndex::from_rope(buffer.rope(), 0);
            let mut colourizer = Colourizer::new(syntax(), ColouringOptions::default(), 0);
            colourizer.ensure_coloured(buffer.rope());
            Self {
                buffer,
                lines,
                colourizer,
            }
        }

        fn edit(&mut self, range: Range<usize>, text: &str) -> Range<usize> {
            let delta = self.buffer.replace(range, text).unwrap();
            self.lines.apply(self.buffer.rope(), &delta).unwrap();
            let recoloured = self
                .colourizer
                .apply_edit(self.buffer.rope(), &self.lines, &delta)
                .unwrap();
            let full = scan_text(
                self.colourizer.syntax(),
                &self.buffer.text(),
                &self.colourizer.options().scan_options(),
            );
            assert_eq!(self.colourizer.spans(self.buffer.rope()), full);
            recoloured
        }
    }

    #[test]
    fn test_keyword_split_recolours_locally() {
        let mut fx = Fixture::new("foo\nbarbaz\n");
        assert!(fx.colourizer.spans(fx.buffer.rope()).is_empty());
        fx.edit(7..7, " ");
        assert_eq!(
            fx.colourizer.spans(fx.buffer.rope()),
            vec![ColourSpan::new(4, 7, Category::Keyword)]
        );
    }

    #[test]
    fn test_opening_and_closing_block_comments() {
        let mut fx = Fixture::new("let a = 1;\nlet b = 2;\nlet c = 3;\n/* x */ let d = 4;\n");
        // Opening a comment swallows everything up to the existing closer.
        fx.edit(11..11, "/*");
        // Closing it early restores the tail.
        fx.edit(15..15, "*/");
        // Removing the opener again.
        fx.edit(11..13, "");
    }

    #[test]
    fn test_unterminated_string_to_end_of_buffer() {
        let mut fx = Fixture::new("1\n2\n3\n4\n");
        let recoloured = fx.edit(2..2, "\"");
        assert_eq!(recoloured.end, fx.buffer.len());
        fx.edit(7..7, "\"");
        fx.edit(2..3, "");
    }

    #[test]
    fn test_far_edit_keeps_shifted_spans() {
        let text = (0..200)
            .map(|i| format!("let v{i} = {i}; // note\n"))
            .collect::<String>();
        let mut fx = Fixture::new(&text);
        let recoloured = fx.edit(0..0, "x");
        assert!(recoloured.end < 100, "recoloured {recoloured:?}");
        fx.edit(30..35, "\n\n");
    }

    #[test]
    fn test_disabling_a_category_keeps_other_spans() {
        let mut fx = Fixture::new("let x = 1; // c\n");
        let mut options = fx.colourizer.options();
        options.set_category(Category::Comment, false);
        fx.colourizer.set_options(options);
        assert!(!fx.colourizer.needs_full_recolour());
        assert_eq!(
            fx.colourizer.spans(fx.buffer.rope()),
            vec![
                ColourSpan::new(0, 3, Category::Keyword),
                ColourSpan::new(8, 9, Category::Number),
            ]
        );

        options.set_category(Category::Comment, true);
        fx.colourizer.set_options(options);
        assert!(fx.colourizer.needs_full_recolour());
        assert_eq!(fx.colourizer.spans(fx.buffer.rope()).len(), 3);
    }

    #[test]
    fn test_switched_off_produces_nothing() {
        let mut fx = Fixture::new("let x = 1;\n");
        let mut options = fx.colourizer.options();
        options.syntax_coloured = false;
        fx.colourizer.set_options(options);
        assert!(fx.colourizer.spans(fx.buffer.rope()).is_empty());
        assert!(fx.colourizer.colourize(fx.buffer.rope(), 0..5).is_empty());
    }

    #[derive(Default)]
    struct Recording {
        regions: RefCell<Vec<Range<usize>>>,
        refuse: bool,
    }

    impl ColouringDelegate for Recording {
        fn will_colour_region(&self, range: Range<usize>) -> bool {
            self.regions.borrow_mut().push(range);
            !self.refuse
        }

        fn did_colour_region(
            &self,
            _: Range<usize>,
            mut spans: Vec<ColourSpan>,
        ) -> Vec<ColourSpan> {
            spans.retain(|s| s.category != Category::Number);
            spans
        }
    }

    #[test]
    fn test_delegate_sees_regions_and_amends_results() {
        let buffer = TextBuffer::new("let x = 1;\nlet y = 2;\n");
        let mut colourizer = Colourizer::new(syntax(), ColouringOptions::default(), 0);
        let delegate = Rc::new(Recording::default());
        let weak: Weak<dyn ColouringDelegate> = Rc::downgrade(&delegate) as Weak<Recording>;
        colourizer.set_delegate(Some(weak));

        let spans = colourizer.spans(buffer.rope());
        assert_eq!(*delegate.regions.borrow(), vec![0..buffer.len()]);
        assert!(spans.iter().all(|s| s.category == Category::Keyword));

        // A dropped delegate is tolerated.
        drop(delegate);
        colourizer.invalidate();
        assert_eq!(colourizer.spans(buffer.rope()).len(), 4);
    }

    #[test]
    fn test_refused_pass_leaves_region_uncoloured() {
        let buffer = TextBuffer::new("let x = 1;\n");
        let mut colourizer = Colourizer::new(syntax(), ColouringOptions::default(), 0);
        let delegate = Rc::new(Recording {
            refuse: true,
            ..Recording::default()
        });
        let weak: Weak<dyn ColouringDelegate> = Rc::downgrade(&delegate) as Weak<Recording>;
        colourizer.set_delegate(Some(weak));
        assert!(colourizer.spans(buffer.rope()).is_empty());
        assert_eq!(delegate.regions.borrow().len(), 1);
    }

    #[test]
    fn test_stale_edit_is_rejected() {
        let mut fx = Fixture::new("let a;\n");
        let delta = fx.buffer.replace(0..0, "x").unwrap();
        fx.lines.apply(fx.buffer.rope(), &delta).unwrap();
        fx.colourizer
            .apply_edit(fx.buffer.rope(), &fx.lines, &delta)
            .unwrap();
        assert!(matches!(
            fx.colourizer.apply_edit(fx.buffer.rope(), &fx.lines, &delta),
            Err(EditorError::StaleNotification { .. })
        ));
    }
}
