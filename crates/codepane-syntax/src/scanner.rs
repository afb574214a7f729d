//! Region scanner.
//!
//! The scanner walks a region left to right. At every position each enabled rule proposes its
//! earliest candidate; the candidate that starts first wins, ties go to the longest candidate and
//! then to rule order. Scanning resumes at the end of the winning span, so spans never overlap.
//!
//! Pattern rules and delimiter openings are always matched within a single line. Only the
//! closing delimiter of a multiline rule is searched across lines.
//!
//! The scanner works on a [`TextWindow`]: a slice of the document that covers the region plus
//! some context. If a decision needs text beyond the window, [`ScanError::NeedMoreText`] is
//! returned and the caller retries with a larger window.

use crate::category::{Category, CategorySet, ColourSpan};
use crate::error::ScanError;
use crate::syntax::{Matcher, Rule, Syntax};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Options consulted once per scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanOptions {
    /// Categories whose rules take part in the scan.
    pub categories: CategorySet,
    /// Whether multiline string rules may span lines.
    pub multiline_strings: bool,
    /// Whether every rule is confined to a single line.
    pub only_until_end_of_line: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            categories: CategorySet::all(),
            multiline_strings: true,
            only_until_end_of_line: false,
        }
    }
}

impl ScanOptions {
    fn allows_multiline(&self, rule: &Rule) -> bool {
        rule.is_multiline()
            && !rule.stops_at_end_of_line()
            && !self.only_until_end_of_line
            && (rule.category() != Category::String || self.multiline_strings)
    }
}

/// A slice of document text handed to the scanner.
#[derive(Debug)]
pub struct TextWindow<'a> {
    text: &'a str,
    char_start: usize,
    reaches_end: bool,
    /// Byte offset of every char, plus `text.len()`.
    char_bytes: Vec<usize>,
}

impl<'a> TextWindow<'a> {
    /// Create a window over `text`, which starts at character offset `char_start` of the
    /// document. `reaches_end` tells whether the window extends to the end of the document.
    pub fn new(text: &'a str, char_start: usize, reaches_end: bool) -> Self {
        let mut char_bytes: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        char_bytes.push(text.len());
        Self {
            text,
            char_start,
            reaches_end,
            char_bytes,
        }
    }

    /// A window covering a complete document.
    pub fn whole(text: &'a str) -> Self {
        Self::new(text, 0, true)
    }

    /// Document offset of the first character in the window.
    pub fn char_start(&self) -> usize {
        self.char_start
    }

    /// Document offset one past the last character in the window.
    pub fn char_end(&self) -> usize {
        self.char_start + self.char_bytes.len() - 1
    }

    /// Whether the window extends to the end of the document.
    pub fn reaches_end(&self) -> bool {
        self.reaches_end
    }

    fn byte_of(&self, char_offset: usize) -> usize {
        let local = char_offset
            .saturating_sub(self.char_start)
            .min(self.char_bytes.len() - 1);
        self.char_bytes[local]
    }

    fn char_of(&self, byte: usize) -> usize {
        let local = match self.char_bytes.binary_search(&byte) {
            Ok(i) | Err(i) => i,
        };
        self.char_start + local
    }
}

/// Result of scanning one region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOutput {
    /// Spans that start inside the region, ordered and non-overlapping. The last span may end
    /// past the region.
    pub spans: Vec<ColourSpan>,
    /// Document offset where a following scan must resume: the region end, or the end of the
    /// last span if it extends past the region.
    pub resume_at: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    start: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Unknown,
    Exhausted,
    Found(Candidate),
}

/// Scan `region` (document character offsets) of `window` with `syntax`.
pub fn scan(
    syntax: &Syntax,
    window: &TextWindow<'_>,
    region: Range<usize>,
    options: &ScanOptions,
) -> Result<ScanOutput, ScanError> {
    let region_start = region.start.clamp(window.char_start(), window.char_end());
    let region_end = region.end.clamp(region_start, window.char_end());
    let limit = window.byte_of(region_end);
    let mut pos = window.byte_of(region_start);

    let rules: Vec<&Rule> = syntax
        .rules()
        .iter()
        .filter(|r| options.categories.contains(r.category()))
        .collect();
    let mut slots = vec![Slot::Unknown; rules.len()];
    let mut spans = Vec::new();
    let mut last_end = region_end;

    loop {
        let mut best: Option<(usize, Candidate)> = None;
        for (index, rule) in rules.iter().enumerate() {
            let stale = match slots[index] {
                Slot::Unknown => true,
                Slot::Found(candidate) => candidate.start < pos,
                Slot::Exhausted => false,
            };
            if stale {
                slots[index] = find_candidate(rule, window, pos, limit, options)?;
            }
            let Slot::Found(candidate) = slots[index] else {
                continue;
            };
            let better = match best {
                None => true,
                Some((_, current)) => {
                    candidate.start < current.start
                        || (candidate.start == current.start && candidate.end > current.end)
                }
            };
            if better {
                best = Some((index, candidate));
            }
        }

        let Some((index, winner)) = best else {
            break;
        };
        let span = ColourSpan::new(
            window.char_of(winner.start),
            window.char_of(winner.end),
            rules[index].category(),
        );
        last_end = last_end.max(span.end);
        spans.push(span);
        pos = winner.end;
    }

    Ok(ScanOutput {
        spans,
        resume_at: last_end,
    })
}

/// Scan a complete document.
pub fn scan_text(syntax: &Syntax, text: &str, options: &ScanOptions) -> Vec<ColourSpan> {
    let window = TextWindow::whole(text);
    // A window that reaches the end of the document never needs more text.
    scan(syntax, &window, 0..window.char_end(), options)
        .map(|out| out.spans)
        .unwrap_or_default()
}

fn find_candidate(
    rule: &Rule,
    window: &TextWindow<'_>,
    from: usize,
    limit: usize,
    options: &ScanOptions,
) -> Result<Slot, ScanError> {
    match rule.matcher() {
        Matcher::Pattern(regex) => Ok(match find_in_lines(regex, window, from, limit)? {
            Some((start, end)) => Slot::Found(Candidate { start, end }),
            None => Slot::Exhausted,
        }),
        Matcher::Delimited { begin, end, escape } => {
            let Some((start, begin_end)) = find_in_lines(begin, window, from, limit)? else {
                return Ok(Slot::Exhausted);
            };
            let end = find_closing(
                window,
                begin_end,
                end.as_ref(),
                *escape,
                options.allows_multiline(rule),
            )?;
            Ok(Slot::Found(Candidate { start, end }))
        }
    }
}

/// Find the first non-empty match of `regex` starting in `from..limit`, searching one line at a
/// time so that no match crosses a line terminator.
fn find_in_lines(
    regex: &Regex,
    window: &TextWindow<'_>,
    mut from: usize,
    limit: usize,
) -> Result<Option<(usize, usize)>, ScanError> {
    let text = window.text;
    while from < limit {
        let line_end = line_end_at(text, from);
        if line_end == text.len() && !window.reaches_end() {
            return Err(ScanError::NeedMoreText);
        }

        let line = &text[..line_end];
        let mut at = from;
        while let Some(m) = regex.find_at(line, at) {
            if m.start() >= limit {
                return Ok(None);
            }
            if !m.is_empty() {
                return Ok(Some((m.start(), m.end())));
            }
            if m.end() >= line_end {
                break;
            }
            at = m.end() + char_len_at(text, m.end());
        }

        from = skip_terminator(text, line_end);
    }
    Ok(None)
}

/// Find the end byte of a delimited span opened at `from`. A single-line span ends at the first
/// closing delimiter on its line or at the line end.
fn find_closing(
    window: &TextWindow<'_>,
    from: usize,
    closing: Option<&Regex>,
    escape: Option<char>,
    multiline: bool,
) -> Result<usize, ScanError> {
    let text = window.text;
    let line_end = line_end_at(text, from);
    let line_is_cut = line_end == text.len() && !window.reaches_end();

    let Some(closing) = closing else {
        if line_is_cut {
            return Err(ScanError::NeedMoreText);
        }
        return Ok(line_end);
    };
    if !multiline && line_is_cut {
        return Err(ScanError::NeedMoreText);
    }

    let haystack = if multiline { text } else { &text[..line_end] };
    let mut at = from;
    while let Some(m) = closing.find_at(haystack, at) {
        if !is_escaped(text, from, m.start(), escape) {
            if multiline && m.end() == text.len() && !window.reaches_end() {
                return Err(ScanError::NeedMoreText);
            }
            return Ok(m.end());
        }
        if m.start() >= haystack.len() {
            break;
        }
        at = m.start() + char_len_at(text, m.start());
    }

    if !multiline {
        return Ok(line_end);
    }
    if !window.reaches_end() {
        return Err(ScanError::NeedMoreText);
    }
    Ok(text.len())
}

fn is_escaped(text: &str, from: usize, at: usize, escape: Option<char>) -> bool {
    let Some(escape) = escape else {
        return false;
    };
    let run = text[from..at]
        .chars()
        .rev()
        .take_while(|c| *c == escape)
        .count();
    run % 2 == 1
}

fn line_end_at(text: &str, from: usize) -> usize {
    text[from..]
        .find(['\n', '\r'])
        .map_or(text.len(), |i| from + i)
}

fn skip_terminator(text: &str, line_end: usize) -> usize {
    if text[line_end..].starts_with("\r\n") {
        line_end + 2
    } else {
        (line_end + 1).min(text.len())
    }
}

fn char_len_at(text: &str, byte: usize) -> usize {
    text[byte..].chars().next().map_or(1, char::len_utf8)
}
