//! Autocomplete candidates.
//!
//! The candidate set is built from the active syntax's keyword and autocomplete word lists
//! and/or an external [`WordSupplier`]. It is rebuilt lazily after the syntax, the supplier or the
//! options change (or after [`AutocompleteEngine::invalidate`]), never per keystroke.
//!
//! The suggestion delay is enforced by the host's event loop; [`SuggestionDebouncer`] is a pure
//! helper for that: every keystroke supersedes the previous request, and only the latest request
//! fires once the delay has elapsed.

use codepane_syntax::Syntax;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;
use std::rc::Weak;
use std::time::{Duration, Instant};
use unicode_segmentation::UnicodeSegmentation;

/// Default suggestion delay in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Supplies completion words from outside the syntax definition (symbols of the document,
/// project identifiers, ...).
pub trait WordSupplier {
    /// Words offered for completion.
    fn words_for_completion(&self) -> BTreeSet<String>;
}

/// Where candidates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    /// Keyword and autocomplete word lists of the active syntax.
    #[default]
    Keywords,
    /// The word supplier. Falls back to the syntax words while no supplier is set.
    Supplier,
    /// Both. For words differing only in case, the supplier's spelling wins.
    Both,
}

/// Autocomplete switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteOptions {
    /// Whether suggestions are offered at all.
    pub enabled: bool,
    /// Idle time after a keystroke before the host should request suggestions.
    pub delay_ms: u64,
    /// Whether syntax keywords are part of the candidate set.
    pub with_keywords: bool,
    /// Default case sensitivity of prefix matching.
    pub case_sensitive: bool,
    /// Candidate source.
    pub source: CandidateSource,
}

impl Default for AutocompleteOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_ms: DEFAULT_DELAY_MS,
            with_keywords: true,
            case_sensitive: true,
            source: CandidateSource::default(),
        }
    }
}

impl AutocompleteOptions {
    /// The suggestion delay.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// Candidate set and prefix matcher.
pub struct AutocompleteEngine {
    options: AutocompleteOptions,
    syntax_words: Vec<String>,
    supplier: Option<Weak<dyn WordSupplier>>,
    candidates: BTreeSet<String>,
    /// Keywords that differ from a supplied word only in case.
    shadowed: BTreeSet<String>,
    dirty: bool,
}

impl std::fmt::Debug for AutocompleteEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutocompleteEngine")
            .field("options", &self.options)
            .field("syntax_words", &self.syntax_words.len())
            .field("has_supplier", &self.supplier.is_some())
            .field("candidates", &self.candidates.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

impl AutocompleteEngine {
    /// Create an engine for `syntax`.
    pub fn new(syntax: &Syntax, options: AutocompleteOptions) -> Self {
        Self {
            options,
            syntax_words: syntax.completion_words().map(str::to_string).collect(),
            supplier: None,
            candidates: BTreeSet::new(),
            shadowed: BTreeSet::new(),
            dirty: true,
        }
    }

    /// Current options.
    pub fn options(&self) -> AutocompleteOptions {
        self.options
    }

    /// Change options. Source changes take effect on the next query.
    pub fn set_options(&mut self, options: AutocompleteOptions) {
        if self.options.source != options.source
            || self.options.with_keywords != options.with_keywords
        {
            self.dirty = true;
        }
        self.options = options;
    }

    /// Take keywords from a new syntax.
    pub fn set_syntax(&mut self, syntax: &Syntax) {
        self.syntax_words = syntax.completion_words().map(str::to_string).collect();
        self.dirty = true;
    }

    /// Set (or clear) the word supplier.
    pub fn set_supplier(&mut self, supplier: Option<Weak<dyn WordSupplier>>) {
        self.supplier = supplier;
        self.dirty = true;
    }

    /// The supplier's words changed; rebuild on the next query.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// The candidate set, rebuilt first if needed.
    pub fn candidates(&mut self) -> &BTreeSet<String> {
        if self.dirty {
            self.rebuild();
        }
        &self.candidates
    }

    /// Candidates starting with `prefix`, in lexicographic order.
    ///
    /// A candidate as long as the prefix (i.e. the fully typed word itself) is never suggested.
    /// Case-insensitive matching also hides keywords that a supplied word spells in another case.
    pub fn suggest(&mut self, prefix: &str, case_sensitive: bool) -> Vec<String> {
        let prefix_len = prefix.chars().count();
        if self.dirty {
            self.rebuild();
        }
        self.candidates
            .iter()
            .filter(|word| word.chars().count() > prefix_len)
            .filter(|word| case_sensitive || !self.shadowed.contains(*word))
            .filter(|word| {
                if case_sensitive {
                    word.starts_with(prefix)
                } else {
                    starts_with_ignore_case(word, prefix)
                }
            })
            .cloned()
            .collect()
    }

    fn rebuild(&mut self) {
        self.dirty = false;
        let supplied = self
            .supplier
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|supplier| supplier.words_for_completion());
        let keywords = self
            .syntax_words
            .iter()
            .filter(|_| self.options.with_keywords)
            .cloned();

        self.shadowed.clear();
        self.candidates = match (self.options.source, supplied) {
            (CandidateSource::Keywords, _) | (CandidateSource::Supplier, None) => {
                keywords.collect()
            }
            (CandidateSource::Supplier, Some(words)) => words,
            (CandidateSource::Both, None) => keywords.collect(),
            (CandidateSource::Both, Some(words)) => {
                let lowered: BTreeSet<String> = words.iter().map(|w| w.to_lowercase()).collect();
                let mut merged = words;
                for keyword in keywords {
                    if !merged.contains(&keyword) && lowered.contains(&keyword.to_lowercase()) {
                        self.shadowed.insert(keyword.clone());
                    }
                    merged.insert(keyword);
                }
                merged
            }
        };
        self.candidates.retain(|w| !w.is_empty());
        tracing::debug!(
            candidates = self.candidates.len(),
            source = ?self.options.source,
            "autocomplete candidates rebuilt"
        );
    }
}

fn starts_with_ignore_case(word: &str, prefix: &str) -> bool {
    let mut chars = word.chars();
    prefix.chars().all(|p| {
        chars
            .next()
            .is_some_and(|w| w == p || w.to_lowercase().eq(p.to_lowercase()))
    })
}

/// Character range of the partially typed word that ends at `offset` in `text`.
///
/// Returns an empty range at `offset` if the text before it does not end in a word.
pub fn word_prefix_at(text: &str, offset: usize) -> Range<usize> {
    let offset = offset.min(text.chars().count());
    let byte = text
        .char_indices()
        .nth(offset)
        .map_or(text.len(), |(b, _)| b);
    let Some((_, segment)) = text[..byte].split_word_bound_indices().next_back() else {
        return offset..offset;
    };
    // A segment such as "a.b" is one word to UAX #29; only its trailing identifier counts.
    let typed = segment
        .chars()
        .rev()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .count();
    offset - typed..offset
}

/// Identifies one suggestion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuggestionTicket(u64);

/// Last-request-wins scheduling of suggestion requests.
///
/// This is a pure data structure with no timers. The host calls [`SuggestionDebouncer::request`]
/// on each keystroke and polls [`SuggestionDebouncer::fire`] (or
/// [`SuggestionDebouncer::take_ready`]) from its event loop; timestamps are passed in.
#[derive(Debug, Clone)]
pub struct SuggestionDebouncer {
    delay: Duration,
    next_ticket: u64,
    pending: Option<(SuggestionTicket, Instant)>,
}

impl SuggestionDebouncer {
    /// Create a debouncer with the given idle delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            next_ticket: 0,
            pending: None,
        }
    }

    /// The idle delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Register a keystroke at `now`. Any earlier request is superseded.
    pub fn request(&mut self, now: Instant) -> SuggestionTicket {
        let ticket = SuggestionTicket(self.next_ticket);
        self.next_ticket += 1;
        self.pending = Some((ticket, now));
        ticket
    }

    /// Drop the pending request.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// When the pending request becomes ready.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|(_, at)| at + self.delay)
    }

    /// Returns `true` (and consumes the request) if `ticket` is the latest request and its delay
    /// has elapsed. Superseded tickets never fire.
    pub fn fire(&mut self, ticket: SuggestionTicket, now: Instant) -> bool {
        match self.pending {
            Some((pending, at)) if pending == ticket && now.duration_since(at) >= self.delay => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Take the pending request if its delay has elapsed.
    pub fn take_ready(&mut self, now: Instant) -> Option<SuggestionTicket> {
        let (ticket, _) = self.pending?;
        self.fire(ticket, now).then_some(ticket)
    }

    /// Returns `true` if no request is pending.
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }
}
