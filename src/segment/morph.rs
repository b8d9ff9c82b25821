//! Morphological capability backing the Hangul break-scoring branch.
//!
//! The analyzer itself is an external collaborator; this module defines the
//! tag vocabulary the scorer understands, the injection point for a
//! backend, and the per-call cache that turns one whole-sentence analysis
//! into cheap per-candidate lookups.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Part-of-speech categories the break scorer distinguishes. Backends map
/// their native tag sets onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphTag {
    /// Clause-connective verb ending (-고, -며, -면).
    ConnectiveEnding,
    /// Sentence-final verb ending (-다, -요).
    SentenceFinalEnding,
    /// Nominalizing ending (-기, -음).
    NominalizingEnding,
    /// Pre-nominal modifier ending (-은/-는/-을); binds tightly to the
    /// noun that follows.
    PrenominalEnding,
    /// Case particle (이/가, 을/를, 에서).
    CaseParticle,
    /// Topic or auxiliary particle (은/는, 도, 만).
    TopicParticle,
    /// Conjunctive particle (와/과, 하고).
    ConjunctiveParticle,
    /// Dependent noun (것, 수, 데).
    DependentNoun,
    /// Auxiliary verb heading a support construction (있다, 싶다).
    AuxiliaryVerb,
    /// Determiner (그, 이, 새).
    Determiner,
    /// Numeral.
    Numeral,
    /// Everything the scorer has no special rule for.
    Other,
}

/// One analyzed morpheme with its char span in the analyzed sentence
/// (`end` exclusive).
#[derive(Debug, Clone)]
pub struct MorphToken {
    pub surface: String,
    pub start: usize,
    pub end: usize,
    pub tag: MorphTag,
}

impl MorphToken {
    pub fn new(surface: impl Into<String>, start: usize, end: usize, tag: MorphTag) -> Self {
        Self {
            surface: surface.into(),
            start,
            end,
            tag,
        }
    }
}

/// Backend interface for whole-sentence morphological analysis.
pub trait MorphAnalyze: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<MorphToken>;
}

/// Morphological-analysis capability. Segmentation degrades to
/// punctuation-only scoring when `Absent`; callers decide availability once
/// at construction.
#[derive(Clone, Default)]
pub enum MorphTagger {
    Backend(Arc<dyn MorphAnalyze>),
    #[default]
    Absent,
}

impl MorphTagger {
    pub fn is_available(&self) -> bool {
        matches!(self, MorphTagger::Backend(_))
    }

    pub(crate) fn analyze(&self, text: &str) -> Option<Vec<MorphToken>> {
        match self {
            MorphTagger::Backend(backend) => Some(backend.analyze(text)),
            MorphTagger::Absent => None,
        }
    }
}

impl fmt::Debug for MorphTagger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MorphTagger::Backend(_) => f.write_str("MorphTagger::Backend(..)"),
            MorphTagger::Absent => f.write_str("MorphTagger::Absent"),
        }
    }
}

/// Morphological context around one whitespace break position.
#[derive(Debug, Clone, Default)]
pub(crate) struct BreakContext {
    /// Tag of the last morpheme in the word ending at this whitespace.
    pub prev_last_tag: Option<MorphTag>,
    /// Tag of the last morpheme in the word before that one.
    pub prev_prev_last_tag: Option<MorphTag>,
    /// Surface of the word ending at this whitespace.
    pub prev_word: String,
    /// Tag of the first morpheme in the word after this whitespace.
    pub next_first_tag: Option<MorphTag>,
    /// Tag of the second morpheme in the word after this whitespace.
    pub next_second_tag: Option<MorphTag>,
}

/// Word-boundary morphology for one sentence, keyed by whitespace char
/// offset. Computed once per segmentation call so every candidate lookup is
/// a map hit rather than a fresh analysis.
#[derive(Debug, Default)]
pub struct SentenceMorphology {
    breaks: HashMap<usize, BreakContext>,
}

impl SentenceMorphology {
    /// Runs the backend over `text` and indexes the result by whitespace
    /// offset. Returns an empty cache when the tagger is absent.
    pub(crate) fn analyze(tagger: &MorphTagger, text: &str) -> Self {
        let Some(tokens) = tagger.analyze(text) else {
            return Self::default();
        };

        let words = word_spans(text);
        let mut word_tokens: Vec<Vec<&MorphToken>> = vec![Vec::new(); words.len()];
        for token in &tokens {
            if let Some(word_idx) = words
                .iter()
                .position(|&(start, end)| token.start >= start && token.start < end)
            {
                word_tokens[word_idx].push(token);
            }
        }
        for assigned in &mut word_tokens {
            assigned.sort_by_key(|token| token.start);
        }

        let chars: Vec<char> = text.chars().collect();
        let mut breaks = HashMap::new();
        for word_idx in 0..words.len().saturating_sub(1) {
            let prev_tokens = &word_tokens[word_idx];
            let next_tokens = &word_tokens[word_idx + 1];
            let context = BreakContext {
                prev_last_tag: prev_tokens.last().map(|token| token.tag),
                prev_prev_last_tag: word_idx
                    .checked_sub(1)
                    .and_then(|idx| word_tokens[idx].last().map(|token| token.tag)),
                prev_word: chars[words[word_idx].0..words[word_idx].1].iter().collect(),
                next_first_tag: next_tokens.first().map(|token| token.tag),
                next_second_tag: next_tokens.get(1).map(|token| token.tag),
            };
            // every whitespace char in the run between the two words maps to
            // the same boundary
            for offset in words[word_idx].1..words[word_idx + 1].0 {
                breaks.insert(offset, context.clone());
            }
        }
        Self { breaks }
    }

    pub(crate) fn at(&self, whitespace_offset: usize) -> Option<&BreakContext> {
        self.breaks.get(&whitespace_offset)
    }
}

/// Char spans (start, end-exclusive) of the whitespace-delimited words in
/// `text`.
fn word_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    let mut idx = 0usize;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if let Some(word_start) = start.take() {
                spans.push((word_start, idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
        idx += 1;
    }
    if let Some(word_start) = start {
        spans.push((word_start, idx));
    }
    spans
}
