//! Heuristic scoring of candidate break positions.
//!
//! A break is judged by what sits on each side of the whitespace: sentence
//! punctuation outranks clause punctuation, which outranks the
//! script-specific checks (morphological boundaries for Hangul, closed
//! word lists for Latin).

use std::collections::HashSet;

use once_cell::sync::Lazy;

use crate::text::ScriptFamily;

use super::morph::{MorphTag, MorphTagger, SentenceMorphology};

/// Break-scoring weight table. Segment mode and line mode carry distinct
/// magnitudes; the line budget is tighter, so line-mode values are smaller.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BreakWeights {
    /// Break right after sentence-ending punctuation.
    pub sentence_end: f64,
    /// Break right after clause punctuation; also the strength of a
    /// morphological clause boundary (connective or sentence-final ending).
    pub clause_end: f64,
    /// Particles, nominalizers, and the Latin conjunction/preposition
    /// lists.
    pub medium: f64,
    /// The word "of" binds its neighbors more tightly than other
    /// prepositions.
    pub of_word: f64,
    /// Break stranding fewer than the orphan margin of chars on a side.
    pub orphan: f64,
    /// Multiplier on the squared relative distance from the target
    /// position.
    pub distance: f64,
    /// Base magnitude for tight-binding inhibitors (pre-nominal modifiers,
    /// auxiliary verbs, determiners).
    pub tight_binding: f64,
}

pub(crate) const SEGMENT_WEIGHTS: BreakWeights = BreakWeights {
    sentence_end: 50.0,
    clause_end: 30.0,
    medium: 20.0,
    of_word: 5.0,
    orphan: -100.0,
    distance: 40.0,
    tight_binding: 12.0,
};

pub(crate) const LINE_WEIGHTS: BreakWeights = BreakWeights {
    sentence_end: 30.0,
    clause_end: 18.0,
    medium: 12.0,
    of_word: 3.0,
    orphan: -60.0,
    distance: 25.0,
    tight_binding: 8.0,
};

static CONJUNCTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "and", "but", "or", "so", "because", "if", "when", "while", "since", "that", "which",
        "who",
    ]
    .into_iter()
    .collect()
});

static PREPOSITIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["to", "in", "on", "at", "by", "for", "with", "from", "about"]
        .into_iter()
        .collect()
});

/// Nouns marking temporal sequence ("after", "then", "moment"); a clause
/// ending on one of these is a natural place to break.
static TEMPORAL_NOUNS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ["후", "뒤", "다음", "순간", "때"].into_iter().collect());

fn is_sentence_delimiter(ch: char) -> bool {
    matches!(ch, '.' | '?' | '!' | '。' | '？' | '！')
}

fn is_clause_delimiter(ch: char) -> bool {
    matches!(ch, ',' | ';' | ':' | '，' | '；' | '：')
}

/// Scores one whitespace position for linguistic break quality.
pub struct LinguisticScorer {
    tagger: MorphTagger,
    split_on_conjunctions: bool,
}

impl LinguisticScorer {
    pub fn new(tagger: MorphTagger, split_on_conjunctions: bool) -> Self {
        Self {
            tagger,
            split_on_conjunctions,
        }
    }

    /// Runs the whole-sentence morphological pass for `text`. Cheap empty
    /// result when the branch is disabled, the tagger is absent, or the
    /// text is not Hangul.
    pub(crate) fn prepare(&self, text: &str, family: ScriptFamily) -> SentenceMorphology {
        if !self.split_on_conjunctions || family != ScriptFamily::Hangul {
            return SentenceMorphology::default();
        }
        SentenceMorphology::analyze(&self.tagger, text)
    }

    /// Linguistic bonus for breaking at the whitespace char at
    /// `whitespace_offset` in `chars` (offsets index the full original
    /// text, matching the cache built by [`prepare`](Self::prepare)).
    pub(crate) fn score(
        &self,
        chars: &[char],
        whitespace_offset: usize,
        family: ScriptFamily,
        morph: &SentenceMorphology,
        weights: &BreakWeights,
    ) -> f64 {
        if whitespace_offset > 0 {
            let prev = chars[whitespace_offset - 1];
            if is_sentence_delimiter(prev) {
                return weights.sentence_end;
            }
            if is_clause_delimiter(prev) {
                return weights.clause_end;
            }
        }
        if !self.split_on_conjunctions {
            return 0.0;
        }
        match family {
            ScriptFamily::Hangul => score_hangul(whitespace_offset, morph, weights),
            ScriptFamily::Latin => score_latin(chars, whitespace_offset, weights),
        }
    }
}

fn score_hangul(
    whitespace_offset: usize,
    morph: &SentenceMorphology,
    weights: &BreakWeights,
) -> f64 {
    let Some(context) = morph.at(whitespace_offset) else {
        return 0.0;
    };

    let mut bonus = 0.0;
    let temporal = TEMPORAL_NOUNS
        .iter()
        .any(|noun| context.prev_word.ends_with(noun));
    if temporal {
        bonus += weights.clause_end;
    } else {
        match context.prev_last_tag {
            Some(MorphTag::ConnectiveEnding) | Some(MorphTag::SentenceFinalEnding) => {
                bonus += weights.clause_end;
            }
            Some(MorphTag::NominalizingEnding)
            | Some(MorphTag::CaseParticle)
            | Some(MorphTag::TopicParticle)
            | Some(MorphTag::ConjunctiveParticle) => {
                bonus += weights.medium;
            }
            Some(MorphTag::DependentNoun) => {
                // 것/수/데 bind to the clause before them unless a case
                // particle already closed that clause
                if context.prev_prev_last_tag == Some(MorphTag::CaseParticle) {
                    bonus += weights.medium;
                } else {
                    bonus -= weights.medium;
                }
            }
            _ => {}
        }
    }

    // tight-binding inhibitors
    if context.prev_last_tag == Some(MorphTag::PrenominalEnding) {
        bonus -= 2.0 * weights.tight_binding;
    }
    if context.next_first_tag == Some(MorphTag::AuxiliaryVerb) {
        bonus -= 2.0 * weights.tight_binding;
    }
    if context.next_first_tag == Some(MorphTag::Determiner) {
        bonus -= weights.tight_binding;
    }
    if matches!(
        (context.next_first_tag, context.next_second_tag),
        (Some(MorphTag::DependentNoun), Some(MorphTag::Numeral))
            | (Some(MorphTag::Numeral), Some(MorphTag::DependentNoun))
    ) {
        bonus -= weights.tight_binding;
    }
    bonus
}

fn score_latin(chars: &[char], whitespace_offset: usize, weights: &BreakWeights) -> f64 {
    let next_word: String = chars[whitespace_offset..]
        .iter()
        .skip_while(|ch| ch.is_whitespace())
        .take_while(|ch| !ch.is_whitespace())
        .flat_map(|ch| ch.to_lowercase())
        .collect();
    if next_word == "of" {
        return weights.of_word;
    }
    if CONJUNCTIONS.contains(next_word.as_str()) || PREPOSITIONS.contains(next_word.as_str()) {
        return weights.medium;
    }
    0.0
}
