//! Display-size segmentation of subtitle text.
//!
//! One search algorithm runs at two resolutions: splitting a long dialogue
//! line into timeline segments, and wrapping the text inside one segment
//! into display lines. Break candidates are whitespace positions scored by
//! distance from an even-split target plus linguistic quality.

mod morph;
mod project;
mod scoring;

pub use morph::{MorphAnalyze, MorphTag, MorphTagger, MorphToken, SentenceMorphology};
pub use scoring::LinguisticScorer;

use tracing::debug;

use crate::text::fuzzy::FuzzyMatcher;
use crate::text::ScriptFamily;
use crate::types::{SegmenterConfig, WordSegment};

use scoring::{BreakWeights, LINE_WEIGHTS, SEGMENT_WEIGHTS};

/// Breaks stranding fewer than this many chars on either side are
/// penalized as orphans.
const ORPHAN_MARGIN: usize = 3;
/// Distance-weight multiplier for the forced "strict" retry pass.
const STRICT_DISTANCE_MULTIPLIER: f64 = 5.0;
/// Headroom subtracted from the last line when deriving the segment-level
/// soft cap from the per-line caps.
const SEGMENT_SOFT_HEADROOM: f64 = 0.5;

/// Resolution at which text is being split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitMode {
    /// Timeline-segment splitting: caps cover a whole multi-line subtitle.
    Segment,
    /// In-segment line wrapping: caps cover a single display line.
    Line,
}

/// A display-sized piece of a longer aligned segment.
#[derive(Debug, Clone)]
pub struct SubtitlePiece {
    pub text: String,
    pub start_time: f64,
    pub end_time: f64,
    pub words: Vec<WordSegment>,
}

impl SubtitlePiece {
    /// Merges two adjacent pieces back into one, joining text and word
    /// lists and taking the outer time bounds.
    pub fn merged_with(&self, next: &SubtitlePiece) -> SubtitlePiece {
        let mut words = self.words.clone();
        words.extend(next.words.iter().cloned());
        SubtitlePiece {
            text: format!("{} {}", self.text, next.text).trim().to_string(),
            start_time: self.start_time,
            end_time: next.end_time,
            words,
        }
    }
}

struct CapPair {
    soft: f64,
    hard: usize,
}

/// Splits subtitle text at linguistically sound boundaries and maps the
/// split positions back to audio timestamps.
pub struct SubtitleSegmenter {
    config: SegmenterConfig,
    scorer: LinguisticScorer,
    fuzzy: FuzzyMatcher,
}

impl SubtitleSegmenter {
    pub fn new(config: SegmenterConfig) -> Self {
        Self::with_capabilities(config, MorphTagger::default(), FuzzyMatcher::default())
    }

    pub fn with_capabilities(
        config: SegmenterConfig,
        tagger: MorphTagger,
        fuzzy: FuzzyMatcher,
    ) -> Self {
        let scorer = LinguisticScorer::new(tagger, config.split_on_conjunctions);
        Self {
            config,
            scorer,
            fuzzy,
        }
    }

    /// Caps for the requested resolution. Segment caps are headroom-
    /// adjusted multiples of the per-line caps so that a split segment can
    /// still be wrapped into `max_lines` lines.
    fn caps(&self, mode: SplitMode) -> CapPair {
        let soft_line = self.config.soft_chars_per_line;
        let hard_line = self.config.hard_chars_per_line;
        match mode {
            SplitMode::Line => CapPair {
                soft: soft_line as f64,
                hard: hard_line,
            },
            SplitMode::Segment => CapPair {
                soft: soft_line as f64 * (self.config.max_lines as f64 - SEGMENT_SOFT_HEADROOM),
                hard: soft_line * self.config.max_lines.saturating_sub(1) + hard_line,
            },
        }
    }

    fn weights(mode: SplitMode) -> &'static BreakWeights {
        match mode {
            SplitMode::Segment => &SEGMENT_WEIGHTS,
            SplitMode::Line => &LINE_WEIGHTS,
        }
    }

    /// Finds the char offsets at which `text` should be split so that every
    /// piece fits the mode's hard cap. Offsets index whitespace characters
    /// in `text`, except when a run with no whitespace forces truncation at
    /// exactly the hard cap. Returns an empty list when the text already
    /// fits.
    pub fn find_split_points(&self, text: &str, mode: SplitMode) -> Vec<usize> {
        let caps = self.caps(mode);
        let chars: Vec<char> = text.chars().collect();
        if chars.len() <= caps.hard {
            return Vec::new();
        }
        let weights = Self::weights(mode);
        let family = ScriptFamily::detect(text);
        let morph = self.scorer.prepare(text, family);

        let search = BreakSearch {
            scorer: &self.scorer,
            chars: &chars,
            family,
            morph: &morph,
            weights,
        };

        let mut offsets = Vec::new();
        // explicit (absolute offset, remaining length) carry instead of
        // recursion so arbitrarily long texts cannot exhaust the stack
        let mut absolute = 0usize;
        while chars.len() - absolute > caps.hard {
            let remaining = chars.len() - absolute;
            let break_pos = match search.best_break(absolute, remaining, &caps) {
                Some(pos) => pos,
                None => {
                    // no whitespace anywhere in the remainder
                    debug!(absolute, hard_cap = caps.hard, "forcing truncation inside token");
                    caps.hard
                }
            };
            offsets.push(absolute + break_pos);
            // advance past the break and any whitespace run after it
            let mut next = break_pos;
            while absolute + next < chars.len() && chars[absolute + next].is_whitespace() {
                next += 1;
            }
            absolute += next;
        }
        offsets
    }

    /// Maps split offsets back to audio timestamps (the `end` of the word
    /// preceding each offset).
    pub fn calculate_split_times(
        &self,
        text: &str,
        offsets: &[usize],
        words: &[WordSegment],
    ) -> Vec<f64> {
        project::split_times(&self.fuzzy, text, offsets, words)
    }

    /// Partitions a segment's word list to follow the text pieces produced
    /// by `offsets`.
    pub fn split_words_at(
        &self,
        text: &str,
        offsets: &[usize],
        words: &[WordSegment],
    ) -> Vec<Vec<WordSegment>> {
        project::partition_words(text, offsets, words)
    }

    /// Splits one timed subtitle into display-sized pieces with contiguous
    /// time ranges: each piece ends exactly where the next begins.
    pub fn split_segment(
        &self,
        text: &str,
        start_time: f64,
        end_time: f64,
        words: &[WordSegment],
    ) -> Vec<SubtitlePiece> {
        let offsets = self.find_split_points(text, SplitMode::Segment);
        if offsets.is_empty() {
            return vec![SubtitlePiece {
                text: text.trim().to_string(),
                start_time,
                end_time,
                words: words.to_vec(),
            }];
        }

        let times = self.calculate_split_times(text, &offsets, words);
        let word_groups = self.split_words_at(text, &offsets, words);
        let texts = cut_at_offsets(text, &offsets);

        let mut pieces = Vec::with_capacity(texts.len());
        let mut cursor = start_time;
        for (idx, piece_text) in texts.into_iter().enumerate() {
            let piece_end = match times.get(idx) {
                // keep boundaries inside the segment and monotonic
                Some(&time) => time.clamp(cursor, end_time),
                None => end_time,
            };
            pieces.push(SubtitlePiece {
                text: piece_text,
                start_time: cursor,
                end_time: piece_end,
                words: word_groups.get(idx).cloned().unwrap_or_default(),
            });
            cursor = piece_end;
        }
        pieces
    }

    /// Wraps text into display lines at line-mode break points. Text that
    /// already contains newlines is left untouched when every line fits the
    /// hard cap; otherwise it is flattened and re-wrapped.
    pub fn wrap_lines(&self, text: &str) -> String {
        if text.contains('\n') {
            let all_fit = text
                .lines()
                .all(|line| line.trim().chars().count() <= self.config.hard_chars_per_line);
            if all_fit {
                return text.to_string();
            }
            let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");
            return self.wrap_flat(&flattened);
        }
        self.wrap_flat(text)
    }

    fn wrap_flat(&self, text: &str) -> String {
        let offsets = self.find_split_points(text, SplitMode::Line);
        if offsets.is_empty() {
            return text.to_string();
        }
        cut_at_offsets(text, &offsets).join("\n")
    }
}

/// One segmentation call's search state: the full text, its script family,
/// and the prepared morphology cache.
struct BreakSearch<'a> {
    scorer: &'a LinguisticScorer,
    chars: &'a [char],
    family: ScriptFamily,
    morph: &'a SentenceMorphology,
    weights: &'a BreakWeights,
}

impl BreakSearch<'_> {
    /// Picks the best-scoring whitespace break for the remainder starting
    /// at `absolute`, retrying in strict mode (any position, heavy distance
    /// weighting) when the cap-bounded range holds no candidate.
    fn best_break(&self, absolute: usize, remaining: usize, caps: &CapPair) -> Option<usize> {
        let pieces = num_pieces(remaining, caps);
        let target = remaining as f64 / pieces as f64;
        // when exactly two pieces remain, the lower bound guarantees the
        // tail piece also fits the hard cap
        let min_pos = if pieces == 2 {
            remaining.saturating_sub(caps.hard)
        } else {
            0
        };

        let found = self.scan(absolute, remaining, target, min_pos, caps.hard, 1.0);
        if found.is_some() {
            return found;
        }
        debug!(absolute, "no break inside cap range; retrying in strict mode");
        self.scan(
            absolute,
            remaining,
            target,
            0,
            remaining,
            STRICT_DISTANCE_MULTIPLIER,
        )
    }

    fn scan(
        &self,
        absolute: usize,
        remaining: usize,
        target: f64,
        min_pos: usize,
        limit_pos: usize,
        distance_multiplier: f64,
    ) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for pos in min_pos..remaining.min(limit_pos + 1) {
            if !self.chars[absolute + pos].is_whitespace() {
                continue;
            }
            let deviation = (pos as f64 - target) / target;
            let mut score = -(deviation * deviation) * self.weights.distance * distance_multiplier;
            score += self.scorer.score(
                self.chars,
                absolute + pos,
                self.family,
                self.morph,
                self.weights,
            );
            if pos < ORPHAN_MARGIN || remaining - pos - 1 < ORPHAN_MARGIN {
                score += self.weights.orphan;
            }
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, pos));
            }
        }
        best.map(|(_, pos)| pos)
    }
}

/// Cuts `text` at the given char offsets, trimming each resulting piece.
fn cut_at_offsets(text: &str, offsets: &[usize]) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut pieces = Vec::with_capacity(offsets.len() + 1);
    let mut start = 0usize;
    for &offset in offsets {
        let piece: String = chars[start..offset.min(chars.len())].iter().collect();
        pieces.push(piece.trim().to_string());
        start = offset.min(chars.len());
    }
    let piece: String = chars[start..].iter().collect();
    pieces.push(piece.trim().to_string());
    pieces
}

/// How many pieces the remainder should become: enough that each fits the
/// hard cap, close to the soft-cap ideal, and never fewer than two.
/// Half-way soft-cap ratios round to even so `2.5` still means two pieces.
fn num_pieces(remaining: usize, caps: &CapPair) -> usize {
    let by_hard = remaining.div_ceil(caps.hard);
    let by_soft = (remaining as f64 / caps.soft).round_ties_even() as usize;
    by_hard.max(by_soft).max(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SegmenterConfig;

    fn segmenter(soft: usize, hard: usize) -> SubtitleSegmenter {
        SubtitleSegmenter::new(SegmenterConfig {
            soft_chars_per_line: soft,
            hard_chars_per_line: hard,
            max_lines: 2,
            split_on_conjunctions: true,
        })
    }

    #[test]
    fn short_text_needs_no_split() {
        let segmenter = segmenter(20, 25);
        assert!(segmenter
            .find_split_points("short line", SplitMode::Line)
            .is_empty());
    }

    #[test]
    fn num_pieces_rounds_half_to_even() {
        let caps = CapPair {
            soft: 20.0,
            hard: 25,
        };
        // 50/20 = 2.5 rounds down to 2, matching ceil(50/25)
        assert_eq!(num_pieces(50, &caps), 2);
        assert_eq!(num_pieces(70, &caps), 4); // round(3.5) = 4 > ceil(70/25) = 3
        assert_eq!(num_pieces(26, &caps), 2);
    }

    #[test]
    fn forced_truncation_on_unbreakable_text() {
        let segmenter = segmenter(20, 25);
        let text: String = "a".repeat(60);
        let offsets = segmenter.find_split_points(&text, SplitMode::Line);
        assert_eq!(offsets, vec![25, 50]);
    }

    #[test]
    fn segment_caps_derive_from_line_caps() {
        let segmenter = segmenter(20, 25);
        let caps = segmenter.caps(SplitMode::Segment);
        assert_eq!(caps.hard, 45);
        assert!((caps.soft - 30.0).abs() < 1e-9);
    }

    #[test]
    fn cut_at_offsets_trims_pieces() {
        let pieces = cut_at_offsets("one two three", &[3, 7]);
        assert_eq!(pieces, vec!["one", "two", "three"]);
    }

    #[test]
    fn merged_pieces_join_text_and_times() {
        let first = SubtitlePiece {
            text: "hello".into(),
            start_time: 0.0,
            end_time: 1.0,
            words: vec![WordSegment::new("hello", 0.0, 1.0)],
        };
        let second = SubtitlePiece {
            text: "world".into(),
            start_time: 1.0,
            end_time: 2.0,
            words: vec![WordSegment::new("world", 1.0, 2.0)],
        };
        let merged = first.merged_with(&second);
        assert_eq!(merged.text, "hello world");
        assert_eq!(merged.start_time, 0.0);
        assert_eq!(merged.end_time, 2.0);
        assert_eq!(merged.words.len(), 2);
    }
}
