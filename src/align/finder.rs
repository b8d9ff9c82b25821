//! Sliding-window fuzzy search locating one dialogue line inside a
//! speaker's transcript.

use tracing::debug;

use crate::text::fuzzy::FuzzyMatcher;
use crate::text::numbers::NumberSpeller;
use crate::text::{self, ScriptFamily};
use crate::types::{AlignedSegment, AlignerConfig, DialogueLine, WordSegment};

use super::remap;

/// Window sizes range from 70% to 130% of the dialogue word count (plus
/// slack) to absorb spacing differences between script and transcript.
const WINDOW_SHRINK_FACTOR: f64 = 0.7;
const WINDOW_GROW_FACTOR: f64 = 1.3;
const WINDOW_EXTRA: usize = 2;
/// Bonus applied when the window's final word matches the dialogue's.
const LAST_WORD_BONUS: f64 = 2.0;
/// Minimum last-word similarity for the bonus to apply.
const LAST_WORD_MIN_RATIO: f64 = 85.0;
/// Length of the normalized suffix compared for tail similarity.
const TAIL_CHARS: usize = 15;
/// Overall scores within this distance count as tied.
const SCORE_MARGIN: f64 = 1.0;
/// Tail scores within this distance count as tied.
const TAIL_MARGIN: f64 = 2.0;

/// Finds, for one dialogue line, the window of transcribed words that best
/// matches it.
pub struct SegmentFinder {
    config: AlignerConfig,
    fuzzy: FuzzyMatcher,
    speller: NumberSpeller,
}

/// Best window seen so far, tracked explicitly so the tie-break rules stay
/// in one place.
#[derive(Debug, Clone, Copy)]
struct BestWindow {
    score: f64,
    tail_score: f64,
    last_word_match: bool,
    start_idx: usize,
    end_idx: usize,
    matched: bool,
}

impl BestWindow {
    fn empty(cursor: usize) -> Self {
        Self {
            score: 0.0,
            tail_score: 0.0,
            last_word_match: false,
            start_idx: cursor,
            end_idx: cursor,
            matched: false,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    tail_score: f64,
    last_word_match: bool,
    start_idx: usize,
    end_idx: usize,
}

/// Tie-break comparison. A candidate wins outright on a clearly higher
/// score; near-ties fall through to tail similarity (which guards against
/// windows that overrun into the next sentence), then to the last-word
/// bonus, then to the raw score.
fn outranks(candidate: &Candidate, best: &BestWindow) -> bool {
    if candidate.score > best.score + SCORE_MARGIN {
        return true;
    }
    if candidate.score > best.score - SCORE_MARGIN {
        if candidate.tail_score > best.tail_score + TAIL_MARGIN {
            return true;
        }
        if candidate.tail_score > best.tail_score - TAIL_MARGIN {
            if candidate.last_word_match && !best.last_word_match {
                return true;
            }
            return candidate.score > best.score;
        }
    }
    false
}

impl SegmentFinder {
    pub fn new(config: AlignerConfig) -> Self {
        Self::with_capabilities(config, FuzzyMatcher::default(), NumberSpeller::default())
    }

    pub fn with_capabilities(
        config: AlignerConfig,
        fuzzy: FuzzyMatcher,
        speller: NumberSpeller,
    ) -> Self {
        Self {
            config,
            fuzzy,
            speller,
        }
    }

    /// Normalizes text for window comparison. Digit runs are spelled out
    /// for Latin-script text; Hangul numeral readings depend on the
    /// counter word, so they are left as written.
    fn normalize(&self, raw: &str) -> String {
        match ScriptFamily::detect(raw) {
            ScriptFamily::Latin => text::normalize_text(&self.speller.spell_digits(raw)),
            ScriptFamily::Hangul => text::normalize_text(raw),
        }
    }

    /// Locates the transcript window matching `dialogue`, searching forward
    /// from `cursor`. Returns the aligned segment when the best window
    /// clears the similarity threshold, along with the next cursor
    /// position; on no match the cursor is returned unchanged so the caller
    /// never skips words it has not matched.
    pub fn find_segment(
        &self,
        dialogue: &DialogueLine,
        words: &[WordSegment],
        cursor: usize,
    ) -> (Option<AlignedSegment>, usize) {
        if words.is_empty() || cursor >= words.len() {
            return (None, cursor);
        }

        let target = self.normalize(&dialogue.text);
        let target_words: Vec<&str> = target.split_whitespace().collect();
        let target_last = target_words.last().copied().unwrap_or("");
        let target_chars: Vec<char> = target.chars().collect();
        let target_tail = tail(&target_chars);

        let word_count = target_words.len();
        let min_window = ((word_count as f64 * WINDOW_SHRINK_FACTOR) as usize).max(1);
        let max_window = (words.len() - cursor)
            .min((word_count as f64 * WINDOW_GROW_FACTOR) as usize + WINDOW_EXTRA);

        let mut best = BestWindow::empty(cursor);
        for window_size in min_window..=max_window {
            for start_idx in cursor..=(words.len() - window_size) {
                let end_idx = start_idx + window_size;
                let candidate = self.score_window(
                    &target,
                    target_last,
                    &target_tail,
                    &words[start_idx..end_idx],
                    start_idx,
                    end_idx,
                );
                if outranks(&candidate, &best) {
                    best = BestWindow {
                        score: candidate.score,
                        tail_score: candidate.tail_score,
                        last_word_match: candidate.last_word_match,
                        start_idx: candidate.start_idx,
                        end_idx: candidate.end_idx,
                        matched: true,
                    };
                }
            }
        }

        if best.matched && best.score >= self.config.similarity_threshold {
            let window = &words[best.start_idx..best.end_idx];
            let aligned_words = remap::rebuild_word_timings(&dialogue.text, window);
            debug!(
                line = dialogue.index,
                speaker = %dialogue.speaker,
                score = best.score,
                start_idx = best.start_idx,
                end_idx = best.end_idx,
                "matched dialogue window"
            );
            let segment = AlignedSegment {
                dialogue: dialogue.clone(),
                start_time: window[0].start,
                end_time: window[window.len() - 1].end,
                confidence: best.score.min(100.0),
                words: aligned_words,
            };
            return (Some(segment), best.end_idx);
        }

        debug!(
            line = dialogue.index,
            best_score = best.score,
            "no window cleared the similarity threshold"
        );
        (None, cursor)
    }

    fn score_window(
        &self,
        target: &str,
        target_last: &str,
        target_tail: &str,
        window: &[WordSegment],
        start_idx: usize,
        end_idx: usize,
    ) -> Candidate {
        let window_text = window
            .iter()
            .map(|word| word.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let normalized = self.normalize(&window_text);

        let mut score = self.fuzzy.ratio(target, &normalized);

        let window_last = normalized.split_whitespace().last().unwrap_or("");
        let last_word_match = !target_last.is_empty()
            && !window_last.is_empty()
            && self.fuzzy.ratio(target_last, window_last) >= LAST_WORD_MIN_RATIO;
        if last_word_match {
            score += LAST_WORD_BONUS;
        }

        let window_chars: Vec<char> = normalized.chars().collect();
        let tail_score = self.fuzzy.ratio(target_tail, &tail(&window_chars));

        Candidate {
            score,
            tail_score,
            last_word_match,
            start_idx,
            end_idx,
        }
    }
}

fn tail(chars: &[char]) -> String {
    chars[chars.len().saturating_sub(TAIL_CHARS)..]
        .iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn best(score: f64, tail_score: f64, last_word_match: bool) -> BestWindow {
        BestWindow {
            score,
            tail_score,
            last_word_match,
            start_idx: 0,
            end_idx: 0,
            matched: true,
        }
    }

    fn candidate(score: f64, tail_score: f64, last_word_match: bool) -> Candidate {
        Candidate {
            score,
            tail_score,
            last_word_match,
            start_idx: 0,
            end_idx: 0,
        }
    }

    #[test]
    fn clearly_higher_score_wins() {
        assert!(outranks(&candidate(80.0, 0.0, false), &best(70.0, 90.0, true)));
        assert!(!outranks(&candidate(70.0, 0.0, false), &best(80.0, 0.0, false)));
    }

    #[test]
    fn near_tie_falls_through_to_tail_similarity() {
        assert!(outranks(&candidate(80.2, 95.0, false), &best(80.0, 60.0, true)));
        assert!(!outranks(&candidate(80.2, 60.0, false), &best(80.0, 95.0, false)));
    }

    #[test]
    fn tail_tie_prefers_last_word_bonus_then_raw_score() {
        assert!(outranks(&candidate(79.8, 80.0, true), &best(80.0, 80.0, false)));
        assert!(outranks(&candidate(80.3, 80.0, false), &best(80.0, 80.0, false)));
        assert!(!outranks(&candidate(79.8, 80.0, false), &best(80.0, 80.0, false)));
    }

    #[test]
    fn tail_window_takes_last_chars() {
        let chars: Vec<char> = "abcdefghijklmnopqrst".chars().collect();
        assert_eq!(tail(&chars), "fghijklmnopqrst");
        let short: Vec<char> = "abc".chars().collect();
        assert_eq!(tail(&short), "abc");
    }
}
