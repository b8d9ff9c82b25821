//! Projects text split offsets back onto transcript word timestamps.
//!
//! Subtitle text may have been hand-edited since alignment (spacing or
//! punctuation changes, even reworded tokens), so the mapping from a char
//! offset to a timed word goes through fuzzy token matching anchored on a
//! proportional index estimate rather than exact position arithmetic.

use tracing::debug;

use crate::text::fuzzy::FuzzyMatcher;
use crate::text::{token_spans, TokenSpan};
use crate::types::WordSegment;

/// Search half-width around the proportionally estimated word index.
const SEARCH_WINDOW: usize = 15;
/// Window matches scoring below this trigger a full scan of the word list.
const WEAK_MATCH_CUTOFF: f64 = 55.0;

/// Maps each split offset to an audio timestamp: the `end` time of the
/// word matched to the token immediately preceding the offset.
pub(crate) fn split_times(
    fuzzy: &FuzzyMatcher,
    text: &str,
    offsets: &[usize],
    words: &[WordSegment],
) -> Vec<f64> {
    let tokens = token_spans(text);
    let total_chars = text.chars().count();
    offsets
        .iter()
        .map(|&offset| split_time_at(fuzzy, &tokens, total_chars, offset, words))
        .collect()
}

fn split_time_at(
    fuzzy: &FuzzyMatcher,
    tokens: &[TokenSpan],
    total_chars: usize,
    offset: usize,
    words: &[WordSegment],
) -> f64 {
    if words.is_empty() {
        return 0.0;
    }

    // token boundary at or before the split offset
    let token_before = tokens
        .iter()
        .enumerate()
        .take_while(|(_, token)| token.end <= offset)
        .last();
    let Some((token_idx, token)) = token_before else {
        // nothing but whitespace before the offset: interpolate by
        // character position
        return interpolate(words, offset, total_chars);
    };

    let guess = proportional_guess(token_idx, tokens.len(), words.len());
    let key = normalize_key(&token.text);
    if key.is_empty() {
        // punctuation-only token: trust the proportional estimate
        return words[guess].end;
    }

    let lo = guess.saturating_sub(SEARCH_WINDOW);
    let hi = (guess + SEARCH_WINDOW).min(words.len() - 1);
    let (best_idx, best_score) = scan_words(fuzzy, &key, words, lo..=hi, guess, (guess, -1.0));
    if best_score < WEAK_MATCH_CUTOFF {
        debug!(
            token = %token.text,
            best_score,
            "weak local match; scanning the full word list"
        );
        let (best_idx, _) = scan_words(
            fuzzy,
            &key,
            words,
            0..=words.len() - 1,
            guess,
            (best_idx, best_score),
        );
        return words[best_idx].end;
    }
    words[best_idx].end
}

fn scan_words(
    fuzzy: &FuzzyMatcher,
    key: &str,
    words: &[WordSegment],
    range: std::ops::RangeInclusive<usize>,
    guess: usize,
    seed: (usize, f64),
) -> (usize, f64) {
    let (mut best_idx, mut best_score) = seed;
    for idx in range {
        let word_key = normalize_key(&words[idx].text);
        let score = if word_key.is_empty() {
            0.0
        } else {
            fuzzy.ratio(key, &word_key)
        };
        let closer = distance(idx, guess) < distance(best_idx, guess);
        if score > best_score || (score == best_score && closer) {
            best_idx = idx;
            best_score = score;
        }
    }
    (best_idx, best_score)
}

fn distance(a: usize, b: usize) -> usize {
    a.abs_diff(b)
}

/// Keeps only alphanumeric chars, lowercased, for fuzzy token comparison.
fn normalize_key(token: &str) -> String {
    token
        .chars()
        .filter(|ch| ch.is_alphanumeric())
        .flat_map(|ch| ch.to_lowercase())
        .collect()
}

fn proportional_guess(token_idx: usize, token_count: usize, word_count: usize) -> usize {
    let denominator = token_count.saturating_sub(1).max(1);
    let guess =
        (token_idx as f64 * (word_count - 1) as f64 / denominator as f64).round() as usize;
    guess.min(word_count - 1)
}

fn interpolate(words: &[WordSegment], offset: usize, total_chars: usize) -> f64 {
    let first = words[0].start;
    let last = words[words.len() - 1].end;
    let ratio = if total_chars > 0 {
        offset as f64 / total_chars as f64
    } else {
        0.5
    };
    first + (last - first) * ratio
}

/// Partitions `words` into one group per text piece produced by splitting
/// at `offsets`, mirroring how the pieces themselves are cut.
pub(crate) fn partition_words(
    text: &str,
    offsets: &[usize],
    words: &[WordSegment],
) -> Vec<Vec<WordSegment>> {
    if words.is_empty() {
        return vec![Vec::new(); offsets.len() + 1];
    }
    let chars: Vec<char> = text.chars().collect();
    let mut groups = Vec::with_capacity(offsets.len() + 1);
    let mut previous = 0usize;
    for &offset in offsets {
        // +1: the word spanning the split position stays with the piece
        // before the break
        let boundary = (word_index_at(&chars, words, offset) + 1).clamp(previous, words.len());
        groups.push(words[previous..boundary].to_vec());
        previous = boundary;
    }
    groups.push(words[previous..].to_vec());
    groups
}

/// Index of the word covering char position `char_pos`, found by scanning
/// each word's text forward through `chars`.
fn word_index_at(chars: &[char], words: &[WordSegment], char_pos: usize) -> usize {
    let mut search_from = 0usize;
    for (idx, word) in words.iter().enumerate() {
        let needle: Vec<char> = word.text.trim().chars().collect();
        if needle.is_empty() {
            continue;
        }
        if let Some(found) = find_chars(chars, &needle, search_from) {
            let word_end = found + needle.len();
            if word_end >= char_pos {
                return idx;
            }
            search_from = word_end;
        }
    }
    words.len() - 1
}

fn find_chars(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    if from >= haystack.len() || needle.len() > haystack.len() {
        return None;
    }
    (from..=haystack.len() - needle.len()).find(|&idx| haystack[idx..idx + needle.len()] == *needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn timed_words(texts: &[&str]) -> Vec<WordSegment> {
        texts
            .iter()
            .enumerate()
            .map(|(idx, text)| WordSegment::new(*text, idx as f64 * 0.5, (idx + 1) as f64 * 0.5))
            .collect()
    }

    #[test]
    fn split_time_uses_end_of_preceding_word() {
        let words = timed_words(&["the", "quick", "brown", "fox"]);
        let text = "the quick brown fox";
        // offset 9 is the whitespace after "quick"
        let times = split_times(&FuzzyMatcher::Builtin, text, &[9], &words);
        assert_relative_eq!(times[0], words[1].end);
    }

    #[test]
    fn edited_text_still_projects_onto_words() {
        let words = timed_words(&["the", "quick", "brown", "fox"]);
        // user tightened the wording; "quik" still matches "quick"
        let text = "the quik brown fox";
        let times = split_times(&FuzzyMatcher::Builtin, text, &[8], &words);
        assert_relative_eq!(times[0], words[1].end);
    }

    #[test]
    fn leading_whitespace_offset_interpolates() {
        let words = timed_words(&["alpha", "beta"]);
        let text = "  alpha beta";
        let times = split_times(&FuzzyMatcher::Builtin, text, &[1], &words);
        let expected = words[0].start + (words[1].end - words[0].start) * (1.0 / 12.0);
        assert_relative_eq!(times[0], expected, epsilon = 1e-9);
    }

    #[test]
    fn empty_word_list_yields_zero_times() {
        let times = split_times(&FuzzyMatcher::Builtin, "some text", &[4], &[]);
        assert_relative_eq!(times[0], 0.0);
    }

    #[test]
    fn partition_keeps_split_word_with_leading_piece() {
        let words = timed_words(&["the", "quick", "brown", "fox"]);
        let text = "the quick brown fox";
        let groups = partition_words(text, &[9], &words);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][1].text, "quick");
        assert_eq!(groups[1][0].text, "brown");
    }

    #[test]
    fn partition_with_no_offsets_returns_everything() {
        let words = timed_words(&["one", "two"]);
        let groups = partition_words("one two", &[], &words);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }
}
