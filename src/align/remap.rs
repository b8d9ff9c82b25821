//! Rebuilds word-level timestamps for the authored text of a matched
//! transcript window.
//!
//! The transcript's wording rarely matches the script exactly, so the
//! window's timed words cannot be used as-is. A sequence alignment between
//! the normalized token lists decides, for every dialogue token, whether it
//! can copy a transcript timestamp directly or needs one synthesized from
//! the surrounding anchors.

use crate::text;
use crate::types::WordSegment;

/// Minimum duration assigned to a word whose timestamp is interpolated.
const MIN_INTERPOLATED_DURATION: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpKind {
    /// Token pair matched 1:1.
    Equal,
    /// Both sides present with different wording.
    Replace,
    /// Dialogue tokens with no transcript counterpart.
    Delete,
    /// Transcript tokens with no dialogue counterpart.
    Insert,
}

#[derive(Debug, Clone, Copy)]
struct Op {
    kind: OpKind,
    script: (usize, usize),
    window: (usize, usize),
}

/// Re-derives per-word timestamps so the output carries exactly one entry
/// per dialogue token, in original token order, with monotonic times.
pub fn rebuild_word_timings(script_text: &str, window: &[WordSegment]) -> Vec<WordSegment> {
    if window.is_empty() {
        return Vec::new();
    }

    // pair raw tokens with their normalizations; tokens that normalize away
    // (pure punctuation) carry no timing signal
    let mut script_raw: Vec<&str> = Vec::new();
    let mut script_norm: Vec<String> = Vec::new();
    for raw in script_text.split_whitespace() {
        let norm = text::normalize_text(raw);
        if !norm.is_empty() {
            script_raw.push(raw);
            script_norm.push(norm);
        }
    }
    if script_raw.is_empty() {
        return window.to_vec();
    }
    let window_norm: Vec<String> = window
        .iter()
        .map(|word| text::normalize_text(&word.text))
        .collect();

    let mut result: Vec<WordSegment> = Vec::with_capacity(script_raw.len());
    for op in diff_opcodes(&script_norm, &window_norm) {
        let (s0, s1) = op.script;
        let (w0, w1) = op.window;
        match op.kind {
            OpKind::Equal => {
                for (si, wi) in (s0..s1).zip(w0..w1) {
                    result.push(WordSegment::new(
                        script_raw[si],
                        window[wi].start,
                        window[wi].end,
                    ));
                }
            }
            OpKind::Replace => {
                if s1 - s0 == w1 - w0 {
                    for (si, wi) in (s0..s1).zip(w0..w1) {
                        result.push(WordSegment::new(
                            script_raw[si],
                            window[wi].start,
                            window[wi].end,
                        ));
                    }
                } else {
                    distribute_by_chars(
                        &script_raw[s0..s1],
                        window[w0].start,
                        window[w1 - 1].end,
                        &mut result,
                    );
                }
            }
            OpKind::Delete => {
                let anchor_start = result
                    .last()
                    .map(|word| word.end)
                    .unwrap_or_else(|| window[0].start);
                let anchor_end = if w0 < window.len() {
                    window[w0].start
                } else {
                    window[window.len() - 1].end
                };
                interpolate_gap(&script_raw[s0..s1], anchor_start, anchor_end, &mut result);
            }
            OpKind::Insert => {} // transcript-only words produce no output
        }
    }
    result
}

/// Distributes the `[start, end]` span across `tokens` proportionally to
/// character length.
fn distribute_by_chars(tokens: &[&str], start: f64, end: f64, out: &mut Vec<WordSegment>) {
    let total_duration = end - start;
    let total_chars: usize = tokens.iter().map(|token| token.chars().count()).sum();
    let mut current = start;
    for token in tokens {
        let ratio = if total_chars > 0 {
            token.chars().count() as f64 / total_chars as f64
        } else {
            1.0 / tokens.len() as f64
        };
        let duration = total_duration * ratio;
        out.push(WordSegment::new(*token, current, current + duration));
        current += duration;
    }
}

/// Synthesizes timestamps for dialogue tokens the transcript skipped,
/// spreading them across the gap between the surrounding anchors with a
/// floor duration per word.
fn interpolate_gap(tokens: &[&str], anchor_start: f64, anchor_end: f64, out: &mut Vec<WordSegment>) {
    let span = (anchor_end - anchor_start).max(0.0);
    let total_chars: usize = tokens.iter().map(|token| token.chars().count()).sum();
    let mut current = anchor_start;
    for token in tokens {
        let share = if total_chars > 0 {
            span * token.chars().count() as f64 / total_chars as f64
        } else {
            span / tokens.len() as f64
        };
        let duration = share.max(MIN_INTERPOLATED_DURATION);
        out.push(WordSegment::new(*token, current, current + duration));
        current += duration;
    }
}

/// LCS diff over two normalized token lists, reported as opcode spans.
fn diff_opcodes(a: &[String], b: &[String]) -> Vec<Op> {
    let pairs = lcs_pairs(a, b);

    let mut ops = Vec::new();
    let mut si = 0usize;
    let mut wi = 0usize;
    let mut idx = 0usize;
    while idx < pairs.len() {
        // maximal run of consecutive 1:1 matches
        let run_start = idx;
        while idx + 1 < pairs.len()
            && pairs[idx + 1].0 == pairs[idx].0 + 1
            && pairs[idx + 1].1 == pairs[idx].1 + 1
        {
            idx += 1;
        }
        let (match_s, match_w) = pairs[run_start];
        push_gap(&mut ops, si, match_s, wi, match_w);
        let run_len = idx - run_start + 1;
        ops.push(Op {
            kind: OpKind::Equal,
            script: (match_s, match_s + run_len),
            window: (match_w, match_w + run_len),
        });
        si = match_s + run_len;
        wi = match_w + run_len;
        idx += 1;
    }
    push_gap(&mut ops, si, a.len(), wi, b.len());
    ops
}

fn push_gap(ops: &mut Vec<Op>, s0: usize, s1: usize, w0: usize, w1: usize) {
    let kind = match (s0 < s1, w0 < w1) {
        (true, true) => OpKind::Replace,
        (true, false) => OpKind::Delete,
        (false, true) => OpKind::Insert,
        (false, false) => return,
    };
    ops.push(Op {
        kind,
        script: (s0, s1),
        window: (w0, w1),
    });
}

fn lcs_pairs(a: &[String], b: &[String]) -> Vec<(usize, usize)> {
    let n = a.len();
    let m = b.len();
    let mut table = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    let mut pairs = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if a[i] == b[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn window(entries: &[(&str, f64, f64)]) -> Vec<WordSegment> {
        entries
            .iter()
            .map(|(text, start, end)| WordSegment::new(*text, *start, *end))
            .collect()
    }

    #[test]
    fn exact_match_copies_timestamps() {
        let words = window(&[("the", 0.0, 0.5), ("quick", 0.5, 1.0), ("fox", 1.0, 1.5)]);
        let rebuilt = rebuild_word_timings("The quick fox", &words);
        assert_eq!(rebuilt.len(), 3);
        assert_eq!(rebuilt[0].text, "The");
        assert_relative_eq!(rebuilt[0].start, 0.0);
        assert_relative_eq!(rebuilt[2].end, 1.5);
    }

    #[test]
    fn transcript_only_words_are_dropped() {
        let words = window(&[
            ("i", 0.0, 0.3),
            ("will", 0.3, 0.6),
            ("go", 0.6, 0.9),
            ("there", 0.9, 1.2),
            ("okay", 1.2, 1.5),
        ]);
        let rebuilt = rebuild_word_timings("I will go there", &words);
        assert_eq!(rebuilt.len(), 4);
        assert!(rebuilt.iter().all(|word| word.text != "okay"));
        assert_relative_eq!(rebuilt[3].end, 1.2);
    }

    #[test]
    fn skipped_script_words_are_interpolated_into_the_gap() {
        // transcript dropped "very very"; both words must be synthesized
        // between the anchors with at least the floor duration
        let words = window(&[("a", 0.0, 0.2), ("story", 1.0, 1.4)]);
        let rebuilt = rebuild_word_timings("a very very story", &words);
        assert_eq!(rebuilt.len(), 4);
        assert_eq!(rebuilt[1].text, "very");
        assert_eq!(rebuilt[2].text, "very");
        assert_relative_eq!(rebuilt[1].start, 0.2);
        assert!(rebuilt[1].duration() >= MIN_INTERPOLATED_DURATION);
        assert!(rebuilt[2].end <= 1.0 + 1e-9);
        assert_relative_eq!(rebuilt[3].start, 1.0);
    }

    #[test]
    fn reworded_span_distributes_by_character_length() {
        // "gonna" transcribed where the script says "going to"
        let words = window(&[("i", 0.0, 0.2), ("gonna", 0.2, 1.0), ("leave", 1.0, 1.4)]);
        let rebuilt = rebuild_word_timings("I going to leave", &words);
        assert_eq!(rebuilt.len(), 4);
        assert_relative_eq!(rebuilt[1].start, 0.2);
        assert_relative_eq!(rebuilt[2].end, 1.0);
        // "going" (5 chars) gets a larger share than "to" (2 chars)
        assert!(rebuilt[1].duration() > rebuilt[2].duration());
        // monotonic output
        for pair in rebuilt.windows(2) {
            assert!(pair[0].end <= pair[1].start + 1e-9);
        }
    }

    #[test]
    fn punctuation_only_script_returns_window_unchanged() {
        let words = window(&[("um", 0.0, 0.4)]);
        let rebuilt = rebuild_word_timings("...", &words);
        assert_eq!(rebuilt, words);
    }

    #[test]
    fn empty_window_yields_no_words() {
        assert!(rebuild_word_timings("hello", &[]).is_empty());
    }
}
