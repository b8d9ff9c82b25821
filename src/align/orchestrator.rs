//! Drives per-speaker alignment and merges the results back into script
//! order.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

use crate::text::fuzzy::FuzzyMatcher;
use crate::text::numbers::NumberSpeller;
use crate::types::{AlignedSegment, AlignerConfig, DialogueLine, WordSegment};

use super::finder::SegmentFinder;

/// Aligns every line of a speaker-tagged script against the per-speaker
/// transcripts.
pub struct ScriptAligner {
    finder: SegmentFinder,
}

impl ScriptAligner {
    pub fn new(config: AlignerConfig) -> Self {
        Self {
            finder: SegmentFinder::new(config),
        }
    }

    pub fn with_capabilities(
        config: AlignerConfig,
        fuzzy: FuzzyMatcher,
        speller: NumberSpeller,
    ) -> Self {
        Self {
            finder: SegmentFinder::with_capabilities(config, fuzzy, speller),
        }
    }

    /// Aligns one speaker's dialogue lines against that speaker's
    /// transcript. The search cursor only ever moves forward, so two lines
    /// can never claim overlapping spans of transcript words; lines with no
    /// acceptable window leave the cursor where it was.
    pub fn align_speaker(
        &self,
        dialogues: &[DialogueLine],
        words: &[WordSegment],
    ) -> Vec<AlignedSegment> {
        let mut segments = Vec::new();
        let mut cursor = 0usize;
        for dialogue in dialogues {
            let (segment, next_cursor) = self.finder.find_segment(dialogue, words, cursor);
            if let Some(segment) = segment {
                segments.push(segment);
                cursor = next_cursor;
            }
        }
        segments
    }

    /// Aligns all dialogue lines and returns the matches re-merged into
    /// original script order. Lines whose speaker has no transcript are
    /// skipped entirely; unmatched lines are omitted, so the result is a
    /// sparse view of the script keyed by `DialogueLine::index`.
    pub fn align_all(
        &self,
        dialogues: &[DialogueLine],
        transcripts: &HashMap<String, Vec<WordSegment>>,
    ) -> Vec<AlignedSegment> {
        let mut by_index: BTreeMap<usize, AlignedSegment> = BTreeMap::new();
        for (speaker, lines) in group_by_speaker(dialogues) {
            let Some(words) = transcripts.get(&speaker) else {
                debug!(speaker = %speaker, lines = lines.len(), "no transcript for speaker; skipping");
                continue;
            };
            let aligned = self.align_speaker(&lines, words);
            info!(
                speaker = %speaker,
                lines = lines.len(),
                matched = aligned.len(),
                "speaker alignment finished"
            );
            for segment in aligned {
                by_index.insert(segment.dialogue.index, segment);
            }
        }
        by_index.into_values().collect()
    }
}

/// Groups lines by speaker, keeping speakers in first-appearance order and
/// lines in original relative order, so a run over the same input always
/// proceeds identically.
fn group_by_speaker(dialogues: &[DialogueLine]) -> Vec<(String, Vec<DialogueLine>)> {
    let mut groups: Vec<(String, Vec<DialogueLine>)> = Vec::new();
    for dialogue in dialogues {
        match groups.iter_mut().find(|(speaker, _)| *speaker == dialogue.speaker) {
            Some((_, lines)) => lines.push(dialogue.clone()),
            None => groups.push((dialogue.speaker.clone(), vec![dialogue.clone()])),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grouping_preserves_first_appearance_and_relative_order() {
        let dialogues = vec![
            DialogueLine::new(0, "alice", "one"),
            DialogueLine::new(1, "bob", "two"),
            DialogueLine::new(2, "alice", "three"),
        ];
        let groups = group_by_speaker(&dialogues);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "alice");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[0].1[1].index, 2);
        assert_eq!(groups[1].0, "bob");
    }
}
