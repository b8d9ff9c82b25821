//! Core types for the script-to-audio alignment pipeline

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

/// One authored line of dialogue from the parsed script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueLine {
    /// Position of this line in the original script order.
    pub index: usize,
    pub speaker: String,
    pub text: String,
}

impl DialogueLine {
    pub fn new(index: usize, speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            index,
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// A single transcribed word with timing information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordSegment {
    pub text: String,
    pub start: f64, // seconds
    pub end: f64,   // seconds
}

impl WordSegment {
    pub fn new(text: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            text: text.into(),
            start,
            end,
        }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A dialogue line matched to a span of its speaker's narration audio.
///
/// `words` carries one entry per dialogue token after timestamp
/// reconstruction; segmentation may later replace it with per-piece word
/// lists when the line is split for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignedSegment {
    pub dialogue: DialogueLine,
    pub start_time: f64,
    pub end_time: f64,
    /// Matching confidence, 0-100.
    pub confidence: f64,
    /// Word-level timestamps for precise editing.
    pub words: Vec<WordSegment>,
}

/// Tunables for dialogue-to-transcript matching.
#[derive(Debug, Clone, Copy)]
pub struct AlignerConfig {
    /// Minimum similarity score (0-100) for a window to be accepted.
    pub similarity_threshold: f64,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 60.0,
        }
    }
}

/// Character-budget tunables for subtitle segmentation.
///
/// Line caps apply directly when wrapping text inside a segment; segment
/// caps are derived from them with headroom for `max_lines` display lines.
#[derive(Debug, Clone, Copy)]
pub struct SegmenterConfig {
    /// Per-line length a break should aim for.
    pub soft_chars_per_line: usize,
    /// Per-line length a break must not exceed outside forced truncation.
    pub hard_chars_per_line: usize,
    /// Maximum display lines per subtitle segment.
    pub max_lines: usize,
    /// Enables the language-aware scoring branch (morphology / word lists).
    pub split_on_conjunctions: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            soft_chars_per_line: 20,
            hard_chars_per_line: 25,
            max_lines: 2,
            split_on_conjunctions: true,
        }
    }
}

/// Alignment tunables parsed from caller-provided JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct AlignmentOptions {
    #[serde(
        default = "default_similarity_threshold",
        alias = "similarityThreshold",
        alias = "threshold"
    )]
    pub similarity_threshold: f64,
}

fn default_similarity_threshold() -> f64 {
    AlignerConfig::default().similarity_threshold
}

impl AlignmentOptions {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse alignment options JSON")
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=100.0).contains(&self.similarity_threshold),
            "Similarity threshold must be within 0-100, got {}",
            self.similarity_threshold
        );
        Ok(())
    }

    pub fn to_config(&self) -> AlignerConfig {
        AlignerConfig {
            similarity_threshold: self.similarity_threshold,
        }
    }
}

/// Subtitle segmentation tunables parsed from caller-provided JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct SubtitleOptions {
    #[serde(
        default = "default_soft_chars",
        alias = "maxCharsPerLine",
        alias = "softCap"
    )]
    pub soft_chars_per_line: usize,
    #[serde(
        default = "default_hard_chars",
        alias = "hardCharsPerLine",
        alias = "hardCap"
    )]
    pub hard_chars_per_line: usize,
    #[serde(default = "default_max_lines", alias = "maxLines")]
    pub max_lines: usize,
    #[serde(default = "default_split_on_conjunctions", alias = "splitOnConjunctions")]
    pub split_on_conjunctions: bool,
}

fn default_soft_chars() -> usize {
    SegmenterConfig::default().soft_chars_per_line
}

fn default_hard_chars() -> usize {
    SegmenterConfig::default().hard_chars_per_line
}

fn default_max_lines() -> usize {
    SegmenterConfig::default().max_lines
}

fn default_split_on_conjunctions() -> bool {
    true
}

impl SubtitleOptions {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Failed to parse subtitle options JSON")
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.soft_chars_per_line > 0,
            "Soft character cap must be greater than zero"
        );
        ensure!(
            self.hard_chars_per_line >= self.soft_chars_per_line,
            "Hard character cap ({}) must not be below the soft cap ({})",
            self.hard_chars_per_line,
            self.soft_chars_per_line
        );
        ensure!(self.max_lines > 0, "Max lines must be greater than zero");
        Ok(())
    }

    pub fn to_config(&self) -> SegmenterConfig {
        SegmenterConfig {
            soft_chars_per_line: self.soft_chars_per_line,
            hard_chars_per_line: self.hard_chars_per_line,
            max_lines: self.max_lines,
            split_on_conjunctions: self.split_on_conjunctions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alignment_options_default_threshold() {
        let options = AlignmentOptions::from_json("{}").unwrap();
        options.validate().unwrap();
        assert_eq!(options.to_config().similarity_threshold, 60.0);
    }

    #[test]
    fn alignment_options_reject_out_of_range_threshold() {
        let options = AlignmentOptions::from_json(r#"{"threshold": 140.0}"#).unwrap();
        assert!(options.validate().is_err());
    }

    #[test]
    fn subtitle_options_accept_camel_case_aliases() {
        let options = SubtitleOptions::from_json(
            r#"{"maxCharsPerLine": 16, "hardCap": 21, "maxLines": 3, "splitOnConjunctions": false}"#,
        )
        .unwrap();
        options.validate().unwrap();
        let config = options.to_config();
        assert_eq!(config.soft_chars_per_line, 16);
        assert_eq!(config.hard_chars_per_line, 21);
        assert_eq!(config.max_lines, 3);
        assert!(!config.split_on_conjunctions);
    }

    #[test]
    fn subtitle_options_reject_inverted_caps() {
        let options = SubtitleOptions::from_json(r#"{"softCap": 30, "hardCap": 20}"#).unwrap();
        assert!(options.validate().is_err());
    }
}
