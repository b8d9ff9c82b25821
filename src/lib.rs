//! scriptalign - temporal alignment and subtitle segmentation engine
//!
//! Matches authored dialogue lines against per-speaker transcripts of timed
//! words, re-derives clean word-level timestamps even when the transcript's
//! wording drifts from the script, and splits long subtitle text at
//! linguistically sound boundaries with exact audio timestamps for every
//! split point.
//!
//! Transcription, voice-activity trimming, rendering, and export live in
//! external collaborators; this crate only consumes their data shapes
//! ([`types::DialogueLine`], [`types::WordSegment`]) and produces
//! [`types::AlignedSegment`] lists plus split offsets/timestamps.

pub mod align;
pub mod segment;
pub mod text;
pub mod types;

pub use align::{ScriptAligner, SegmentFinder};
pub use segment::{SplitMode, SubtitlePiece, SubtitleSegmenter};
pub use text::fuzzy::FuzzyMatcher;
pub use text::numbers::NumberSpeller;
pub use types::{
    AlignedSegment, AlignerConfig, AlignmentOptions, DialogueLine, SegmenterConfig,
    SubtitleOptions, WordSegment,
};
