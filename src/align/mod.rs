//! Temporal alignment: locating each dialogue line inside its speaker's
//! transcript and re-deriving clean word-level timestamps for it.

mod finder;
mod orchestrator;
mod remap;

pub use finder::SegmentFinder;
pub use orchestrator::ScriptAligner;
pub use remap::rebuild_word_timings;
