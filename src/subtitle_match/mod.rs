//! Subtitle matching for renaming subtitle files after their episode files.
//!
//! Episode and subtitle files are selected by extension,
//! episode numbers are extracted with a user-given regex containing a `value` group,
//! and subtitles are paired with episodes that have the same number.

mod matching;
mod plan;

pub use matching::{
    ClassifiedFile, EPISODE_GROUP, EpisodePattern, Extension, classify, derive_subtitle_name,
    duplicate_episode_numbers, extract_episode_number, normalize_extension, pair, subtitles_by_episode,
};
pub use plan::{MatchInput, MatchPlan, MatchedPair};
