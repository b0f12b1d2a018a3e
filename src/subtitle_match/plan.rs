//! Match plan computed from a directory listing and the user inputs.

use std::fmt;

use crate::subtitle_match::matching::{
    ClassifiedFile, EpisodePattern, Extension, classify, derive_subtitle_name, duplicate_episode_numbers,
    subtitles_by_episode,
};

/// Everything needed to compute a match plan.
#[derive(Debug, Clone)]
pub struct MatchInput {
    pub files: Vec<String>,
    pub episode_extension: Extension,
    pub subtitle_extension: Extension,
    pub episode_pattern: EpisodePattern,
    pub subtitle_pattern: EpisodePattern,
}

/// Episode file paired with the subtitle file that has the same episode number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedPair {
    pub episode: u32,
    pub episode_file: String,
    pub subtitle_file: String,
    pub new_name: String,
}

/// Classified files and the matched pairs derived from them.
#[derive(Debug, Clone, Default)]
pub struct MatchPlan {
    pub episodes: Vec<ClassifiedFile>,
    pub subtitles: Vec<ClassifiedFile>,
    pub pairs: Vec<MatchedPair>,
    /// Episode numbers shared by several subtitle files.
    pub duplicates: Vec<u32>,
}

impl MatchInput {
    /// Create input from raw user-entered strings.
    #[must_use]
    pub fn new(
        files: Vec<String>,
        episode_extension: &str,
        subtitle_extension: &str,
        episode_pattern: &str,
        subtitle_pattern: &str,
    ) -> Self {
        Self {
            files,
            episode_extension: Extension::new(episode_extension),
            subtitle_extension: Extension::new(subtitle_extension),
            episode_pattern: EpisodePattern::new(episode_pattern),
            subtitle_pattern: EpisodePattern::new(subtitle_pattern),
        }
    }
}

impl MatchedPair {
    /// True if the subtitle file does not already have the derived name.
    #[must_use]
    pub fn needs_rename(&self) -> bool {
        self.subtitle_file != self.new_name
    }
}

impl MatchPlan {
    /// Classify files, pair them by episode number and derive new subtitle names.
    #[must_use]
    pub fn new(input: &MatchInput) -> Self {
        let episodes = classify(input.files.as_slice(), &input.episode_extension, &input.episode_pattern);
        let subtitles = classify(input.files.as_slice(), &input.subtitle_extension, &input.subtitle_pattern);
        let duplicates = duplicate_episode_numbers(&subtitles);

        let by_episode = subtitles_by_episode(&subtitles);
        let pairs = episodes
            .iter()
            .filter_map(|file| {
                let episode = file.episode?;
                let subtitle_file = by_episode.get(&episode)?;
                Some(MatchedPair {
                    episode,
                    episode_file: file.name.clone(),
                    subtitle_file: (*subtitle_file).to_string(),
                    new_name: derive_subtitle_name(&file.name, &input.episode_extension, &input.subtitle_extension),
                })
            })
            .collect();

        Self {
            episodes,
            subtitles,
            pairs,
            duplicates,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Matched pairs where the subtitle file needs a new name.
    pub fn renames(&self) -> impl Iterator<Item = &MatchedPair> {
        self.pairs.iter().filter(|pair| pair.needs_rename())
    }
}

impl fmt::Display for MatchedPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} <- {}", self.episode, self.episode_file, self.subtitle_file)
    }
}
