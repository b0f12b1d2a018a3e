//! Filename matching between episode and subtitle files.
//!
//! Everything here is a pure function of its inputs:
//! extension normalization, episode number extraction, classification,
//! pairing and target filename derivation.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;
use regex::Regex;

/// Name of the capture group that holds the episode number.
pub const EPISODE_GROUP: &str = "value";

/// File extension without the leading separator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Extension(String);

/// Regex used to extract an episode number from a filename.
///
/// An invalid pattern keeps its compile error so that a half-written regex
/// simply matches nothing instead of failing the whole run.
#[derive(Debug, Clone)]
pub struct EpisodePattern {
    source: String,
    regex: Result<Regex, regex::Error>,
}

/// File that passed the extension filter, with the extracted episode number if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    pub episode: Option<u32>,
    pub name: String,
}

impl Extension {
    /// Create a normalized extension from user input.
    ///
    /// ```rust
    /// use sub_rename::subtitle_match::Extension;
    ///
    /// assert_eq!(Extension::new(".srt").as_str(), "srt");
    /// assert_eq!(Extension::new("en.srt").as_str(), "en.srt");
    /// ```
    #[must_use]
    pub fn new(input: &str) -> Self {
        Self(normalize_extension(input).to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check if the filename ends with this extension, including the dot separator.
    /// An empty extension never matches, so `e01.` is not picked up by `.`.
    /// The command line rejects such extensions before matching.
    #[must_use]
    pub fn matches(&self, filename: &str) -> bool {
        !self.is_empty()
            && filename
                .strip_suffix(self.as_str())
                .is_some_and(|rest| rest.ends_with('.'))
    }
}

impl fmt::Display for Extension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl EpisodePattern {
    /// Compile the given pattern. Compile errors are not propagated.
    #[must_use]
    pub fn new(pattern: &str) -> Self {
        Self {
            source: pattern.to_string(),
            regex: Regex::new(pattern),
        }
    }

    /// The pattern string as given by the user.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.regex.is_ok()
    }

    /// The compile error for an invalid pattern.
    #[must_use]
    pub fn error(&self) -> Option<&regex::Error> {
        self.regex.as_ref().err()
    }

    /// True if the pattern compiled and contains the named `value` group.
    #[must_use]
    pub fn has_value_group(&self) -> bool {
        self.regex
            .as_ref()
            .is_ok_and(|regex| regex.capture_names().flatten().any(|name| name == EPISODE_GROUP))
    }

    /// Extract the episode number from the filename.
    ///
    /// Returns `None` if the pattern is invalid, does not match,
    /// leaves the `value` group empty, or the captured text is not a base-10 integer.
    #[must_use]
    pub fn extract(&self, filename: &str) -> Option<u32> {
        let captures = self.regex.as_ref().ok()?.captures(filename)?;
        captures.name(EPISODE_GROUP)?.as_str().parse::<u32>().ok()
    }
}

impl fmt::Display for EpisodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl fmt::Display for ClassifiedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.episode {
            Some(episode) => write!(f, "{episode}: {}", self.name),
            None => write!(f, "-: {}", self.name),
        }
    }
}

/// Strip leading dot separators from a user-entered extension.
///
/// ```rust
/// use sub_rename::subtitle_match::normalize_extension;
///
/// assert_eq!(normalize_extension(".mp4"), "mp4");
/// assert_eq!(normalize_extension("mkv"), "mkv");
/// assert_eq!(normalize_extension(""), "");
/// ```
#[must_use]
pub fn normalize_extension(input: &str) -> &str {
    input.trim_start_matches('.')
}

/// Compile the pattern and extract the episode number from the filename.
#[must_use]
pub fn extract_episode_number(filename: &str, pattern: &str) -> Option<u32> {
    EpisodePattern::new(pattern).extract(filename)
}

/// Select the files with the given extension and extract episode numbers for them.
///
/// Keeps the original order of `files`.
#[must_use]
pub fn classify<S: AsRef<str>>(files: &[S], extension: &Extension, pattern: &EpisodePattern) -> Vec<ClassifiedFile> {
    files
        .iter()
        .map(|name| name.as_ref())
        .filter(|name| extension.matches(name))
        .map(|name| ClassifiedFile {
            episode: pattern.extract(name),
            name: name.to_string(),
        })
        .collect()
}

/// Map episode number to subtitle filename.
///
/// Files without an episode number are skipped.
/// If several subtitles share a number, the last one wins.
#[must_use]
pub fn subtitles_by_episode(subtitles: &[ClassifiedFile]) -> HashMap<u32, &str> {
    subtitles
        .iter()
        .filter_map(|file| file.episode.map(|episode| (episode, file.name.as_str())))
        .collect()
}

/// Episode numbers that appear on more than one subtitle file, in ascending order.
#[must_use]
pub fn duplicate_episode_numbers(subtitles: &[ClassifiedFile]) -> Vec<u32> {
    subtitles
        .iter()
        .filter_map(|file| file.episode)
        .counts()
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(episode, _)| episode)
        .sorted_unstable()
        .collect()
}

/// Episode files that have a subtitle file with the same episode number.
///
/// Keeps the order of `episodes`.
#[must_use]
pub fn pair(episodes: &[ClassifiedFile], subtitles: &[ClassifiedFile]) -> Vec<(u32, String)> {
    let by_episode = subtitles_by_episode(subtitles);
    episodes
        .iter()
        .filter_map(|file| {
            file.episode
                .filter(|episode| by_episode.contains_key(episode))
                .map(|episode| (episode, file.name.clone()))
        })
        .collect()
}

/// Derive the subtitle filename that mirrors the given episode filename.
///
/// If the episode filename does not end with the episode extension,
/// the whole filename is used as the base name.
///
/// ```rust
/// use sub_rename::subtitle_match::{Extension, derive_subtitle_name};
///
/// let name = derive_subtitle_name("Show.S01E02.mkv", &Extension::new("mkv"), &Extension::new("srt"));
/// assert_eq!(name, "Show.S01E02.srt");
/// ```
#[must_use]
pub fn derive_subtitle_name(episode_filename: &str, episode_extension: &Extension, subtitle_extension: &Extension) -> String {
    let base = if episode_extension.is_empty() {
        episode_filename
    } else {
        episode_filename
            .strip_suffix(episode_extension.as_str())
            .and_then(|rest| rest.strip_suffix('.'))
            .unwrap_or(episode_filename)
    };
    format!("{base}.{subtitle_extension}")
}
