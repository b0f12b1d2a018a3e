use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use colored::Colorize;

use sub_rename::subtitle_match::{EpisodePattern, MatchInput, MatchPlan, MatchedPair};
use sub_rename::{print_error, print_warning};

use crate::config::Config;

const MAX_TEMP_ATTEMPTS: usize = 100;

/// Subtitle rename handler for a single directory.
#[derive(Debug)]
pub struct SubtitleRename {
    root: PathBuf,
    config: Config,
}

/// Counts of what happened to the matched pairs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenameSummary {
    /// Renamed, or would have been renamed in a dryrun.
    pub renamed: usize,
    /// Target name already exists.
    pub skipped: usize,
    /// Source missing or rename failed.
    pub failed: usize,
    /// Subtitle already has the episode name.
    pub unchanged: usize,
}

impl SubtitleRename {
    #[must_use]
    pub const fn new(root: PathBuf, config: Config) -> Self {
        Self { root, config }
    }

    /// Match subtitle files to episode files and rename them.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be read.
    pub fn run(&self) -> anyhow::Result<RenameSummary> {
        if self.config.debug {
            println!("Root: {}", self.root.display());
            println!("{}", self.config);
        }

        let files = sub_rename::list_directory_files(&self.root)?;
        let input = self.config.match_input(files);
        Self::check_patterns(&input);

        let plan = MatchPlan::new(&input);
        if self.config.verbose {
            Self::print_plan(&plan);
        }
        for episode in &plan.duplicates {
            print_warning!("Multiple subtitle files for episode {episode}, using the last one");
        }

        if plan.is_empty() {
            print_warning!("No files were matched. Aborting.");
            return Ok(RenameSummary::default());
        }

        let summary = self.rename_pairs(&plan);
        self.print_summary(summary);
        Ok(summary)
    }

    /// Warn about patterns that can never produce an episode number.
    fn check_patterns(input: &MatchInput) {
        for (name, pattern) in [
            ("episode", &input.episode_pattern),
            ("subtitle", &input.subtitle_pattern),
        ] {
            Self::check_pattern(name, pattern);
        }
    }

    fn check_pattern(name: &str, pattern: &EpisodePattern) {
        if let Some(error) = pattern.error() {
            print_warning!("Invalid {name} regex, no files will match:\n{error}");
        } else if !pattern.has_value_group() {
            print_warning!(
                "The {name} regex has no named group `{}`: {pattern}",
                sub_rename::subtitle_match::EPISODE_GROUP
            );
        }
    }

    fn print_plan(plan: &MatchPlan) {
        println!("{}", format!("Episode files ({}):", plan.episodes.len()).bold());
        for file in &plan.episodes {
            println!("  {file}");
        }
        println!("{}", format!("Subtitle files ({}):", plan.subtitles.len()).bold());
        for file in &plan.subtitles {
            println!("  {file}");
        }
        println!("{}", format!("Matching files ({}):", plan.pairs.len()).bold());
        for pair in &plan.pairs {
            println!("  {pair}");
        }
    }

    /// Rename all matched subtitle files or just print changes if dryrun is enabled.
    ///
    /// Pairs are handled one at a time in episode file order.
    /// A failing pair is reported and the rest are still processed.
    fn rename_pairs(&self, plan: &MatchPlan) -> RenameSummary {
        let mut summary = RenameSummary {
            unchanged: plan.pairs.len() - plan.renames().count(),
            ..RenameSummary::default()
        };
        let renames: Vec<&MatchedPair> = plan.renames().collect();
        if renames.is_empty() {
            println!("Subtitle files already match the episode names");
            return summary;
        }

        let max_items = renames.len();
        let max_chars = max_items.checked_ilog10().map_or(1, |d| d as usize + 1);
        for (index, pair) in renames.into_iter().enumerate() {
            let number = format!("{:>max_chars$} / {max_items}", index + 1);
            let path = self.root.join(&pair.subtitle_file);
            let new_path = self.root.join(&pair.new_name);

            if !path.is_file() {
                print_error!("Subtitle file {} could not be read from the directory", pair.subtitle_file);
                summary.failed += 1;
                continue;
            }

            let capitalization_change_only = pair.subtitle_file.to_lowercase() == pair.new_name.to_lowercase();

            if self.target_is_taken(pair, &new_path, capitalization_change_only) {
                print_warning!(
                    "Subtitle file \"{}\" was not renamed because the operation would overwrite an existing file \"{}\"",
                    pair.subtitle_file,
                    pair.new_name
                );
                summary.skipped += 1;
                continue;
            }

            if self.config.dryrun {
                println!("{}", format!("Dryrun {number}:").bold().cyan());
                sub_rename::show_diff(&pair.subtitle_file, &pair.new_name);
                summary.renamed += 1;
                continue;
            }

            println!("{}", format!("Rename {number}:").bold().magenta());
            sub_rename::show_diff(&pair.subtitle_file, &pair.new_name);

            let rename_result = if capitalization_change_only {
                Self::rename_with_temp_file(&path, &new_path)
            } else {
                fs::rename(&path, &new_path)
            };

            match rename_result {
                Ok(()) => summary.renamed += 1,
                Err(e) => {
                    print_error!("Failed to rename {}\n{e}", pair.subtitle_file);
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    /// Check if renaming to `new_path` would replace some other file.
    fn target_is_taken(&self, pair: &MatchedPair, new_path: &Path, capitalization_change_only: bool) -> bool {
        if fs::symlink_metadata(new_path).is_err() {
            return false;
        }
        if !capitalization_change_only {
            return true;
        }
        // Case-insensitive file systems report the old file as the target,
        // so only an entry with the exact new name counts as a collision.
        match fs::read_dir(&self.root) {
            Ok(entries) => entries
                .filter_map(Result::ok)
                .any(|entry| entry.file_name().as_os_str() == OsStr::new(&pair.new_name)),
            Err(_) => true,
        }
    }

    /// Rename a file with an intermediate temp file to work around case-insensitive file systems.
    fn rename_with_temp_file(path: &Path, new_path: &Path) -> std::io::Result<()> {
        let temp_file = Self::free_temp_path(new_path)?;
        fs::rename(path, &temp_file)?;
        fs::rename(&temp_file, new_path)
    }

    /// Find a temp file name next to `new_path` that is not in use.
    fn free_temp_path(new_path: &Path) -> std::io::Result<PathBuf> {
        let name = sub_rename::path_to_filename_string(new_path);
        (0..MAX_TEMP_ATTEMPTS)
            .map(|n| {
                if n == 0 {
                    new_path.with_file_name(format!("{name}.tmp"))
                } else {
                    new_path.with_file_name(format!("{name}.{n}.tmp"))
                }
            })
            .find(|candidate| fs::symlink_metadata(candidate).is_err())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::AlreadyExists,
                    format!("No free temp file name for {name}"),
                )
            })
    }

    fn print_summary(&self, summary: RenameSummary) {
        if summary.renamed > 0 {
            let message = format!(
                "{} subtitle {}",
                summary.renamed,
                if summary.renamed > 1 { "files" } else { "file" }
            );
            if self.config.dryrun {
                println!("Dryrun: would have renamed {message}");
            } else {
                println!("{}", format!("Renamed {message}").green());
            }
        }
        if summary.skipped > 0 {
            println!("{}", format!("Skipped {} existing target names", summary.skipped).yellow());
        }
        if summary.failed > 0 {
            println!("{}", format!("Failed to rename {} files", summary.failed).red());
        }
        if self.config.verbose && summary.unchanged > 0 {
            println!("{} subtitle files already had the correct name", summary.unchanged);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn create_test_dir(names: &[&str]) -> TempDir {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        for name in names {
            File::create(dir.path().join(name)).expect("Failed to create file");
        }
        dir
    }

    fn config(dryrun: bool) -> Config {
        Config {
            debug: false,
            dryrun,
            episode_extension: "mp4".to_string(),
            episode_pattern: r"e(?<value>\d+)\.mp4".to_string(),
            subtitle_extension: "srt".to_string(),
            subtitle_pattern: r"ep(?<value>\d+)\.srt".to_string(),
            verbose: false,
        }
    }

    fn listing(dir: &TempDir) -> Vec<String> {
        sub_rename::list_directory_files(dir.path()).expect("Failed to list directory")
    }

    #[test]
    fn renames_matched_subtitle() {
        let dir = create_test_dir(&["e01.mp4", "ep1.srt"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config(false)).run().unwrap();

        assert_eq!(summary.renamed, 1);
        assert_eq!(listing(&dir), vec!["e01.mp4", "e01.srt"]);
    }

    #[test]
    fn keeps_subtitle_content() {
        let dir = create_test_dir(&["e01.mp4"]);
        fs::write(dir.path().join("ep1.srt"), "1\n00:00:01,000 --> 00:00:02,000\nHello\n").unwrap();
        SubtitleRename::new(dir.path().to_path_buf(), config(false)).run().unwrap();

        let content = fs::read_to_string(dir.path().join("e01.srt")).unwrap();
        assert!(content.contains("Hello"));
    }

    #[test]
    fn renames_multiple_pairs_in_order() {
        let dir = create_test_dir(&["e01.mp4", "e02.mp4", "e03.mp4", "ep1.srt", "ep3.srt"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config(false)).run().unwrap();

        assert_eq!(summary.renamed, 2);
        assert_eq!(listing(&dir), vec!["e01.mp4", "e01.srt", "e02.mp4", "e03.mp4", "e03.srt"]);
    }

    #[test]
    fn already_named_subtitle_is_unchanged() {
        let mut config = config(false);
        config.subtitle_pattern = r"e(?<value>\d+)\.srt".to_string();
        let dir = create_test_dir(&["e01.mp4", "e01.srt", "e02.mp4"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config).run().unwrap();

        assert_eq!(
            summary,
            RenameSummary {
                unchanged: 1,
                ..RenameSummary::default()
            }
        );
        assert_eq!(listing(&dir), vec!["e01.mp4", "e01.srt", "e02.mp4"]);
    }

    #[test]
    fn dryrun_does_not_rename() {
        let dir = create_test_dir(&["e01.mp4", "ep1.srt"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config(true)).run().unwrap();

        assert_eq!(summary.renamed, 1);
        assert_eq!(listing(&dir), vec!["e01.mp4", "ep1.srt"]);
    }

    #[test]
    fn existing_target_is_skipped_and_others_continue() {
        let dir = create_test_dir(&["e01.mp4", "e02.mp4", "ep1.srt", "ep2.srt", "e02.srt"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config(false)).run().unwrap();

        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(
            listing(&dir),
            vec!["e01.mp4", "e01.srt", "e02.mp4", "e02.srt", "ep2.srt"]
        );
    }

    #[test]
    fn empty_directory_does_nothing() {
        let dir = create_test_dir(&[]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config(false)).run().unwrap();

        assert_eq!(summary, RenameSummary::default());
        assert!(listing(&dir).is_empty());
    }

    #[test]
    fn no_matches_does_nothing() {
        let dir = create_test_dir(&["e01.mp4", "ep2.srt", "notes.txt"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config(false)).run().unwrap();

        assert_eq!(summary, RenameSummary::default());
        assert_eq!(listing(&dir), vec!["e01.mp4", "ep2.srt", "notes.txt"]);
    }

    #[test]
    fn invalid_pattern_does_nothing() {
        let mut config = config(false);
        config.episode_pattern = r"e(?<value>\d+".to_string();
        let dir = create_test_dir(&["e01.mp4", "ep1.srt"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config).run().unwrap();

        assert_eq!(summary, RenameSummary::default());
        assert_eq!(listing(&dir), vec!["e01.mp4", "ep1.srt"]);
    }

    #[test]
    fn missing_source_is_reported() {
        let dir = create_test_dir(&["e01.mp4"]);
        let renamer = SubtitleRename::new(dir.path().to_path_buf(), config(false));
        let files = vec!["e01.mp4".to_string(), "ep1.srt".to_string()];
        let plan = MatchPlan::new(&renamer.config.match_input(files));
        let summary = renamer.rename_pairs(&plan);

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.renamed, 0);
        assert_eq!(listing(&dir), vec!["e01.mp4"]);
    }

    #[test]
    fn capitalization_only_change_is_renamed() {
        let mut config = config(false);
        config.subtitle_pattern = r"(?i)e(?<value>\d+)\.srt".to_string();
        let dir = create_test_dir(&["e01.mp4", "E01.srt"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config).run().unwrap();

        assert_eq!(summary.renamed, 1);
        assert_eq!(listing(&dir), vec!["e01.mp4", "e01.srt"]);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn capitalization_only_change_does_not_overwrite_existing_file() {
        let mut config = config(false);
        config.subtitle_pattern = r"E(?<value>\d+)\.srt".to_string();
        let dir = create_test_dir(&["e01.mp4"]);
        fs::write(dir.path().join("E01.srt"), "new").unwrap();
        fs::write(dir.path().join("e01.srt"), "existing").unwrap();
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config).run().unwrap();

        assert_eq!(
            summary,
            RenameSummary {
                skipped: 1,
                ..RenameSummary::default()
            }
        );
        assert_eq!(fs::read_to_string(dir.path().join("E01.srt")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dir.path().join("e01.srt")).unwrap(), "existing");
    }

    #[test]
    fn capitalization_only_change_keeps_file_with_temp_name() {
        let mut config = config(false);
        config.subtitle_pattern = r"(?i)e(?<value>\d+)\.srt".to_string();
        let dir = create_test_dir(&["e01.mp4"]);
        fs::write(dir.path().join("E01.srt"), "subtitle").unwrap();
        fs::write(dir.path().join("e01.srt.tmp"), "unrelated").unwrap();
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config).run().unwrap();

        assert_eq!(summary.renamed, 1);
        assert_eq!(listing(&dir), vec!["e01.mp4", "e01.srt", "e01.srt.tmp"]);
        assert_eq!(fs::read_to_string(dir.path().join("e01.srt")).unwrap(), "subtitle");
        assert_eq!(fs::read_to_string(dir.path().join("e01.srt.tmp")).unwrap(), "unrelated");
    }

    #[test]
    fn free_temp_path_skips_used_names() {
        let dir = create_test_dir(&["e01.srt.tmp", "e01.srt.1.tmp"]);
        let temp = SubtitleRename::free_temp_path(&dir.path().join("e01.srt")).unwrap();
        assert_eq!(temp, dir.path().join("e01.srt.2.tmp"));
    }

    #[test]
    fn duplicate_subtitle_uses_last_one() {
        let mut config = config(false);
        config.subtitle_pattern = r"(?<value>\d+)\.srt".to_string();
        let dir = create_test_dir(&["e01.mp4", "a1.srt", "b1.srt"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config).run().unwrap();

        assert_eq!(summary.renamed, 1);
        assert_eq!(listing(&dir), vec!["a1.srt", "e01.mp4", "e01.srt"]);
    }

    #[test]
    fn other_extensions_are_ignored() {
        let dir = create_test_dir(&["e01.mkv", "ep1.srt", "ep1.ass"]);
        let summary = SubtitleRename::new(dir.path().to_path_buf(), config(false)).run().unwrap();

        assert_eq!(summary, RenameSummary::default());
        assert_eq!(listing(&dir), vec!["e01.mkv", "ep1.ass", "ep1.srt"]);
    }
}
