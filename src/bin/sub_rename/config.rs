use std::fmt;

use anyhow::Context;
use serde::Deserialize;

use sub_rename::subtitle_match::{MatchInput, normalize_extension};

use crate::Args;

/// Final config created from CLI arguments and user config file.
#[derive(Debug, Default)]
pub struct Config {
    pub(crate) debug: bool,
    pub(crate) dryrun: bool,
    pub(crate) episode_extension: String,
    pub(crate) episode_pattern: String,
    pub(crate) subtitle_extension: String,
    pub(crate) subtitle_pattern: String,
    pub(crate) verbose: bool,
}

/// Config from a config file
#[derive(Debug, Default, Deserialize)]
struct SubRenameConfig {
    #[serde(default)]
    debug: bool,
    #[serde(default)]
    dryrun: bool,
    episode_extension: Option<String>,
    episode_pattern: Option<String>,
    subtitle_extension: Option<String>,
    subtitle_pattern: Option<String>,
    #[serde(default)]
    verbose: bool,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    subrename: SubRenameConfig,
}

impl SubRenameConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    fn get_user_config() -> anyhow::Result<Self> {
        let Some(path) = sub_rename::config_path() else {
            return Ok(Self::default());
        };

        match sub_rename::config::read_config_file(path)? {
            Some(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.subrename)
            .context("Failed to parse subrename config TOML")
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed,
    /// or if a required value is missing from both.
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let user_config = SubRenameConfig::get_user_config()?;
        Self::from_args_and_user_config(args, user_config)
    }

    /// Combine CLI args with user config. CLI args take precedence.
    fn from_args_and_user_config(args: Args, user_config: SubRenameConfig) -> anyhow::Result<Self> {
        Ok(Self {
            debug: args.debug || user_config.debug,
            dryrun: args.print || user_config.dryrun,
            episode_extension: required_extension(
                args.episode_ext,
                user_config.episode_extension,
                "--episode-ext",
                "episode_extension",
            )?,
            episode_pattern: required(
                args.episode_regex,
                user_config.episode_pattern,
                "--episode-regex",
                "episode_pattern",
            )?,
            subtitle_extension: required_extension(
                args.subtitle_ext,
                user_config.subtitle_extension,
                "--subtitle-ext",
                "subtitle_extension",
            )?,
            subtitle_pattern: required(
                args.subtitle_regex,
                user_config.subtitle_pattern,
                "--subtitle-regex",
                "subtitle_pattern",
            )?,
            verbose: args.verbose || user_config.verbose,
        })
    }

    /// Create match input for the given directory listing.
    pub(crate) fn match_input(&self, files: Vec<String>) -> MatchInput {
        MatchInput::new(
            files,
            &self.episode_extension,
            &self.subtitle_extension,
            &self.episode_pattern,
            &self.subtitle_pattern,
        )
    }
}

/// Pick the CLI value if given, otherwise the config file value.
/// Blank values count as missing.
fn required(arg: Option<String>, config: Option<String>, flag: &str, key: &str) -> anyhow::Result<String> {
    arg.filter(|value| !value.trim().is_empty())
        .or_else(|| config.filter(|value| !value.trim().is_empty()))
        .with_context(|| format!("Missing value: use {flag} or set `{key}` in the [subrename] config section"))
}

/// Like [`required`], but the value must also contain more than the leading dots.
fn required_extension(arg: Option<String>, config: Option<String>, flag: &str, key: &str) -> anyhow::Result<String> {
    let extension = required(arg, config, flag, key)?;
    if normalize_extension(extension.trim()).is_empty() {
        anyhow::bail!("Invalid extension \"{extension}\" for {flag}: nothing left after removing the leading dot");
    }
    Ok(extension)
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config:")?;
        writeln!(f, "  debug:              {}", sub_rename::colorize_bool(self.debug))?;
        writeln!(f, "  dryrun:             {}", sub_rename::colorize_bool(self.dryrun))?;
        writeln!(f, "  verbose:            {}", sub_rename::colorize_bool(self.verbose))?;
        writeln!(f, "  episode extension:  \"{}\"", self.episode_extension)?;
        writeln!(f, "  subtitle extension: \"{}\"", self.subtitle_extension)?;
        writeln!(f, "  episode pattern:    \"{}\"", self.episode_pattern)?;
        write!(f, "  subtitle pattern:   \"{}\"", self.subtitle_pattern)
    }
}
