mod config;
mod renamer;

use std::path::PathBuf;

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use crate::renamer::SubtitleRename;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Rename subtitle files to match their episode files"
)]
pub struct Args {
    /// Optional input directory
    #[arg(value_hint = clap::ValueHint::DirPath)]
    path: Option<PathBuf>,

    /// Episode file extension
    #[arg(short = 'e', long, value_name = "EXTENSION")]
    episode_ext: Option<String>,

    /// Subtitle file extension
    #[arg(short = 's', long, value_name = "EXTENSION")]
    subtitle_ext: Option<String>,

    /// Episode number regex for episode files, with a named group `value`
    #[arg(short = 'E', long, value_name = "REGEX")]
    episode_regex: Option<String>,

    /// Episode number regex for subtitle files, with a named group `value`
    #[arg(short = 'S', long, value_name = "REGEX")]
    subtitle_regex: Option<String>,

    /// Enable debug prints
    #[arg(short = 'D', long)]
    debug: bool,

    /// Only print changes without renaming files
    #[arg(short = 'p', long)]
    print: bool,

    /// Create shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        sub_rename::generate_shell_completion(*shell, Args::command(), true, env!("CARGO_BIN_NAME"))
    } else {
        let path = sub_rename::resolve_input_directory(args.path.as_deref())?;
        let config = config::Config::from_args(args)?;
        SubtitleRename::new(path, config).run()?;
        Ok(())
    }
}
