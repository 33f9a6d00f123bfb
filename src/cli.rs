//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Resolve social-media share links and batch download their images.
///
/// Paste the share text as-is; the link is extracted from surrounding
/// words and punctuation.
#[derive(Parser, Debug)]
#[command(name = "linkgrab")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Parse backend base URL (overrides config `backend_url`)
    #[arg(long, value_name = "URL", global = true)]
    pub backend: Option<String>,

    /// Platform credential sent with the parse request
    #[arg(long, value_name = "COOKIE", global = true)]
    pub cookie: Option<String>,

    /// Fetch images from origin instead of the backend image proxy
    #[arg(long, global = true)]
    pub direct: bool,

    /// Directory saved images are written to (overrides config `output_dir`)
    #[arg(short = 'o', long, value_name = "DIR", global = true)]
    pub output_dir: Option<PathBuf>,

    /// Print the session log when the command finishes
    #[arg(long, global = true)]
    pub show_log: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve share text and list the images it contains
    Resolve(ResolveArgs),
    /// Resolve share text and save the selected images
    Download(DownloadArgs),
    /// Check that the parse backend is reachable
    Health,
}

#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
    /// Share text (read from stdin when omitted)
    pub text: Vec<String>,

    /// Print the image list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Share text (read from stdin when omitted)
    pub text: Vec<String>,

    /// Comma-separated 1-based image numbers to save (default: all)
    #[arg(
        short,
        long,
        value_delimiter = ',',
        value_name = "N,..",
        conflicts_with = "all",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub select: Vec<u16>,

    /// Save every image (the default when --select is absent)
    #[arg(short, long)]
    pub all: bool,
}

impl DownloadArgs {
    /// Zero-based indices from `--select`, or `None` for all images.
    #[must_use]
    pub fn selected_indices(&self) -> Option<Vec<usize>> {
        if self.all || self.select.is_empty() {
            return None;
        }
        Some(
            self.select
                .iter()
                .map(|number| usize::from(*number) - 1)
                .collect(),
        )
    }
}
