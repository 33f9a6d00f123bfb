//! CLI entry point for linkgrab.

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};

mod app;
mod cli;

use app::config::load_default_file_config;
use app::settings::Settings;
use app::{commands, terminal};
use cli::Cli;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    terminal::init_tracing(
        terminal::default_log_level(cli.quiet, cli.verbose),
        terminal::no_color_env_requested() || terminal::is_dumb_terminal(),
    );
    debug!(command = ?cli.command, verbose = cli.verbose, "CLI arguments parsed");

    let file_config = load_default_file_config()?;
    let settings = Settings::resolve(&cli, file_config.as_ref())?;
    info!(
        backend = %settings.backend_url,
        proxy_mode = %settings.proxy_mode,
        "linkgrab starting"
    );

    let exit = commands::dispatch(&cli, &settings).await?;
    Ok(exit.into())
}
