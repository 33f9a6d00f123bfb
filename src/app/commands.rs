//! Subcommand handlers: resolve, download and health.

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result, bail};
use linkgrab_core::{
    ApiClient, DirectoryLibrary, DownloadOrchestrator, HttpClient, ImageEntry, LinkPipeline,
    Notice, Platform, ResolveSummary, Session,
};
use serde::Serialize;
use tracing::{debug, info};

use super::exit::{ProcessExit, determine_exit_outcome};
use super::progress::DownloadProgress;
use super::settings::Settings;
use super::terminal;
use crate::cli::{Cli, Command, DownloadArgs, ResolveArgs};

/// JSON shape printed by `resolve --json`.
#[derive(Debug, Serialize)]
struct ResolveOutput<'a> {
    link: &'a str,
    platform: Platform,
    note_id: Option<&'a str>,
    images: &'a [ImageEntry],
}

/// Runs the selected subcommand.
pub(crate) async fn dispatch(cli: &Cli, settings: &Settings) -> Result<ProcessExit> {
    let api = ApiClient::with_timeout(settings.backend_url.clone(), settings.api_timeout_secs)
        .context("Failed to create backend client")?;

    match &cli.command {
        Command::Resolve(args) => run_resolve(cli, settings, api, args).await,
        Command::Download(args) => run_download(cli, settings, api, args).await,
        Command::Health => run_health(&api).await,
    }
}

fn build_pipeline(settings: &Settings, api: ApiClient) -> LinkPipeline {
    LinkPipeline::new(api)
        .with_proxy_mode(settings.proxy_mode)
        .with_direct_for_non_doubao(settings.direct_for_non_doubao)
}

/// Joins positional words, or reads stdin when it is piped.
fn read_share_text(words: &[String]) -> Result<String> {
    if !words.is_empty() {
        return Ok(words.join(" "));
    }
    if io::stdin().is_terminal() {
        bail!("No share text provided. Pass it as arguments or pipe it via stdin.");
    }
    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .context("Failed to read share text from stdin")?;
    Ok(buffer)
}

/// Resolves into `session`; prints the notice and returns `None` on failure.
async fn resolve_into(
    pipeline: &LinkPipeline,
    session: &mut Session,
    text: &str,
    settings: &Settings,
) -> Option<ResolveSummary> {
    match pipeline
        .resolve(session, text, settings.cookie.as_deref())
        .await
    {
        Ok(summary) => {
            debug!(
                link = %summary.link,
                has_session_id = summary.has_session_id,
                "resolve complete"
            );
            Some(summary)
        }
        Err(error) => {
            eprintln!("{}", Notice::from_pipeline_error(&error));
            None
        }
    }
}

async fn run_resolve(
    cli: &Cli,
    settings: &Settings,
    api: ApiClient,
    args: &ResolveArgs,
) -> Result<ProcessExit> {
    let text = read_share_text(&args.text)?;
    let pipeline = build_pipeline(settings, api);
    let mut session = Session::new();

    let Some(summary) = resolve_into(&pipeline, &mut session, &text, settings).await else {
        print_log(cli, &session);
        return Ok(ProcessExit::Failure);
    };

    if args.json {
        let output = resolve_output(&summary, &session);
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to encode image list")?
        );
    } else {
        print_entries(session.entries());
        if session.is_empty() && !cli.quiet {
            eprintln!("{}", Notice::toast("no images found"));
        }
    }

    print_log(cli, &session);
    Ok(ProcessExit::Success)
}

fn resolve_output<'a>(summary: &'a ResolveSummary, session: &'a Session) -> ResolveOutput<'a> {
    ResolveOutput {
        link: &summary.link,
        platform: summary.platform,
        note_id: session
            .last_result()
            .and_then(|result| result.note_id.as_deref()),
        images: session.entries(),
    }
}

fn print_entries(entries: &[ImageEntry]) {
    for entry in entries {
        let cover = if entry.is_cover { " [cover]" } else { "" };
        println!("{:>3}. {}{cover}", entry.index + 1, entry.display_url);
    }
}

async fn run_download(
    cli: &Cli,
    settings: &Settings,
    api: ApiClient,
    args: &DownloadArgs,
) -> Result<ProcessExit> {
    let text = read_share_text(&args.text)?;
    let pipeline = build_pipeline(settings, api);
    let mut session = Session::new();

    if resolve_into(&pipeline, &mut session, &text, settings)
        .await
        .is_none()
    {
        print_log(cli, &session);
        return Ok(ProcessExit::Failure);
    }

    match args.selected_indices() {
        None => session.select_all(),
        Some(indices) => {
            for index in indices {
                session.set_selected(index, true).with_context(|| {
                    format!(
                        "Image {} is not in the list ({} image(s) found)",
                        index + 1,
                        session.len()
                    )
                })?;
            }
        }
    }

    if session.selected_count() == 0 {
        eprintln!("{}", Notice::toast("nothing to download"));
        print_log(cli, &session);
        return Ok(ProcessExit::Failure);
    }

    let client = HttpClient::new_with_timeouts(
        settings.download_connect_timeout_secs,
        settings.download_read_timeout_secs,
    );
    let library = DirectoryLibrary::new(&settings.output_dir);
    let note_id = session
        .last_result()
        .and_then(|result| result.note_id.clone());
    let orchestrator = DownloadOrchestrator::new(&client, &library).with_note_id(note_id);

    let progress = DownloadProgress::new(
        session.selected_count(),
        terminal::should_use_progress(
            io::stderr().is_terminal(),
            cli.quiet,
            terminal::is_dumb_terminal(),
        ),
    );
    let report = orchestrator
        .run_selection(&mut session, |outcome| progress.on_item(outcome))
        .await;
    progress.finish();

    for outcome in &report.outcomes {
        match (&outcome.saved_path, &outcome.failure) {
            (Some(path), _) => println!("{}", path.display()),
            (None, Some(failure)) => {
                eprintln!("image {}: {} ({failure})", outcome.index + 1, outcome.state);
            }
            (None, None) => {}
        }
    }

    let notice = Notice::from_report(&report);
    if notice.is_modal() || !cli.quiet {
        eprintln!("{notice}");
    }
    info!(
        saved = report.success_count,
        failed = report.fail_count,
        output_dir = %settings.output_dir.display(),
        "download command finished"
    );

    print_log(cli, &session);
    Ok(determine_exit_outcome(
        report.success_count,
        report.fail_count,
    ))
}

async fn run_health(api: &ApiClient) -> Result<ProcessExit> {
    match api.health().await {
        Ok(()) => {
            println!("backend ok: {}", api.base_url());
            Ok(ProcessExit::Success)
        }
        Err(error) => {
            eprintln!("{}", Notice::from_api_error(&error));
            Ok(ProcessExit::Failure)
        }
    }
}

fn print_log(cli: &Cli, session: &Session) {
    if !cli.show_log {
        return;
    }
    for entry in session.log().iter() {
        eprintln!("{entry}");
    }
}
