//! yt-subtitle-mission: binary entrypoint.
//! No arguments runs the interactive mission; subcommands cover config-driven
//! runs and artifact maintenance.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use yt_subtitle_mission::artifact::ArtifactStore;
use yt_subtitle_mission::downloader::YtDlp;
use yt_subtitle_mission::llm::build_client_from_config;
use yt_subtitle_mission::manifest::{
    interactive_channels, read_channel_list, read_url_list, TerminalPrompter,
};
use yt_subtitle_mission::report::write_reports;
use yt_subtitle_mission::subtitle::clean_vtt;
use yt_subtitle_mission::{Manifest, MissionConfig, MissionControl, Report};

#[derive(Parser)]
#[command(name = "yt-subtitle-mission")]
#[command(about = "Extract cleaned YouTube subtitles for channel uploads newer than a cutoff")]
#[command(version)]
struct Cli {
    /// Mission config (TOML); falls back to $MISSION_CONFIG_PATH, then config/mission.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a mission (the default)
    Run {
        /// Channel list CSV for the interactive manifest
        #[arg(long, conflicts_with = "urls")]
        channels: Option<PathBuf>,

        /// Watch URLs to process instead of channels (.json/.html bookmarks or .txt)
        #[arg(long)]
        urls: Option<PathBuf>,
    },

    /// Rebuild the yt-dlp download archive from artifacts on disk
    ArchiveSync,

    /// Quarantine byte-identical subtitle files
    Dedupe {
        /// Report duplicates without moving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Clean a single raw .vtt file
    Clean {
        input: PathBuf,

        /// Output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// `RUST_LOG` filter (default `yt_subtitle_mission=info,warn`), compact
/// output unless `MISSION_LOG_FORMAT=json`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("yt_subtitle_mission=info,warn"));
    let json = std::env::var("MISSION_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local runs (MISSION_CONFIG_PATH, RUST_LOG, LLM_TEST_MODE).
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = dispatch(cli).await {
        error!(error = %format!("{e:#}"), "mission aborted");
        eprintln!("Error: {e:#}");
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn dispatch(cli: Cli) -> Result<()> {
    let config = MissionConfig::load(cli.config.as_deref())?;
    match cli.command {
        None => run_mission(config, None, None).await,
        Some(Commands::Run { channels, urls }) => run_mission(config, channels, urls).await,
        Some(Commands::ArchiveSync) => {
            let n = ArtifactStore::new(&config.output_dir).rebuild_archive(&config.archive_file)?;
            println!("{} entries written to {}", n, config.archive_file.display());
            Ok(())
        }
        Some(Commands::Dedupe { dry_run }) => {
            let report = ArtifactStore::new(&config.output_dir).dedupe(dry_run)?;
            let verb = if dry_run { "would move" } else { "moved" };
            for (from, to) in &report.moved {
                println!("{verb} {} -> {}", from.display(), to.display());
            }
            println!(
                "{} duplicate groups, {} files {verb}",
                report.duplicate_groups,
                report.moved.len()
            );
            Ok(())
        }
        Some(Commands::Clean { input, output }) => clean_one(&input, output.as_deref()),
    }
}

async fn run_mission(
    mut config: MissionConfig,
    channels_csv: Option<PathBuf>,
    url_list: Option<PathBuf>,
) -> Result<()> {
    let ytdlp = YtDlp::new(config.downloader.clone(), &config.archive_file);
    let version = ytdlp.probe().await?;
    info!(version = %version, "yt-dlp available");

    let manifest = if let Some(path) = url_list {
        let urls = read_url_list(&path)?;
        let source = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "url-list".to_string());
        Manifest::from_urls(&source, &urls)
    } else {
        if config.channels.is_empty() {
            let path = channels_csv.unwrap_or_else(|| config.channel_list.clone());
            let rows = read_channel_list(&path)?;
            let mut prompter = TerminalPrompter::new();
            config.channels =
                interactive_channels(&rows, &mut prompter, Local::now().date_naive())?;
        }
        Manifest::from_channels(&config.channels)?
    };
    if manifest.is_empty() {
        println!("No targets selected; nothing to do.");
        return Ok(());
    }

    let llm = build_client_from_config(&config.llm);
    let report_dir = config.report_dir.clone();
    let control = MissionControl::new(config, Box::new(ytdlp), llm);
    let outcomes = control.run(&manifest).await?;

    println!("{}", Report::from_outcomes(&outcomes).render());
    for path in write_reports(&report_dir, &outcomes, Local::now())? {
        info!(path = %path.display(), "report written");
    }
    Ok(())
}

fn clean_one(input: &Path, output: Option<&Path>) -> Result<()> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let cleaned = clean_vtt(&raw).with_context(|| format!("cleaning {}", input.display()))?;
    match output {
        Some(out) => std::fs::write(out, cleaned)
            .with_context(|| format!("writing {}", out.display()))?,
        None => print!("{cleaned}"),
    }
    Ok(())
}
