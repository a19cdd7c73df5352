// src/downloader/ytdlp.rs
//! yt-dlp subprocess backend. Arguments are passed as a vector; nothing is
//! ever interpolated into a shell string.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

use super::Downloader;
use crate::adjudicate::ScanPolicy;
use crate::artifact::ARTIFACT_SUFFIX;
use crate::config::mission::DownloaderConfig;
use crate::model::{format_date, parse_date, CandidateItem, Language, Mission, SectionKind, Target};

/// One upload per line: id, upload date, title (tab separated).
pub const PRINT_TEMPLATE: &str = "%(id)s\t%(upload_date)s\t%(title)s";
/// yt-dlp exits with 101 when `--break-match-filters` stops a listing.
pub const BREAK_FILTER_EXIT: i32 = 101;

pub struct YtDlp {
    cfg: DownloaderConfig,
    archive: PathBuf,
}

impl YtDlp {
    pub fn new(cfg: DownloaderConfig, archive: impl Into<PathBuf>) -> Self {
        Self {
            cfg,
            archive: archive.into(),
        }
    }

    /// `yt-dlp --version`; a failure here is fatal for the run.
    pub async fn probe(&self) -> Result<String> {
        let out = self
            .run(&["--version".to_string()])
            .await
            .with_context(|| format!("{} is not usable", self.cfg.program))?;
        Ok(out.trim().to_string())
    }

    fn throttle_args(&self) -> Vec<String> {
        let c = &self.cfg;
        vec![
            "--retries".into(),
            c.retries.to_string(),
            "--retry-sleep".into(),
            format!("exp={}:{}", c.sleep_interval, c.max_sleep_interval),
            "--sleep-interval".into(),
            c.sleep_interval.to_string(),
            "--max-sleep-interval".into(),
            c.max_sleep_interval.to_string(),
            "--sleep-requests".into(),
            c.sleep_requests.to_string(),
        ]
    }

    pub fn listing_args(&self, target: &Target, policy: ScanPolicy) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--skip-download".into(),
            "--print".into(),
            PRINT_TEMPLATE.into(),
            "--download-archive".into(),
            self.archive.display().to_string(),
        ];
        args.extend(self.throttle_args());
        args.extend(
            [
                "--match-filter",
                "availability = 'public'",
                "--extractor-args",
                "youtube:formats=missing_pot",
                "--quiet",
                "--no-warnings",
            ]
            .map(String::from),
        );
        if let Some(until) = target.until {
            args.push("--datebefore".into());
            args.push(format_date(until));
        }
        if target.section == SectionKind::Video {
            args.push("--no-playlist".into());
        } else if policy == ScanPolicy::EarlyExit {
            // Only shortens the listing; adjudication re-checks every date locally.
            args.push("--break-match-filters".into());
            args.push(format!("upload_date >= {}", format_date(target.cutoff)));
        }
        args.push(target.url.clone());
        args
    }

    pub fn fetch_args(
        &self,
        mission: &Mission,
        language: Language,
        dir: &Path,
        stem: &str,
    ) -> Vec<String> {
        let mut args: Vec<String> = vec![
            "--write-auto-subs".into(),
            "--sub-langs".into(),
            language.code().into(),
            "--sub-format".into(),
            "vtt".into(),
            "--skip-download".into(),
            "--no-overwrites".into(),
        ];
        args.extend(self.throttle_args());
        args.extend([
            "--sleep-subtitles".into(),
            self.cfg.sleep_subtitles.to_string(),
            "--extractor-args".into(),
            "youtube:formats=missing_pot".into(),
            "--quiet".into(),
            "--no-warnings".into(),
            "--paths".into(),
            dir.display().to_string(),
            "-o".into(),
            format!("{stem}.%(ext)s"),
            mission.watch_url(),
        ]);
        args
    }

    async fn run(&self, args: &[String]) -> Result<String> {
        let program = &self.cfg.program;
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = tokio::time::timeout(Duration::from_secs(self.cfg.timeout_secs), child)
            .await
            .map_err(|_| anyhow!("{program} timed out after {}s", self.cfg.timeout_secs))?
            .with_context(|| format!("spawning {program}"))?;

        let code = output.status.code();
        if !output.status.success() && code != Some(BREAK_FILTER_EXIT) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{program} exited with {:?}: {}", code, stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl Downloader for YtDlp {
    async fn list(&self, target: &Target, policy: ScanPolicy) -> Result<Vec<CandidateItem>> {
        let stdout = self
            .run(&self.listing_args(target, policy))
            .await
            .with_context(|| format!("listing {}", target.url))?;
        let items = parse_listing(&stdout);
        info!(target: "ytdlp", url = %target.url, items = items.len(), "listing parsed");
        Ok(items)
    }

    async fn fetch_subtitle(
        &self,
        mission: &Mission,
        language: Language,
        dir: &Path,
        stem: &str,
    ) -> Result<Option<PathBuf>> {
        let ran = self
            .run(&self.fetch_args(mission, language, dir, stem))
            .await;
        // yt-dlp can exit non-zero after writing the track; trust the file system.
        if let Some(raw) = find_raw_subtitle(dir, stem)? {
            return Ok(Some(raw));
        }
        ran.map(|_| None)
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Parse `--print` output. Lines without the tab layout are skipped.
pub fn parse_listing(stdout: &str) -> Vec<CandidateItem> {
    let mut out = Vec::new();
    for line in stdout.lines() {
        let mut parts = line.splitn(3, '\t');
        let (Some(id), Some(date)) = (parts.next(), parts.next()) else {
            if !line.trim().is_empty() {
                debug!(target: "ytdlp", line, "unrecognized listing line");
            }
            continue;
        };
        let id = id.trim();
        if id.is_empty() || id.contains(char::is_whitespace) {
            debug!(target: "ytdlp", line, "listing line without id");
            continue;
        }
        let title = parts.next().unwrap_or_default().trim();
        out.push(CandidateItem::new(id, title, parse_date(date).ok()));
    }
    out
}

/// The raw track yt-dlp wrote for `stem` (`<stem>.<lang>.vtt`), never the artifact.
pub fn find_raw_subtitle(dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
    let entries = match fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("listing {}", dir.display())),
    };
    let mut found: Vec<PathBuf> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| {
            let name = p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            name.starts_with(stem) && name.ends_with(".vtt") && !name.ends_with(ARTIFACT_SUFFIX)
        })
        .collect();
    found.sort();
    Ok(found.into_iter().next())
}
