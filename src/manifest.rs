// src/manifest.rs
//! Manifest builder: the list of targets (channel sections and playlists,
//! each with its date window) that a mission scans.
//!
//! Built from the `[[channels]]` of a `MissionConfig`, interactively from a
//! channel list CSV, or from a list of watch URLs (bookmarks export or plain
//! text). All prompting goes through [`Prompter`].

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::config::mission::ChannelSpec;
use crate::model::{format_date, parse_date, SectionKind, Target};

pub const MAX_PLAYLISTS_PER_CHANNEL: usize = 3;

pub const COL_CHANNEL_NAME: &str = "Channel Name";
pub const COL_HANDLE_URL: &str = "Handle / URL";

/// Only URLs containing this are taken from a URL list.
pub const WATCH_MARKER: &str = "youtube.com/watch";

/// URL-list targets have no date window; every listed video is admitted.
pub const URL_LIST_CUTOFF: NaiveDate = NaiveDate::MIN;

static HREF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)href\s*=\s*["']([^"']+)["']"#).expect("href regex"));

/// Handle URL without trailing `;extra` fields or slashes.
pub fn base_url(handle: &str) -> &str {
    handle
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .trim_end_matches('/')
}

pub fn section_url(handle: &str, section: SectionKind) -> String {
    format!("{}/{}", base_url(handle), section.as_str())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub targets: Vec<Target>,
}

impl Manifest {
    pub fn from_channels(channels: &[ChannelSpec]) -> Result<Self> {
        let mut targets = Vec::new();
        for ch in channels {
            ch.validate()?;
            for &section in &ch.sections {
                targets.push(Target {
                    channel: ch.name.clone(),
                    url: section_url(&ch.url, section),
                    section,
                    cutoff: ch.cutoff,
                    until: ch.until,
                });
            }
            for pl in &ch.playlists {
                targets.push(Target {
                    channel: ch.name.clone(),
                    url: pl.trim().to_string(),
                    section: SectionKind::Playlist,
                    cutoff: ch.cutoff,
                    until: ch.until,
                });
            }
        }
        info!(target: "manifest", channels = channels.len(), targets = targets.len(), "manifest built");
        Ok(Self { targets })
    }

    /// One single-video target per URL, all attributed to `source`.
    /// Repeated URLs are kept once.
    pub fn from_urls(source: &str, urls: &[String]) -> Self {
        let mut targets: Vec<Target> = Vec::with_capacity(urls.len());
        for url in urls {
            let url = url.trim();
            if url.is_empty() || targets.iter().any(|t| t.url == url) {
                continue;
            }
            targets.push(Target {
                channel: source.to_string(),
                url: url.to_string(),
                section: SectionKind::Video,
                cutoff: URL_LIST_CUTOFF,
                until: None,
            });
        }
        info!(target: "manifest", source, urls = urls.len(), targets = targets.len(), "manifest built from URL list");
        Self { targets }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Watch URLs from a browser bookmarks export (`.json` or `.html`) or a
/// plain text file with one URL per line. Order is kept.
pub fn read_url_list(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading URL list {}", path.display()))?;
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    let urls = match ext.as_str() {
        "json" => {
            let root: Value = serde_json::from_str(&text)
                .with_context(|| format!("parsing bookmarks {}", path.display()))?;
            let mut out = Vec::new();
            collect_bookmark_urls(&root, &mut out);
            out
        }
        "html" | "htm" => HREF
            .captures_iter(&text)
            .map(|c| c[1].trim().to_string())
            .filter(|u| u.contains(WATCH_MARKER))
            .collect(),
        _ => text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && l.contains(WATCH_MARKER))
            .map(String::from)
            .collect(),
    };
    info!(target: "manifest", path = %path.display(), urls = urls.len(), "URL list read");
    Ok(urls)
}

/// Depth-first walk over a bookmarks tree: `{"type": "url", "url": ...}` nodes.
fn collect_bookmark_urls(node: &Value, out: &mut Vec<String>) {
    match node {
        Value::Object(map) => {
            if let (Some("url"), Some(url)) = (
                map.get("type").and_then(Value::as_str),
                map.get("url").and_then(Value::as_str),
            ) {
                if url.contains(WATCH_MARKER) {
                    out.push(url.to_string());
                }
            }
            for v in map.values() {
                collect_bookmark_urls(v, out);
            }
        }
        Value::Array(items) => items.iter().for_each(|v| collect_bookmark_urls(v, out)),
        _ => {}
    }
}

/// One row of the channel list CSV.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRow {
    pub name: String,
    pub url: String,
    pub playlists: Vec<String>,
}

/// Read `Channel Name`, `Handle / URL`, `Playlist URL 1..3` (quote char `'`).
/// Rows missing a name or URL are skipped.
pub fn read_channel_list(path: &Path) -> Result<Vec<ChannelRow>> {
    let mut rdr = ReaderBuilder::new()
        .quote(b'\'')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("opening channel list {}", path.display()))?;

    let headers = rdr.headers()?.clone();
    let col = |name: &str| headers.iter().position(|h| h == name);
    let (Some(name_ix), Some(url_ix)) = (col(COL_CHANNEL_NAME), col(COL_HANDLE_URL)) else {
        bail!(
            "channel list {} needs `{COL_CHANNEL_NAME}` and `{COL_HANDLE_URL}` columns",
            path.display()
        );
    };
    let playlist_ix: Vec<usize> = (1..=MAX_PLAYLISTS_PER_CHANNEL)
        .filter_map(|i| col(&format!("Playlist URL {i}")))
        .collect();

    let field = |rec: &StringRecord, ix: usize| rec.get(ix).unwrap_or_default().to_string();
    let mut rows = Vec::new();
    for (n, rec) in rdr.records().enumerate() {
        let rec = rec.with_context(|| format!("{} row {}", path.display(), n + 2))?;
        let name = field(&rec, name_ix);
        let url = field(&rec, url_ix);
        if name.is_empty() || url.is_empty() {
            continue;
        }
        let playlists = playlist_ix
            .iter()
            .map(|&ix| field(&rec, ix))
            .filter(|p| !p.is_empty())
            .collect();
        rows.push(ChannelRow {
            name,
            url,
            playlists,
        });
    }
    Ok(rows)
}

/// Input check for date prompts; the message is shown before asking again.
pub fn validate_date_input(input: &str) -> Result<(), String> {
    parse_date(input).map(|_| ()).map_err(|e| e.to_string())
}

/// Interactive questions asked while building a manifest.
pub trait Prompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool>;
    /// Must only return a valid date; malformed input is asked again.
    fn date(&mut self, prompt: &str, default: Option<NaiveDate>) -> Result<NaiveDate>;
}

/// `dialoguer` on the controlling terminal.
pub struct TerminalPrompter {
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl Prompter for TerminalPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool> {
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(default)
            .interact()?)
    }

    fn date(&mut self, prompt: &str, default: Option<NaiveDate>) -> Result<NaiveDate> {
        let mut input = Input::<String>::with_theme(&self.theme)
            .with_prompt(format!("{prompt} (YYYYMMDD)"))
            .validate_with(|s: &String| validate_date_input(s));
        if let Some(d) = default {
            input = input.default(format_date(d));
        }
        let raw = input.interact_text()?;
        parse_date(&raw)
    }
}

fn playlist_label(url: &str, index: usize) -> String {
    match url.split_once("list=") {
        Some((_, id)) if !id.is_empty() => id.split('&').next().unwrap_or(id).to_string(),
        _ => format!("Playlist {index}"),
    }
}

/// Walk the channel rows and ask which sections to scan and over which window.
/// `today` is the default `until` bound.
pub fn interactive_channels(
    rows: &[ChannelRow],
    prompter: &mut dyn Prompter,
    today: NaiveDate,
) -> Result<Vec<ChannelSpec>> {
    let mut out = Vec::new();
    for row in rows {
        if !prompter.confirm(&format!("Include channel {}?", row.name), false)? {
            continue;
        }
        let cutoff = prompter.date(&format!("Cutoff date for {}", row.name), None)?;
        let until = loop {
            let d = prompter.date(&format!("Until date for {}", row.name), Some(today))?;
            if d >= cutoff {
                break d;
            }
            warn!(target: "manifest", channel = %row.name, until = %d, %cutoff, "until is before cutoff; asking again");
        };

        let base = base_url(&row.url);
        let handle = base.rsplit('/').next().unwrap_or(base);
        let mut sections = Vec::new();
        for kind in [SectionKind::Videos, SectionKind::Streams] {
            if prompter.confirm(&format!("Scan /{handle}/{kind}?"), true)? {
                sections.push(kind);
            }
        }

        let mut playlists = Vec::new();
        for (i, pl) in row
            .playlists
            .iter()
            .take(MAX_PLAYLISTS_PER_CHANNEL)
            .enumerate()
        {
            let label = playlist_label(pl, i + 1);
            if prompter.confirm(&format!("Scan playlist '{label}'?"), true)? {
                playlists.push(pl.clone());
            }
        }

        if sections.is_empty() && playlists.is_empty() {
            info!(target: "manifest", channel = %row.name, "nothing selected; channel dropped");
            continue;
        }
        out.push(ChannelSpec {
            name: row.name.clone(),
            url: row.url.clone(),
            cutoff,
            until: Some(until),
            sections,
            playlists,
        });
    }
    Ok(out)
}
