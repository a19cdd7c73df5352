// src/config/mission.rs
//! Mission configuration: one explicit structure built at startup and passed
//! down to every pipeline stage.

use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::adjudicate::ScanPolicy;
use crate::config::llm::LlmConfig;
use crate::manifest::MAX_PLAYLISTS_PER_CHANNEL;
use crate::model::{Language, SectionKind};

pub const ENV_MISSION_CONFIG_PATH: &str = "MISSION_CONFIG_PATH";
pub const DEFAULT_MISSION_CONFIG_PATH: &str = "config/mission.toml";

fn default_output_dir() -> PathBuf {
    PathBuf::from("subtitles")
}
fn default_archive_file() -> PathBuf {
    PathBuf::from("ytdl-archive.txt")
}
fn default_channel_list() -> PathBuf {
    PathBuf::from("youtube_channel_list.csv")
}
fn default_report_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_sections() -> Vec<SectionKind> {
    vec![SectionKind::Videos, SectionKind::Streams]
}

/// yt-dlp invocation parameters (rate limiting, retries, timeouts).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloaderConfig {
    pub program: String,
    pub timeout_secs: u64,
    pub retries: u32,
    pub sleep_interval: u32,
    pub max_sleep_interval: u32,
    pub sleep_requests: u32,
    pub sleep_subtitles: u32,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            program: "yt-dlp".to_string(),
            timeout_secs: 300,
            retries: 3,
            sleep_interval: 5,
            max_sleep_interval: 13,
            sleep_requests: 3,
            sleep_subtitles: 21,
        }
    }
}

/// Delay between subtitle fetches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub delay_secs: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { delay_secs: 21 }
    }
}

/// One channel entry of the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelSpec {
    pub name: String,
    /// Channel handle URL, e.g. `https://www.youtube.com/@handle`.
    pub url: String,
    #[serde(with = "crate::model::ymd")]
    pub cutoff: NaiveDate,
    #[serde(default, with = "crate::model::ymd::option")]
    pub until: Option<NaiveDate>,
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionKind>,
    #[serde(default)]
    pub playlists: Vec<String>,
}

impl ChannelSpec {
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            bail!("channel with url {:?} has no name", self.url);
        }
        if self.url.trim().is_empty() {
            bail!("channel {:?} has no url", self.name);
        }
        if self.playlists.len() > MAX_PLAYLISTS_PER_CHANNEL {
            bail!(
                "channel {:?} lists {} playlists (max {MAX_PLAYLISTS_PER_CHANNEL})",
                self.name,
                self.playlists.len()
            );
        }
        if self.sections.contains(&SectionKind::Playlist) {
            bail!(
                "channel {:?}: playlists go under `playlists`, not `sections`",
                self.name
            );
        }
        if self.sections.contains(&SectionKind::Video) {
            bail!(
                "channel {:?}: single videos come from a URL list, not `sections`",
                self.name
            );
        }
        if let Some(until) = self.until {
            if until < self.cutoff {
                bail!(
                    "channel {:?}: until {} is before cutoff {}",
                    self.name,
                    until,
                    self.cutoff
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionConfig {
    /// Directory holding cleaned artifacts (and transient raw downloads).
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// yt-dlp `--download-archive` file.
    #[serde(default = "default_archive_file")]
    pub archive_file: PathBuf,
    /// CSV read by the interactive manifest when `channels` is empty.
    #[serde(default = "default_channel_list")]
    pub channel_list: PathBuf,
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    /// Used when neither the title nor an LLM hint settles the language.
    #[serde(default)]
    pub default_language: Language,
    #[serde(default)]
    pub scan_policy: ScanPolicy,
    #[serde(default)]
    pub downloader: DownloaderConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub channels: Vec<ChannelSpec>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            archive_file: default_archive_file(),
            channel_list: default_channel_list(),
            report_dir: default_report_dir(),
            default_language: Language::default(),
            scan_policy: ScanPolicy::default(),
            downloader: DownloaderConfig::default(),
            pacing: PacingConfig::default(),
            llm: LlmConfig::default(),
            channels: Vec::new(),
        }
    }
}

impl MissionConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: MissionConfig = toml::from_str(s).context("parsing mission config")?;
        cfg.sanitize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading mission config from {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("in {}", path.display()))
    }

    /// Resolve the config path:
    /// 1) explicit path (`--config`)
    /// 2) $MISSION_CONFIG_PATH
    /// 3) config/mission.toml
    ///
    /// Falls back to defaults (interactive manifest) when none exists.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::load_from(p);
        }
        if let Ok(p) = std::env::var(ENV_MISSION_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!(
                "{ENV_MISSION_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
        let default_p = PathBuf::from(DEFAULT_MISSION_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default())
    }

    fn sanitize(&mut self) {
        let d = &mut self.downloader;
        d.program = d.program.trim().to_string();
        if d.program.is_empty() {
            d.program = DownloaderConfig::default().program;
        }
        if d.timeout_secs == 0 {
            d.timeout_secs = DownloaderConfig::default().timeout_secs;
        }
        if d.retries == 0 {
            d.retries = 1;
        }
        if d.max_sleep_interval < d.sleep_interval {
            std::mem::swap(&mut d.max_sleep_interval, &mut d.sleep_interval);
        }
        self.llm.sanitize();
    }

    pub fn validate(&self) -> Result<()> {
        for ch in &self.channels {
            ch.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let cfg = MissionConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, MissionConfig::default());
        assert_eq!(cfg.downloader.program, "yt-dlp");
        assert_eq!(cfg.pacing.delay_secs, 21);
    }

    #[test]
    fn inverted_sleep_window_is_swapped() {
        let cfg = MissionConfig::from_toml_str(
            r#"
[downloader]
sleep_interval = 20
max_sleep_interval = 4
retries = 0
"#,
        )
        .unwrap();
        assert_eq!(cfg.downloader.sleep_interval, 4);
        assert_eq!(cfg.downloader.max_sleep_interval, 20);
        assert_eq!(cfg.downloader.retries, 1);
    }

    #[test]
    fn until_before_cutoff_is_rejected() {
        let err = MissionConfig::from_toml_str(
            r#"
[[channels]]
name = "Canal"
url = "https://www.youtube.com/@canal"
cutoff = "20250601"
until = "20250501"
"#,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("before cutoff"));
    }
}
