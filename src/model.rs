// src/model.rs
//! Records that flow through the mission pipeline:
//! `Target` → `CandidateItem` → `Mission` → `Outcome`.

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Upload dates travel as `YYYYMMDD`, the same shape yt-dlp prints.
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Parse a strict `YYYYMMDD` calendar date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let t = raw.trim();
    if t.len() != 8 || !t.bytes().all(|b| b.is_ascii_digit()) {
        bail!("expected a YYYYMMDD date, got {t:?}");
    }
    NaiveDate::parse_from_str(t, DATE_FORMAT)
        .with_context(|| format!("{t:?} is not a valid calendar date"))
}

pub fn format_date(d: NaiveDate) -> String {
    d.format(DATE_FORMAT).to_string()
}

/// Serde adapter for `YYYYMMDD` dates in config files.
pub mod ymd {
    use chrono::NaiveDate;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&super::format_date(*d))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(d)?;
        super::parse_date(&raw).map_err(|e| D::Error::custom(format!("{e:#}")))
    }

    pub mod option {
        use chrono::NaiveDate;
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(d: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
            match d {
                Some(d) => s.serialize_some(&crate::model::format_date(*d)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
            let raw: Option<String> = Option::deserialize(d)?;
            raw.map(|r| crate::model::parse_date(&r).map_err(|e| D::Error::custom(format!("{e:#}"))))
                .transpose()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    Videos,
    Streams,
    Playlist,
    /// A single watch URL from a URL list.
    Video,
}

impl SectionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionKind::Videos => "videos",
            SectionKind::Streams => "streams",
            SectionKind::Playlist => "playlist",
            SectionKind::Video => "video",
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One channel section (or playlist) to scan, with its date window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub channel: String,
    pub url: String,
    pub section: SectionKind,
    pub cutoff: NaiveDate,
    /// Optional upper bound (inclusive); newer uploads are skipped.
    pub until: Option<NaiveDate>,
}

impl Target {
    /// `cutoff <= date` and, when set, `date <= until`.
    pub fn admits(&self, date: NaiveDate) -> bool {
        date >= self.cutoff && self.until.map_or(true, |u| date <= u)
    }
}

/// A listed upload before cutoff filtering. `published` is `None` when the
/// listing reported no usable date (e.g. `NA` for upcoming streams).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateItem {
    pub id: String,
    pub title: String,
    pub published: Option<NaiveDate>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, title: impl Into<String>, published: Option<NaiveDate>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            published,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Es,
    En,
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Es => "es",
            Language::En => "en",
        }
    }

    /// The fallback language tried when a fetch in `self` fails.
    pub fn other(self) -> Self {
        match self {
            Language::Es => Language::En,
            Language::En => Language::Es,
        }
    }

    pub fn from_code(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "es" => Some(Language::Es),
            "en" => Some(Language::En),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A candidate that passed adjudication, queued for extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mission {
    pub id: String,
    pub title: String,
    pub upload_date: NaiveDate,
    pub channel: String,
    pub language: Language,
}

impl Mission {
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Extracted,
    AlreadyPresent,
    Failed,
}

impl Status {
    pub fn is_success(self) -> bool {
        !matches!(self, Status::Failed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Extracted => "success",
            Status::AlreadyPresent => "success (existing)",
            Status::Failed => "failure",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub mission: Mission,
    pub status: Status,
    pub reason: Option<String>,
    pub artifact: Option<PathBuf>,
}

impl Outcome {
    pub fn extracted(mission: Mission, artifact: PathBuf) -> Self {
        Self {
            mission,
            status: Status::Extracted,
            reason: None,
            artifact: Some(artifact),
        }
    }

    pub fn already_present(mission: Mission, artifact: PathBuf) -> Self {
        Self {
            mission,
            status: Status::AlreadyPresent,
            reason: None,
            artifact: Some(artifact),
        }
    }

    pub fn failed(mission: Mission, reason: impl Into<String>) -> Self {
        Self {
            mission,
            status: Status::Failed,
            reason: Some(reason.into()),
            artifact: None,
        }
    }
}
