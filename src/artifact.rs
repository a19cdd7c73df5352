// src/artifact.rs
//! Cleaned subtitle artifacts on disk.
//!
//! Naming: `[<id>].(<YYYYMMDD>).<sanitized title>.<lang>.cleaned.vtt`.
//! The presence of any file carrying `[<id>]` with the artifact suffix is the
//! only de-duplication signal; content is never re-validated.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::model::{format_date, Language, Mission};

pub const ARTIFACT_SUFFIX: &str = ".cleaned.vtt";
pub const QUARANTINE_DIR: &str = "deduplicated_vtt_quarantine";
const TITLE_MAX_CHARS: usize = 100;
/// Keeps the full artifact name well under the usual 255-byte limit.
const TITLE_MAX_BYTES: usize = 150;

static RE_UNSAFE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*%\p{Cc}]"#).expect("unsafe-char regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static RE_VIDEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([A-Za-z0-9_-]{11})\]").expect("video id regex"));

/// File-system safe title fragment. `%` is replaced too, since yt-dlp treats
/// it as an output-template marker. Capped at 100 chars and 150 UTF-8 bytes,
/// cut on a char boundary.
pub fn sanitize_title(title: &str) -> String {
    let s = RE_UNSAFE.replace_all(title, "_");
    let s = RE_WS.replace_all(&s, "_");
    let mut out = String::new();
    for c in s.trim_matches('_').chars().take(TITLE_MAX_CHARS) {
        if out.len() + c.len_utf8() > TITLE_MAX_BYTES {
            break;
        }
        out.push(c);
    }
    let s = out.trim_end_matches('_');
    if s.is_empty() {
        "no_title".to_string()
    } else {
        s.to_string()
    }
}

/// Extract the 11-character video id from an artifact name.
pub fn video_id_from_name(name: &str) -> Option<&str> {
    RE_VIDEO_ID
        .captures(name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("creating output dir {}", self.root.display()))
    }

    /// `[id].(date).title.lang`, shared by the raw download and the artifact.
    pub fn stem_for(mission: &Mission, language: Language) -> String {
        format!(
            "[{}].({}).{}.{}",
            mission.id,
            format_date(mission.upload_date),
            sanitize_title(&mission.title),
            language.code()
        )
    }

    pub fn artifact_path(&self, mission: &Mission, language: Language) -> PathBuf {
        self.root
            .join(format!("{}{ARTIFACT_SUFFIX}", Self::stem_for(mission, language)))
    }

    /// Any existing artifact for `id`, regardless of title or language.
    pub fn find_existing(&self, id: &str) -> Result<Option<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("listing {}", self.root.display()))
            }
        };
        let marker = format!("[{id}]");
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.contains(&marker) && name.ends_with(ARTIFACT_SUFFIX) {
                return Ok(Some(entry.path()));
            }
        }
        Ok(None)
    }

    /// Write via a temp file and rename so a crash never leaves a partial artifact.
    pub fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let tmp = path.with_extension("vtt.tmp");
        let mut f =
            fs::File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(content.as_bytes())
            .with_context(|| format!("writing {}", tmp.display()))?;
        f.sync_all().ok();
        fs::rename(&tmp, path).with_context(|| format!("renaming into {}", path.display()))?;
        Ok(())
    }

    /// Every `.vtt` file under the root, sorted, excluding the quarantine dir.
    fn vtt_files(&self) -> Vec<PathBuf> {
        let mut files = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.file_name() != QUARANTINE_DIR);
        for entry in walker {
            match entry {
                Ok(e) if e.file_type().is_file() => {
                    if e.path().extension().and_then(|s| s.to_str()) == Some("vtt") {
                        files.push(e.path().to_path_buf());
                    }
                }
                Ok(_) => {}
                Err(e) => warn!(target: "artifact", error = %e, "skipping unreadable entry"),
            }
        }
        files.sort();
        files
    }

    /// Rewrite the downloader archive (`youtube <id>` per line) from the
    /// artifacts on disk. Returns the number of ids written.
    pub fn rebuild_archive(&self, archive: &Path) -> Result<usize> {
        let mut ids = BTreeSet::new();
        for path in self.vtt_files() {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
            match name.as_deref().and_then(video_id_from_name) {
                Some(id) => {
                    ids.insert(id.to_string());
                }
                None => warn!(target: "artifact", path = %path.display(), "no video id in name"),
            }
        }

        let mut content = String::new();
        for id in &ids {
            content.push_str("youtube ");
            content.push_str(id);
            content.push('\n');
        }
        fs::write(archive, content)
            .with_context(|| format!("writing archive {}", archive.display()))?;
        info!(target: "artifact", archive = %archive.display(), entries = ids.len(), "archive rebuilt");
        Ok(ids.len())
    }

    /// Move byte-identical `.vtt` files (all but the first, in path order)
    /// into the quarantine directory. `dry_run` only reports.
    pub fn dedupe(&self, dry_run: bool) -> Result<DedupeReport> {
        let mut by_hash: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        for path in self.vtt_files() {
            match hash_file(&path) {
                Ok(h) => by_hash.entry(h).or_default().push(path),
                Err(e) => warn!(target: "artifact", error = ?e, path = %path.display(), "hash failed"),
            }
        }

        let quarantine = self.root.join(QUARANTINE_DIR);
        let mut report = DedupeReport {
            dry_run,
            ..Default::default()
        };
        for (_hash, paths) in by_hash {
            if paths.len() < 2 {
                continue;
            }
            report.duplicate_groups += 1;
            if !dry_run {
                fs::create_dir_all(&quarantine)
                    .with_context(|| format!("creating {}", quarantine.display()))?;
            }
            for path in paths.into_iter().skip(1) {
                let dest = free_destination(&quarantine, &path, dry_run);
                if !dry_run {
                    fs::rename(&path, &dest).with_context(|| {
                        format!("moving {} to {}", path.display(), dest.display())
                    })?;
                }
                report.moved.push((path, dest));
            }
        }
        Ok(report)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupeReport {
    pub dry_run: bool,
    pub duplicate_groups: usize,
    /// (original, quarantine destination)
    pub moved: Vec<(PathBuf, PathBuf)>,
}

fn hash_file(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let digest = Sha256::digest(&bytes);
    let mut out = String::with_capacity(64);
    for b in digest.iter() {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    Ok(out)
}

/// `name.vtt`, then `name_1.vtt`, `name_2.vtt`, ... until unused.
fn free_destination(dir: &Path, src: &Path, dry_run: bool) -> PathBuf {
    let file_name = src
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let candidate = dir.join(&file_name);
    if dry_run || !candidate.exists() {
        return candidate;
    }
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((s, e)) => (s.to_string(), format!(".{e}")),
        None => (file_name.clone(), String::new()),
    };
    (1..)
        .map(|n| dir.join(format!("{stem}_{n}{ext}")))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}
