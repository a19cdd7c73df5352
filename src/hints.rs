// src/hints.rs
//! Bulk language hints from the advisory LLM, for titles the deterministic
//! classifier could not decide. Replies are parsed strictly; anything that
//! is not an `id,es|en` row is ignored.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::llm::LlmClient;
use crate::model::{Language, Mission};

/// Column separator for the prompt payload; titles routinely contain commas.
pub const SEPARATOR: &str = "|||";

pub fn build_prompt(missions: &[&Mission]) -> String {
    let payload: Vec<String> = missions
        .iter()
        .map(|m| format!("{}{SEPARATOR}{}", m.id, m.title.replace(['\n', '\r'], " ")))
        .collect();
    format!(
        "Analyze the following list of videos in the format 'video_id{SEPARATOR}title'.\n\
         For each line, detect whether the title is Spanish ('es') or English ('en').\n\
         Reply only with CSV rows 'video_id,language', no header.\n\
         Your reply must have exactly {} lines.\n\nVIDEOS:\n{}",
        payload.len(),
        payload.join("\n")
    )
}

/// Parse `id,lang` rows. Rows with other languages or shapes are dropped.
pub fn parse_hints(reply: &str) -> HashMap<String, Language> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reply.as_bytes());

    let mut out = HashMap::new();
    for rec in rdr.records().flatten() {
        if rec.len() != 2 {
            continue;
        }
        let (Some(id), Some(lang)) = (rec.get(0), rec.get(1)) else {
            continue;
        };
        let id = id.trim_matches('`');
        if let (false, Some(lang)) = (id.is_empty(), Language::from_code(lang)) {
            out.insert(id.to_string(), lang);
        }
    }
    out
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedHint {
    language: Language,
}

/// Title-keyed hint cache, one JSON file per title.
#[derive(Debug, Clone)]
pub struct HintCache {
    dir: PathBuf,
}

impl HintCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let _ = fs::create_dir_all(&dir); // best-effort
        Self { dir }
    }

    fn path_for(&self, title: &str) -> PathBuf {
        self.dir.join(format!("{}.json", cache_key(title)))
    }

    pub fn get(&self, title: &str) -> Option<Language> {
        let s = fs::read_to_string(self.path_for(title)).ok()?;
        serde_json::from_str::<CachedHint>(&s).ok().map(|c| c.language)
    }

    pub fn put(&self, title: &str, language: Language) -> io::Result<()> {
        let path = self.path_for(title);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string(&CachedHint { language })
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        let mut f = fs::File::create(&tmp)?;
        f.write_all(json.as_bytes())?;
        fs::rename(tmp, path)?;
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn cache_key(title: &str) -> String {
    let digest = Sha256::digest(title.trim().as_bytes());
    let mut out = String::with_capacity(16);
    for b in digest.iter().take(8) {
        use std::fmt::Write as _;
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Hints for `pending` missions: cache first, then one bulk LLM call for the rest.
pub async fn collect_hints(
    client: &dyn LlmClient,
    cache: Option<&HintCache>,
    pending: &[&Mission],
) -> HashMap<String, Language> {
    let mut hints = HashMap::new();
    let mut ask = Vec::new();
    for m in pending {
        match cache.and_then(|c| c.get(&m.title)) {
            Some(lang) => {
                hints.insert(m.id.clone(), lang);
            }
            None => ask.push(*m),
        }
    }
    if ask.is_empty() {
        return hints;
    }

    info!(target: "hints", provider = client.provider_name(), titles = ask.len(), "requesting language hints");
    let Some(reply) = client.complete(&build_prompt(&ask)).await else {
        warn!(target: "hints", "no hint reply; default language applies");
        return hints;
    };

    let parsed = parse_hints(&reply);
    let mut missing = 0usize;
    for m in &ask {
        match parsed.get(&m.id) {
            Some(lang) => {
                if let Some(c) = cache {
                    if let Err(e) = c.put(&m.title, *lang) {
                        warn!(target: "hints", error = %e, "hint cache write failed");
                    }
                }
                hints.insert(m.id.clone(), *lang);
            }
            None => missing += 1,
        }
    }
    if missing > 0 {
        warn!(target: "hints", missing, "reply had no usable row for some titles");
    }
    hints
}
