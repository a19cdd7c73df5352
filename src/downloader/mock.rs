// src/downloader/mock.rs
//! In-memory downloader for tests and dry runs: canned listings per target
//! URL and canned subtitle bodies per (id, language).

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::Downloader;
use crate::adjudicate::ScanPolicy;
use crate::model::{CandidateItem, Language, Mission, Target};

#[derive(Default)]
pub struct MockDownloader {
    listings: HashMap<String, Vec<CandidateItem>>,
    subtitles: HashMap<(String, Language), String>,
    broken: HashSet<String>,
    /// Every `list` call, by target URL.
    pub list_calls: Mutex<Vec<String>>,
    /// Every `fetch_subtitle` call, by (id, language).
    pub fetch_calls: Mutex<Vec<(String, Language)>>,
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(mut self, url: &str, items: Vec<CandidateItem>) -> Self {
        self.listings.insert(url.to_string(), items);
        self
    }

    pub fn with_subtitle(mut self, id: &str, language: Language, body: &str) -> Self {
        self.subtitles
            .insert((id.to_string(), language), body.to_string());
        self
    }

    /// Every fetch for `id` fails with a tool error.
    pub fn with_fetch_error(mut self, id: &str) -> Self {
        self.broken.insert(id.to_string());
        self
    }

    pub fn fetches(&self) -> Vec<(String, Language)> {
        self.fetch_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn list(&self, target: &Target, _policy: ScanPolicy) -> Result<Vec<CandidateItem>> {
        self.list_calls.lock().unwrap().push(target.url.clone());
        self.listings
            .get(&target.url)
            .cloned()
            .ok_or_else(|| anyhow!("listing unavailable for {}", target.url))
    }

    async fn fetch_subtitle(
        &self,
        mission: &Mission,
        language: Language,
        dir: &Path,
        stem: &str,
    ) -> Result<Option<PathBuf>> {
        self.fetch_calls
            .lock()
            .unwrap()
            .push((mission.id.clone(), language));
        if self.broken.contains(&mission.id) {
            return Err(anyhow!("mock fetch error for {}", mission.id));
        }
        let Some(body) = self.subtitles.get(&(mission.id.clone(), language)) else {
            return Ok(None);
        };
        std::fs::create_dir_all(dir)?;
        let raw = dir.join(format!("{stem}.{}.vtt", language.code()));
        std::fs::write(&raw, body)?;
        Ok(Some(raw))
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
