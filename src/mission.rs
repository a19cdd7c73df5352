// src/mission.rs
//! Mission control: drives manifest → adjudication → language → extraction
//! strictly in sequence and returns one outcome per queued mission.

use anyhow::Result;
use std::time::Duration;
use tracing::{info, warn};

use crate::adjudicate::{adjudicate, merge_unique};
use crate::artifact::ArtifactStore;
use crate::config::mission::MissionConfig;
use crate::downloader::Downloader;
use crate::hints::{collect_hints, HintCache};
use crate::language::{classify_title, resolve_language};
use crate::llm::DynLlmClient;
use crate::manifest::Manifest;
use crate::model::{Mission, Outcome};
use crate::worker::ExtractionWorker;

pub struct MissionControl {
    config: MissionConfig,
    downloader: Box<dyn Downloader>,
    llm: DynLlmClient,
    hint_cache: Option<HintCache>,
}

impl MissionControl {
    /// The hint cache comes from `[llm].cache_dir` when hints are enabled.
    pub fn new(config: MissionConfig, downloader: Box<dyn Downloader>, llm: DynLlmClient) -> Self {
        let hint_cache = (config.llm.enabled && !config.llm.cache_dir.is_empty())
            .then(|| HintCache::new(&config.llm.cache_dir));
        Self {
            config,
            downloader,
            llm,
            hint_cache,
        }
    }

    pub fn with_hint_cache(mut self, cache: Option<HintCache>) -> Self {
        self.hint_cache = cache;
        self
    }

    pub fn config(&self) -> &MissionConfig {
        &self.config
    }

    /// List and adjudicate every target. A target whose listing fails is
    /// logged and skipped; the others still run.
    pub async fn adjudicate_all(&self, manifest: &Manifest) -> Vec<Mission> {
        let mut results = Vec::with_capacity(manifest.targets.len());
        for target in &manifest.targets {
            let items = match self.downloader.list(target, self.config.scan_policy).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(target: "mission", url = %target.url, error = %format!("{e:#}"), "listing failed; target skipped");
                    continue;
                }
            };
            let adj = adjudicate(
                target,
                &items,
                self.config.scan_policy,
                self.config.default_language,
            );
            info!(
                target: "mission",
                channel = %target.channel,
                section = %target.section,
                listed = items.len(),
                queued = adj.missions.len(),
                undated = adj.undated,
                stopped_at = ?adj.stopped_at.as_ref().map(|i| i.id.as_str()),
                "target adjudicated"
            );
            results.push(adj);
        }
        merge_unique(results)
    }

    /// Title classifier first; only inconclusive titles are sent for hints.
    pub async fn resolve_languages(&self, missions: &mut [Mission]) {
        let default = self.config.default_language;
        let pending: Vec<&Mission> = missions
            .iter()
            .filter(|m| classify_title(&m.title).is_none())
            .collect();
        let hints = if pending.is_empty() {
            Default::default()
        } else {
            collect_hints(self.llm.as_ref(), self.hint_cache.as_ref(), &pending).await
        };
        for m in missions.iter_mut() {
            m.language = resolve_language(&m.title, hints.get(&m.id).copied(), default);
        }
    }

    pub async fn run(&self, manifest: &Manifest) -> Result<Vec<Outcome>> {
        let mut missions = self.adjudicate_all(manifest).await;
        info!(target: "mission", missions = missions.len(), downloader = self.downloader.name(), "missions queued");
        if missions.is_empty() {
            return Ok(Vec::new());
        }
        self.resolve_languages(&mut missions).await;

        let store = ArtifactStore::new(&self.config.output_dir);
        store.ensure_dir()?;
        let worker = ExtractionWorker::new(
            self.downloader.as_ref(),
            &store,
            Duration::from_secs(self.config.pacing.delay_secs),
        );

        let total = missions.len();
        let mut outcomes = Vec::with_capacity(total);
        for (i, mission) in missions.into_iter().enumerate() {
            info!(target: "mission", n = i + 1, total, id = %mission.id, title = %mission.title, "processing mission");
            outcomes.push(worker.process(mission).await);
        }
        Ok(outcomes)
    }
}
