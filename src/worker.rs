// src/worker.rs
//! Extraction worker: one mission at a time, linear try/fallback/cleanup.
//!
//! 1. existing artifact → already present, nothing fetched
//! 2. fetch in the mission language, then once in the other one
//! 3. clean the raw track into the artifact, delete the raw file
//! 4. pause before handing control back (only if the downloader was used)

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::artifact::ArtifactStore;
use crate::downloader::Downloader;
use crate::model::{Language, Mission, Outcome};
use crate::subtitle::{clean_vtt, SubtitleError};

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("no subtitle available in {primary} or {fallback}")]
    Unavailable { primary: Language, fallback: Language },
    #[error("subtitle fetch failed ({language}): {reason}")]
    Fetch { language: Language, reason: String },
    #[error("subtitle transform failed for {}: {source}", .path.display())]
    Transform {
        path: PathBuf,
        #[source]
        source: SubtitleError,
    },
    #[error("raw subtitle {} is unreadable: {reason}", .path.display())]
    Unreadable { path: PathBuf, reason: String },
    #[error("artifact store: {0:#}")]
    Store(anyhow::Error),
}

pub struct ExtractionWorker<'a> {
    downloader: &'a dyn Downloader,
    store: &'a ArtifactStore,
    delay: Duration,
}

impl<'a> ExtractionWorker<'a> {
    pub fn new(downloader: &'a dyn Downloader, store: &'a ArtifactStore, delay: Duration) -> Self {
        Self {
            downloader,
            store,
            delay,
        }
    }

    pub async fn process(&self, mut mission: Mission) -> Outcome {
        match self.store.find_existing(&mission.id) {
            Ok(Some(existing)) => {
                info!(target: "worker", id = %mission.id, path = %existing.display(), "artifact exists; skipping");
                return Outcome::already_present(mission, existing);
            }
            Ok(None) => {}
            Err(e) => {
                let err = ExtractError::Store(e);
                warn!(target: "worker", id = %mission.id, error = %err, "existence check failed");
                return Outcome::failed(mission, err.to_string());
            }
        }

        let result = self.extract(&mut mission).await;

        if !self.delay.is_zero() {
            info!(target: "worker", secs = self.delay.as_secs(), "pausing before next fetch");
            tokio::time::sleep(self.delay).await;
        }

        match result {
            Ok(path) => {
                info!(target: "worker", id = %mission.id, lang = %mission.language, path = %path.display(), "subtitle extracted");
                Outcome::extracted(mission, path)
            }
            Err(e) => {
                warn!(target: "worker", id = %mission.id, error = %e, "mission failed");
                Outcome::failed(mission, e.to_string())
            }
        }
    }

    async fn extract(&self, mission: &mut Mission) -> Result<PathBuf, ExtractError> {
        let primary = mission.language;
        let mut fetch_error = None;
        for language in [primary, primary.other()] {
            let stem = ArtifactStore::stem_for(mission, language);
            match self
                .downloader
                .fetch_subtitle(mission, language, self.store.root(), &stem)
                .await
            {
                Ok(Some(raw)) => {
                    mission.language = language;
                    return self.transform(mission, &raw).await;
                }
                Ok(None) => {
                    info!(target: "worker", id = %mission.id, lang = %language, "no subtitle track");
                }
                Err(e) => {
                    let reason = format!("{e:#}");
                    warn!(target: "worker", id = %mission.id, lang = %language, error = %reason, "fetch failed");
                    fetch_error = Some(ExtractError::Fetch { language, reason });
                }
            }
        }
        // The last fetch error wins over plain unavailability.
        Err(fetch_error.unwrap_or(ExtractError::Unavailable {
            primary,
            fallback: primary.other(),
        }))
    }

    /// Raw file stays in place on any error here, for manual inspection.
    async fn transform(&self, mission: &Mission, raw: &Path) -> Result<PathBuf, ExtractError> {
        let bytes = tokio::fs::read(raw)
            .await
            .map_err(|e| ExtractError::Unreadable {
                path: raw.to_path_buf(),
                reason: e.to_string(),
            })?;
        let text = String::from_utf8(bytes).map_err(|e| ExtractError::Unreadable {
            path: raw.to_path_buf(),
            reason: e.to_string(),
        })?;
        let cleaned = clean_vtt(&text).map_err(|source| ExtractError::Transform {
            path: raw.to_path_buf(),
            source,
        })?;

        let artifact = self.store.artifact_path(mission, mission.language);
        self.store
            .write_atomic(&artifact, &cleaned)
            .map_err(ExtractError::Store)?;

        if let Err(e) = tokio::fs::remove_file(raw).await {
            warn!(target: "worker", path = %raw.display(), error = %e, "could not remove raw subtitle");
        }
        Ok(artifact)
    }
}
