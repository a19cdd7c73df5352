// src/downloader/mod.rs
pub mod mock;
pub mod ytdlp;

use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::adjudicate::ScanPolicy;
use crate::model::{CandidateItem, Language, Mission, Target};

/// External media downloader seam.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// List a target's uploads, most recent first as the upstream returns them.
    async fn list(&self, target: &Target, policy: ScanPolicy) -> Result<Vec<CandidateItem>>;

    /// Fetch one subtitle track into `dir`, named from `stem`.
    /// `Ok(None)` means the track does not exist in that language.
    async fn fetch_subtitle(
        &self,
        mission: &Mission,
        language: Language,
        dir: &Path,
        stem: &str,
    ) -> Result<Option<PathBuf>>;

    fn name(&self) -> &'static str;
}

pub use mock::MockDownloader;
pub use ytdlp::YtDlp;
