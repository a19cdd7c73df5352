// src/adjudicate.rs
//! Target adjudication: turns a target's listed uploads into missions by
//! plain date comparison against the target's cutoff.
//!
//! Listings are expected most-recent-first. Under `ScanPolicy::EarlyExit`
//! the walk stops at the first upload older than the cutoff. Pinned items or
//! reshuffled playlists break that assumption, so `ScanPolicy::Exhaustive`
//! is available to look at every item.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::warn;

use crate::model::{CandidateItem, Language, Mission, Target};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanPolicy {
    #[default]
    EarlyExit,
    Exhaustive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Adjudication {
    pub missions: Vec<Mission>,
    /// First item older than the cutoff, when the scan stopped early.
    pub stopped_at: Option<CandidateItem>,
    /// Items older than the cutoff that were passed over (exhaustive scans only).
    pub too_old: usize,
    /// Items newer than the target's `until` bound.
    pub too_new: usize,
    /// Items without a usable upload date.
    pub undated: usize,
    /// Set when a scanned item was newer than the one listed before it.
    pub ordering_violation: bool,
}

/// Decide, per candidate, whether it becomes a mission.
///
/// `language` seeds every mission; the language resolver overrides it later.
pub fn adjudicate(
    target: &Target,
    items: &[CandidateItem],
    policy: ScanPolicy,
    language: Language,
) -> Adjudication {
    let mut out = Adjudication::default();
    let mut previous = None;

    for item in items {
        let Some(date) = item.published else {
            out.undated += 1;
            continue;
        };

        if previous.is_some_and(|p| date > p) {
            out.ordering_violation = true;
        }
        previous = Some(date);

        if date < target.cutoff {
            match policy {
                ScanPolicy::EarlyExit => {
                    out.stopped_at = Some(item.clone());
                    break;
                }
                ScanPolicy::Exhaustive => {
                    out.too_old += 1;
                    continue;
                }
            }
        }

        if !target.admits(date) {
            out.too_new += 1;
            continue;
        }

        out.missions.push(Mission {
            id: item.id.clone(),
            title: item.title.clone(),
            upload_date: date,
            channel: target.channel.clone(),
            language,
        });
    }

    if out.ordering_violation {
        warn!(
            target: "adjudicate",
            url = %target.url,
            policy = ?policy,
            "listing is not reverse-chronological; early exit may drop valid items"
        );
    }

    out
}

/// Flatten per-target results into one queue. An item listed by several
/// targets (a video that is also in a playlist) is queued once, first wins.
pub fn merge_unique<I>(adjudications: I) -> Vec<Mission>
where
    I: IntoIterator<Item = Adjudication>,
{
    let mut seen = HashSet::new();
    let mut queue = Vec::new();
    for adj in adjudications {
        for m in adj.missions {
            if seen.insert(m.id.clone()) {
                queue.push(m);
            }
        }
    }
    queue
}
