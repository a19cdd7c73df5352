// src/report.rs
//! Final tally over mission outcomes, plus the CSV reports written beside a run.

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::model::{format_date, Outcome, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureLine {
    pub id: String,
    pub title: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub total: usize,
    pub extracted: usize,
    pub already_present: usize,
    pub failed: usize,
    pub failures: Vec<FailureLine>,
}

impl Report {
    /// Pure aggregation; no I/O.
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let mut r = Report {
            total: outcomes.len(),
            ..Default::default()
        };
        for o in outcomes {
            match o.status {
                Status::Extracted => r.extracted += 1,
                Status::AlreadyPresent => r.already_present += 1,
                Status::Failed => {
                    r.failed += 1;
                    r.failures.push(FailureLine {
                        id: o.mission.id.clone(),
                        title: o.mission.title.clone(),
                        reason: o.reason.clone().unwrap_or_else(|| "unknown".to_string()),
                    });
                }
            }
        }
        r
    }

    pub fn succeeded(&self) -> usize {
        self.extracted + self.already_present
    }

    pub fn render(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "Missions processed: {}", self.total);
        let _ = writeln!(
            s,
            "Succeeded: {} ({} extracted, {} already present)",
            self.succeeded(),
            self.extracted,
            self.already_present
        );
        let _ = writeln!(s, "Failed: {}", self.failed);
        if !self.failures.is_empty() {
            let _ = writeln!(s, "\nFailures:");
            for f in &self.failures {
                let _ = writeln!(s, "  - {} | {}\n    reason: {}", f.id, f.title, f.reason);
            }
        }
        s
    }
}

pub const CSV_HEADER: [&str; 8] = [
    "Channel",
    "Video ID",
    "Upload Date",
    "Title",
    "Status",
    "Language",
    "Final Filename",
    "Error",
];

pub fn write_csv<'a, I>(path: &Path, outcomes: I) -> Result<()>
where
    I: IntoIterator<Item = &'a Outcome>,
{
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("creating report {}", path.display()))?;
    w.write_record(CSV_HEADER)?;
    for o in outcomes {
        let file_name = o
            .artifact
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "N/A".to_string());
        let upload_date = format_date(o.mission.upload_date);
        w.write_record([
            o.mission.channel.as_str(),
            o.mission.id.as_str(),
            upload_date.as_str(),
            o.mission.title.as_str(),
            o.status.label(),
            o.mission.language.code(),
            file_name.as_str(),
            o.reason.as_deref().unwrap_or(""),
        ])?;
    }
    w.flush()
        .with_context(|| format!("flushing report {}", path.display()))?;
    Ok(())
}

/// `mission_report_<ts>.csv` for every outcome, and
/// `failed_missions_<ts>.csv` when anything failed. Returns the written paths.
pub fn write_reports(dir: &Path, outcomes: &[Outcome], now: DateTime<Local>) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    if outcomes.is_empty() {
        return Ok(written);
    }
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    let ts = now.format("%Y%m%d_%H%M%S");

    let full = dir.join(format!("mission_report_{ts}.csv"));
    write_csv(&full, outcomes)?;
    written.push(full);

    if outcomes.iter().any(|o| !o.status.is_success()) {
        let failed = dir.join(format!("failed_missions_{ts}.csv"));
        write_csv(&failed, outcomes.iter().filter(|o| !o.status.is_success()))?;
        written.push(failed);
    }
    Ok(written)
}
