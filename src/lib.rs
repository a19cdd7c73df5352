// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod adjudicate;
pub mod artifact;
pub mod config;
pub mod downloader;
pub mod hints;
pub mod language;
pub mod llm;
pub mod manifest;
pub mod mission;
pub mod model;
pub mod report;
pub mod subtitle;
pub mod worker;

// ---- Re-exports for stable public API ----
pub use adjudicate::{adjudicate, Adjudication, ScanPolicy};
pub use config::MissionConfig;
pub use manifest::Manifest;
pub use mission::MissionControl;
pub use model::{CandidateItem, Language, Mission, Outcome, Status, Target};
pub use report::Report;
