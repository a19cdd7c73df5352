// src/config/mod.rs
pub mod llm;
pub mod mission;

pub use llm::LlmConfig;
pub use mission::{ChannelSpec, DownloaderConfig, MissionConfig, PacingConfig};
