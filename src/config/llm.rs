// src/config/llm.rs
use serde::{Deserialize, Serialize};

fn default_program() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_timeout_secs() -> u64 {
    377
}
fn default_cache_dir() -> String {
    "cache/llm".to_string()
}

/// Advisory LLM client settings (`[llm]` table of the mission config).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub enabled: bool,
    /// CLI invoked as `<program> -p <prompt> -m <model>`.
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Hint cache directory; empty string disables caching.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            program: default_program(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            cache_dir: default_cache_dir(),
        }
    }
}

impl LlmConfig {
    /// Clamp values that would make the client unusable.
    pub fn sanitize(&mut self) {
        self.program = self.program.trim().to_string();
        if self.program.is_empty() {
            self.program = default_program();
        }
        self.model = self.model.trim().to_string();
        if self.model.is_empty() {
            self.model = default_model();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        self.cache_dir = self.cache_dir.trim().to_string();
    }
}
