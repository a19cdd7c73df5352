// src/llm.rs
//! Advisory LLM client: provider abstraction over an external CLI.
//! Never authoritative; every failure degrades to `None`.

use async_trait::async_trait;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::llm::LlmConfig;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one prompt, return the cleaned reply.
    async fn complete(&self, prompt: &str) -> Option<String>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynLlmClient = Arc<dyn LlmClient>;

pub const ENV_LLM_TEST_MODE: &str = "LLM_TEST_MODE";

/// Factory:
/// * `LLM_TEST_MODE=mock` → `MockClient` that never answers
/// * disabled config → `DisabledClient`
/// * otherwise the CLI client
pub fn build_client_from_config(cfg: &LlmConfig) -> DynLlmClient {
    if std::env::var(ENV_LLM_TEST_MODE)
        .map(|v| v == "mock")
        .unwrap_or(false)
    {
        debug!(target: "llm", "LLM_TEST_MODE=mock; using mock client");
        return Arc::new(MockClient::new(None));
    }
    if !cfg.enabled {
        return Arc::new(DisabledClient);
    }
    Arc::new(CliClient::new(
        &cfg.program,
        &cfg.model,
        Duration::from_secs(cfg.timeout_secs),
    ))
}

/// Returns `None` always; used when hints are disabled.
pub struct DisabledClient;

#[async_trait]
impl LlmClient for DisabledClient {
    async fn complete(&self, _prompt: &str) -> Option<String> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// `gemini`-style CLI: `<program> -p <prompt> -m <model>`.
pub struct CliClient {
    program: String,
    model: String,
    timeout: Duration,
}

impl CliClient {
    pub fn new(program: &str, model: &str, timeout: Duration) -> Self {
        Self {
            program: program.to_string(),
            model: model.to_string(),
            timeout,
        }
    }
}

#[async_trait]
impl LlmClient for CliClient {
    async fn complete(&self, prompt: &str) -> Option<String> {
        let child = Command::new(&self.program)
            .args(["-p", prompt, "-m", self.model.as_str()])
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(Ok(o)) => o,
            Ok(Err(e)) => {
                warn!(target: "llm", error = %e, program = %self.program, "llm cli failed to start");
                return None;
            }
            Err(_) => {
                warn!(target: "llm", timeout_secs = self.timeout.as_secs(), "llm cli timed out");
                return None;
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(
                target: "llm",
                code = ?output.status.code(),
                stderr = %stderr.trim(),
                "llm cli exited with error"
            );
            return None;
        }

        let cleaned = strip_cli_noise(&String::from_utf8_lossy(&output.stdout));
        debug!(target: "llm", bytes = cleaned.len(), "llm reply");
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    fn provider_name(&self) -> &'static str {
        "cli"
    }
}

/// Drop credential banners and blank lines the CLI prints around the reply.
pub fn strip_cli_noise(out: &str) -> String {
    out.lines()
        .filter(|l| !l.contains("Loaded cached credentials"))
        .map(str::trim_end)
        .filter(|l| !l.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// --- Test helper ---

/// Canned reply; records every prompt it receives.
pub struct MockClient {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            prompts: Mutex::new(vec![]),
        }
    }
}

#[async_trait]
impl LlmClient for MockClient {
    async fn complete(&self, prompt: &str) -> Option<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
