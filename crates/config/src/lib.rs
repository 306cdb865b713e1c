use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ── Agent config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Display name of the user's personal agent.
    pub name: String,
    pub user_name: String,
    /// Directory where the agent snapshot (profile + memories) is stored.
    pub data_dir: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "My Agent".to_string(),
            user_name: String::new(),
            data_dir: ".rendez".to_string(),
        }
    }
}

// ── LLM config ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// URL of the chat-completion proxy endpoint.  Overridden at runtime by
    /// the `RENDEZ_CHAT_URL` environment variable when set.
    pub base_url: String,
    pub model: String,
    /// Upper bound on a single chat request.  A timeout surfaces as a
    /// transport failure to the caller.
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5173/api/ai/chat".to_string(),
            model: "moonshot-v1-8k".to_string(),
            request_timeout_secs: 30,
        }
    }
}

// ── Matching config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Maximum number of remembered facts injected into each system prompt.
    /// Facts are sorted by weight before truncation.
    pub max_prompt_memories: usize,
    /// Number of trailing transcript entries replayed in onboarding calls.
    pub chat_history_window: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_prompt_memories: 10,
            chat_history_window: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OnboardingConfig {
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub llm: LlmConfig,
    pub matching: MatchingConfig,
    pub telemetry: TelemetryConfig,
    pub onboarding: OnboardingConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        // Chat endpoint env override (takes precedence over config file).
        if let Ok(url) = env::var("RENDEZ_CHAT_URL") {
            if !url.is_empty() {
                config.llm.base_url = url;
            }
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }

    pub fn needs_onboarding(&self) -> bool {
        !self.onboarding.completed
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
