//! Orchestration of the two model-driven flows: agent-to-agent negotiation
//! and onboarding chat turns.

pub mod negotiation;
pub mod onboarding;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use rendez_config::AppConfig;
use rendez_llm::{ChatProvider, HttpChatClient};
use rendez_tools::{MockToolkit, Toolkit};

pub use negotiation::failure_log_entry;
pub use onboarding::OnboardingReply;

/// Holds the configuration and the injected collaborators every orchestrated
/// flow needs: the chat provider (sole I/O boundary) and the toolkit.
///
/// The runtime itself is stateless across sessions — each negotiation owns
/// its own log accumulator and returns a finished result for the caller to
/// commit, so independent sessions can run concurrently.
pub struct AgentRuntime {
    config: AppConfig,
    provider: Arc<dyn ChatProvider>,
    toolkit: Arc<dyn Toolkit>,
}

impl AgentRuntime {
    /// Build a runtime talking to the configured chat proxy, backed by the
    /// demo toolkit.
    pub fn new(config: AppConfig) -> Result<Self> {
        let provider = HttpChatClient::new(
            config.llm.base_url.clone(),
            Duration::from_secs(config.llm.request_timeout_secs),
        )?;
        Ok(Self::with_parts(
            config,
            Arc::new(provider),
            Arc::new(MockToolkit),
        ))
    }

    /// Assemble a runtime from explicit collaborators.  Tests inject scripted
    /// providers and deterministic toolkits here.
    pub fn with_parts(
        config: AppConfig,
        provider: Arc<dyn ChatProvider>,
        toolkit: Arc<dyn Toolkit>,
    ) -> Self {
        Self {
            config,
            provider,
            toolkit,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
