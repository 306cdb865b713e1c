//! Onboarding chat turns — the degenerate one-call case of the protocol.
//!
//! Each turn reuses the same chat invoker and parsing as negotiation: one
//! user message in, one model reply out, at most one new memory extracted
//! from the reply's inline tag.

use anyhow::Result;
use tracing::{debug, instrument};

use rendez_agent::{Agent, Speaker};
use rendez_llm::{ChatMessage, extract_memory_tag};
use rendez_memory::Memory;
use rendez_prompt::{build_system_prompt, learning_mode_suffix};

use crate::AgentRuntime;

#[derive(Debug, Clone)]
pub struct OnboardingReply {
    pub reply: String,
    pub new_memory: Option<Memory>,
}

impl AgentRuntime {
    /// One learning turn with the user's agent.
    ///
    /// The system prompt is the full built prompt plus the learning-mode
    /// block, followed by the trailing transcript window and the new user
    /// message.  The reply comes back with the memory tag stripped.
    #[instrument(skip(self, agent, user_message), fields(agent = %agent.name, message_len = user_message.len()))]
    pub async fn onboarding_turn(
        &self,
        agent: &Agent,
        user_message: &str,
    ) -> Result<OnboardingReply> {
        let system = format!(
            "{}{}",
            build_system_prompt(
                agent.profile.as_ref(),
                &agent.memories,
                self.config.matching.max_prompt_memories,
            ),
            learning_mode_suffix(),
        );

        let history = agent.recent_history(self.config.matching.chat_history_window);
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system));
        for entry in history {
            messages.push(match entry.speaker {
                Speaker::User => ChatMessage::user(entry.text.clone()),
                Speaker::Agent => ChatMessage::assistant(entry.text.clone()),
            });
        }
        messages.push(ChatMessage::user(user_message));

        let raw = self
            .provider
            .complete(&self.config.llm.model, &messages)
            .await?;
        let (reply, new_memory) = extract_memory_tag(&raw);
        if let Some(memory) = &new_memory {
            debug!(weight = memory.weight, "memory extracted from chat turn");
        }

        Ok(OnboardingReply { reply, new_memory })
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
