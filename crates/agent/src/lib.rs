//! Agent, negotiation-log, and date-plan schema shared by the runtime and CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use rendez_memory::{Memory, UserProfile};

// ── Agent ────────────────────────────────────────────────────────────────────

/// What an agent is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentState {
    Idle,
    Reflecting,
    Negotiating,
    Confirmed,
}

impl AgentState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Reflecting => "Reflecting",
            Self::Negotiating => "Negotiating",
            Self::Confirmed => "Confirmed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Agent,
}

/// One entry of an agent's onboarding transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEntry {
    pub id: Uuid,
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// A software proxy representing one person's dating preferences.
///
/// The user's own agent and candidate matches share this shape; which role an
/// agent plays in a negotiation is determined per call, not by type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub state: AgentState,
    /// Match compatibility estimate, 0–100.
    pub score: u8,
    pub profile: Option<UserProfile>,
    pub memories: Vec<Memory>,
    pub chat_history: Vec<ChatEntry>,
}

impl Agent {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            state: AgentState::Idle,
            score: 0,
            profile: None,
            memories: Vec::new(),
            chat_history: Vec::new(),
        }
    }

    pub fn with_profile(mut self, profile: UserProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn set_score(&mut self, score: u8) {
        self.score = score.min(100);
    }

    /// The trailing `window` transcript entries, oldest first.
    pub fn recent_history(&self, window: usize) -> &[ChatEntry] {
        let start = self.chat_history.len().saturating_sub(window);
        &self.chat_history[start..]
    }
}

// ── Negotiation log ──────────────────────────────────────────────────────────

/// Protocol phase a log entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogPhase {
    Memory,
    Decision,
    Consensus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Accepted,
    Conditional,
    Rejected,
}

/// One append-only audit entry for a negotiation session.  Never mutated
/// after creation; order is the chronological order of protocol steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationLog {
    pub id: Uuid,
    pub phase: LogPhase,
    pub timestamp: DateTime<Utc>,
    /// What the agent observed at this step.
    pub perception: String,
    /// Why it acted the way it did.
    pub reasoning: String,
    /// Symbolic, tool-call-shaped description of the action taken.
    pub action: String,
    pub status: LogStatus,
    /// The memory surfaced at this step, when one was.
    pub memory_ref: Option<Uuid>,
}

impl NegotiationLog {
    pub fn new(
        phase: LogPhase,
        status: LogStatus,
        perception: impl Into<String>,
        reasoning: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase,
            timestamp: Utc::now(),
            perception: perception.into(),
            reasoning: reasoning.into(),
            action: action.into(),
            status,
            memory_ref: None,
        }
    }

    pub fn with_memory_ref(mut self, memory_id: Uuid) -> Self {
        self.memory_ref = Some(memory_id);
        self
    }
}

// ── Date plan and result ─────────────────────────────────────────────────────

/// The agreed first date.  Produced at most once per negotiation session;
/// absent means no consensus was reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatePlan {
    pub venue: String,
    pub date: String,
    pub time: String,
    pub notes: String,
    /// Confirmation is a separate user action; negotiations always produce
    /// unconfirmed plans.
    pub confirmed: bool,
}

/// The orchestrator's sole output contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegotiationResult {
    /// 0–100; capped at 60 when the session ended without consensus.
    pub compatibility_score: u8,
    pub logs: Vec<NegotiationLog>,
    pub date_plan: Option<DatePlan>,
    pub summary: String,
}

impl NegotiationResult {
    /// Whether this session ended in consensus: a `Consensus` log entry with
    /// status `accepted`.  Holds iff `date_plan` is present.
    pub fn consensus_reached(&self) -> bool {
        self.logs
            .iter()
            .any(|log| log.phase == LogPhase::Consensus && log.status == LogStatus::Accepted)
    }
}

/// Round a model-reported score to the nearest integer and clamp to [0, 100].
pub fn clamp_score(score: f64) -> u8 {
    if score.is_nan() {
        return 0;
    }
    score.round().clamp(0.0, 100.0) as u8
}

// ── Tests ────────────────────────────────────────────────────────────────────
