use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a remembered fact came from.
///
/// | Source          | Purpose                                            |
/// |-----------------|----------------------------------------------------|
/// | `Questionnaire` | Seeded from the submitted profile, high weight     |
/// | `Chat`          | Extracted from an onboarding conversation turn     |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemorySource {
    Questionnaire,
    Chat,
}

impl MemorySource {
    /// Canonical display label used in prompts and log lines.
    pub fn label(self) -> &'static str {
        match self {
            Self::Questionnaire => "questionnaire",
            Self::Chat => "chat",
        }
    }

    /// Parse a source from its label (case-insensitive).
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "questionnaire" => Some(Self::Questionnaire),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }
}

/// A weighted fact the agent remembers about its user.
///
/// Weight drives ranking during prompt assembly: higher-weighted facts are
/// more likely to be included and surfaced during negotiation recall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: Uuid,
    pub content: String,
    pub source: MemorySource,
    pub weight: f32,
    pub created_at: DateTime<Utc>,
}

impl Memory {
    /// Create a memory with a fresh id and timestamp.  `weight` is clamped
    /// to [0, 1] regardless of upstream input.
    pub fn new(content: impl Into<String>, source: MemorySource, weight: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            source,
            weight: clamp_weight(weight),
            created_at: Utc::now(),
        }
    }

    /// First 8 characters of the UUID, used as a compact display identifier.
    pub fn id_short(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

/// Clamp a memory weight to [0, 1].  NaN collapses to 0.
pub fn clamp_weight(weight: f32) -> f32 {
    if weight.is_nan() {
        0.0
    } else {
        weight.clamp(0.0, 1.0)
    }
}

/// The questionnaire profile a user submits once onboarding completes.
/// Immutable after submission except via explicit replace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub age: u32,
    pub city: String,
    pub interests: Vec<String>,
    pub partner_prefs: String,
    pub dealbreakers: String,
    pub self_description: String,
}

// ── Tests ────────────────────────────────────────────────────────────────────
