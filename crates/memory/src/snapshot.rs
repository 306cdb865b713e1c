//! Durable agent state.
//!
//! Only the submitted profile and the accumulated memory list survive across
//! sessions; transient fields (interaction state, scores, transcripts) are
//! deliberately not persisted.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::schema::{Memory, UserProfile, clamp_weight};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub profile: Option<UserProfile>,
    #[serde(default)]
    pub memories: Vec<Memory>,
}

impl AgentSnapshot {
    /// Load a snapshot, returning the default (empty) snapshot when the file
    /// does not exist yet.  Weights are re-clamped on load so a hand-edited
    /// file cannot smuggle out-of-range values into the agent.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading snapshot {}", path.display()))?;
        let mut snapshot: Self = serde_json::from_str(&raw)
            .with_context(|| format!("parsing snapshot {}", path.display()))?;
        for memory in &mut snapshot.memories {
            memory.weight = clamp_weight(memory.weight);
        }
        Ok(snapshot)
    }

    /// Atomically replace the snapshot on disk.
    ///
    /// The new content is written to a `.tmp` sibling file, then renamed over
    /// the original.  A crash before the rename leaves the original file
    /// untouched; a crash after leaves a consistent new file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp = path.with_extension("tmp");
        let rendered = serde_json::to_string_pretty(self)?;
        fs::write(&tmp, rendered)?;
        if let Err(err) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(err).with_context(|| format!("replacing snapshot {}", path.display()));
        }
        debug!(path = %path.display(), memories = self.memories.len(), "snapshot saved");
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
