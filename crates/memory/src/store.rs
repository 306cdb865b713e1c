use std::collections::HashSet;

use uuid::Uuid;

use crate::schema::{Memory, clamp_weight};

/// In-memory collection of an agent's memories.
///
/// Append-only from the agent's perspective; the only mutations are the
/// explicit user-driven curation operations `remove` and `adjust_weight`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Vec<Memory>,
    seen_ids: HashSet<Uuid>,
}

impl MemoryStore {
    pub fn from_entries(entries: Vec<Memory>) -> Self {
        let mut store = Self::default();
        for entry in entries {
            store.insert(entry);
        }
        store
    }

    /// Insert a memory, ignoring duplicates by id.  Returns `false` when the
    /// id was already present.
    pub fn insert(&mut self, entry: Memory) -> bool {
        if !self.seen_ids.insert(entry.id) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn all(&self) -> &[Memory] {
        &self.entries
    }

    /// Remove a memory by id.  Returns `true` when something was removed.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.seen_ids.remove(&id);
        self.entries.len() < before
    }

    /// Set a memory's weight, clamped to [0, 1].  Returns `true` when the id
    /// was found.
    pub fn adjust_weight(&mut self, id: Uuid, weight: f32) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.weight = clamp_weight(weight);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<Memory> {
        self.entries
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
