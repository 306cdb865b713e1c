//! Memory curation subcommands: list, forget, weigh.

use anyhow::{Result, bail};

use rendez_config::AppConfig;
use rendez_memory::{AgentSnapshot, Memory, MemoryStore, rank_by_weight};

use crate::{MemoryCommands, snapshot_path};

pub fn run(config: &AppConfig, command: MemoryCommands) -> Result<()> {
    let path = snapshot_path(config);
    let snapshot = AgentSnapshot::load_from(&path)?;

    match command {
        MemoryCommands::List => {
            if snapshot.memories.is_empty() {
                println!("Your agent has no memories yet. Run `rendez onboard` or `rendez chat`.");
                return Ok(());
            }
            for memory in rank_by_weight(&snapshot.memories) {
                println!(
                    "{}  [{:.2}] ({}) {}",
                    memory.id_short(),
                    memory.weight,
                    memory.source.label(),
                    memory.content
                );
            }
            Ok(())
        }
        MemoryCommands::Forget { id } => {
            let target = resolve(&snapshot.memories, &id)?;
            let mut store = MemoryStore::from_entries(snapshot.memories);
            store.remove(target);
            let snapshot = AgentSnapshot {
                profile: snapshot.profile,
                memories: store.into_entries(),
            };
            snapshot.save_to(&path)?;
            println!("Forgotten.");
            Ok(())
        }
        MemoryCommands::Weigh { id, weight } => {
            let target = resolve(&snapshot.memories, &id)?;
            let mut store = MemoryStore::from_entries(snapshot.memories);
            store.adjust_weight(target, weight);
            let snapshot = AgentSnapshot {
                profile: snapshot.profile,
                memories: store.into_entries(),
            };
            snapshot.save_to(&path)?;
            println!("Weight updated.");
            Ok(())
        }
    }
}

/// Resolve an id or unambiguous id prefix against the memory list.
fn resolve(memories: &[Memory], id: &str) -> Result<uuid::Uuid> {
    let needle = id.trim().to_ascii_lowercase();
    if needle.is_empty() {
        bail!("empty memory id");
    }

    let hits: Vec<&Memory> = memories
        .iter()
        .filter(|memory| memory.id.to_string().starts_with(&needle))
        .collect();

    match hits.as_slice() {
        [only] => Ok(only.id),
        [] => bail!("no memory with id starting '{id}'"),
        _ => bail!("'{id}' is ambiguous ({} matches) — use more characters", hits.len()),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rendez_memory::MemorySource;

    #[test]
    fn resolve_accepts_unique_prefix() {
        let memories = vec![Memory::new("fact", MemorySource::Chat, 0.5)];
        let prefix = memories[0].id_short();
        assert_eq!(resolve(&memories, &prefix).unwrap(), memories[0].id);
    }

    #[test]
    fn resolve_rejects_unknown_prefix() {
        let memories = vec![Memory::new("fact", MemorySource::Chat, 0.5)];
        assert!(resolve(&memories, "zzzzzzzz").is_err());
    }

    #[test]
    fn resolve_rejects_empty() {
        assert!(resolve(&[], "").is_err());
    }
}
