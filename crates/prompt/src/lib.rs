//! System-prompt assembly for the personal dating agent.
//!
//! This is the context-engineering layer: before any model call we curate
//! exactly what the agent knows about its user.  Everything here is a pure
//! function of profile + memories — no I/O, no clock, no randomness — so
//! identical input yields byte-identical prompts.

use rendez_memory::{Memory, UserProfile, top_memories};

/// Build the agent's full system prompt: a fixed advocate preamble, the
/// user's profile (or a placeholder), the top `max_memories` remembered facts
/// by descending weight, and a fixed behavior-rules footer.
pub fn build_system_prompt(
    profile: Option<&UserProfile>,
    memories: &[Memory],
    max_memories: usize,
) -> String {
    let profile_section = build_profile_section(profile);
    let memories_section = build_memories_section(memories, max_memories);

    format!(
        "You are a personal AI dating agent representing a real person.\n\
         Your job is to advocate for your user's genuine interests and preferences.\n\
         Be warm, discerning, and honest. Never make commitments your user would\n\
         regret. Always check compatibility before agreeing to dates.\n\
         \n\
         {profile_section}\n\
         {memories_section}\n\
         ## Behavior Rules\n\
         - Speak in first person AS the agent (e.g., \"My user prefers...\")\n\
         - In negotiations, be polite but firm about dealbreakers\n\
         - Always explain your reasoning briefly\n\
         - Output JSON when asked for structured data"
    )
}

/// The learning-mode block appended to the system prompt during onboarding
/// chat.  Instructs the model to end each reply with a single inline
/// `<memory>` JSON block for fact extraction.
pub fn learning_mode_suffix() -> &'static str {
    "\n\n## Current Mode: LEARNING\n\
     The user is talking to you to help you understand them better.\n\
     After your conversational reply, extract ONE key fact to remember.\n\
     ALWAYS end your reply with this JSON block on a new line:\n\
     <memory>{\"content\": \"...\", \"weight\": 0.0}</memory>\n\
     Weight: 0.9 = very important preference, 0.5 = casual mention, 0.2 = minor detail."
}

// ── Section builders ─────────────────────────────────────────────────────────

fn build_profile_section(profile: Option<&UserProfile>) -> String {
    match profile {
        Some(p) => format!(
            "## Your User's Profile\n\
             - Name: {}, Age: {}, City: {}\n\
             - Interests: {}\n\
             - Seeking: {}\n\
             - Dealbreakers: {}\n\
             - Self-description: {}",
            p.name,
            p.age,
            p.city,
            p.interests.join(", "),
            p.partner_prefs,
            p.dealbreakers,
            p.self_description,
        ),
        None => "No profile set yet.".to_string(),
    }
}

fn build_memories_section(memories: &[Memory], max_memories: usize) -> String {
    let top = top_memories(memories, max_memories);
    if top.is_empty() {
        return String::new();
    }

    let items = top
        .iter()
        .map(|m| format!("- [weight: {:.2}] {}", m.weight, m.content))
        .collect::<Vec<_>>()
        .join("\n");
    format!("\n## Remembered Facts (from past conversations)\n{items}\n")
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use rendez_memory::{Memory, MemorySource};

    fn sample_profile() -> UserProfile {
        UserProfile {
            name: "Riley".to_string(),
            age: 28,
            city: "Shanghai".to_string(),
            interests: vec!["hiking".to_string(), "coffee".to_string()],
            partner_prefs: "curious and kind".to_string(),
            dealbreakers: "smoking".to_string(),
            self_description: "photographer".to_string(),
        }
    }

    fn memory(content: &str, weight: f32) -> Memory {
        Memory::new(content, MemorySource::Chat, weight)
    }

    #[test]
    fn identical_input_yields_identical_output() {
        let profile = sample_profile();
        let memories = vec![memory("loves jazz", 0.8), memory("early riser", 0.3)];
        let first = build_system_prompt(Some(&profile), &memories, 10);
        let second = build_system_prompt(Some(&profile), &memories, 10);
        assert_eq!(first, second);
    }

    #[test]
    fn missing_profile_uses_placeholder() {
        let prompt = build_system_prompt(None, &[], 10);
        assert!(prompt.contains("No profile set yet."));
        assert!(!prompt.contains("## Your User's Profile"));
    }

    #[test]
    fn profile_fields_are_rendered() {
        let profile = sample_profile();
        let prompt = build_system_prompt(Some(&profile), &[], 10);
        assert!(prompt.contains("Name: Riley, Age: 28, City: Shanghai"));
        assert!(prompt.contains("Interests: hiking, coffee"));
        assert!(prompt.contains("Seeking: curious and kind"));
        assert!(prompt.contains("Dealbreakers: smoking"));
    }

    #[test]
    fn memory_section_omitted_when_empty() {
        let prompt = build_system_prompt(Some(&sample_profile()), &[], 10);
        assert!(!prompt.contains("Remembered Facts"));
    }

    #[test]
    fn memories_listed_highest_weight_first() {
        let memories = vec![memory("casual", 0.3), memory("crucial", 0.95)];
        let prompt = build_system_prompt(None, &memories, 10);
        let crucial = prompt.find("crucial").unwrap();
        let casual = prompt.find("casual").unwrap();
        assert!(crucial < casual);
    }

    #[test]
    fn at_most_max_memories_appear() {
        let memories: Vec<Memory> = (0..15)
            .map(|i| memory(&format!("fact-{i:02}"), 1.0 - i as f32 * 0.01))
            .collect();
        let prompt = build_system_prompt(None, &memories, 10);
        assert!(prompt.contains("fact-00"));
        assert!(prompt.contains("fact-09"));
        assert!(!prompt.contains("fact-10"));
        assert!(!prompt.contains("fact-14"));
    }

    #[test]
    fn weights_render_with_two_decimals() {
        let memories = vec![memory("precise", 0.8)];
        let prompt = build_system_prompt(None, &memories, 10);
        assert!(prompt.contains("[weight: 0.80] precise"), "prompt = {prompt}");
    }

    #[test]
    fn equal_weights_keep_insertion_order() {
        let memories = vec![memory("first", 0.5), memory("second", 0.5)];
        let prompt = build_system_prompt(None, &memories, 10);
        let a = prompt.find("first").unwrap();
        let b = prompt.find("second").unwrap();
        assert!(a < b);
    }

    #[test]
    fn behavior_rules_footer_always_present() {
        let prompt = build_system_prompt(None, &[], 10);
        assert!(prompt.contains("## Behavior Rules"));
        assert!(prompt.contains("Output JSON when asked for structured data"));
    }

    #[test]
    fn learning_suffix_includes_tag_instruction() {
        let suffix = learning_mode_suffix();
        assert!(suffix.contains("<memory>"));
        assert!(suffix.contains("LEARNING"));
    }
}
