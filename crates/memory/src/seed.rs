//! Initial memory seeding from a completed questionnaire.

use crate::schema::{Memory, MemorySource, UserProfile};

/// Convert a submitted profile into the agent's starting memories.
///
/// Five fixed fact templates filled from profile fields, assigned descending
/// weights starting at 0.9 and decreasing by 0.05 per fact.  Called once when
/// onboarding completes.
pub fn seed_from_profile(profile: &UserProfile) -> Vec<Memory> {
    let facts = [
        format!("User is {} years old living in {}.", profile.age, profile.city),
        format!("Interests: {}.", profile.interests.join(", ")),
        format!("Looking for someone who is: {}.", profile.partner_prefs),
        format!("Dealbreakers: {}.", profile.dealbreakers),
        format!("Self-description: {}.", profile.self_description),
    ];

    facts
        .into_iter()
        .enumerate()
        .map(|(i, content)| {
            Memory::new(content, MemorySource::Questionnaire, 0.9 - i as f32 * 0.05)
        })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────────
