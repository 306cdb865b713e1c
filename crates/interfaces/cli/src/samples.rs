//! Canned counterpart agents for the negotiation demo.

use anyhow::{Result, bail};

use rendez_agent::{Agent, AgentState};
use rendez_memory::UserProfile;

pub fn sample_matches() -> Vec<Agent> {
    let mut aria = Agent::new("match1", "Aria").with_profile(UserProfile {
        name: "Aria".to_string(),
        age: 27,
        city: "Shanghai".to_string(),
        interests: vec![
            "hiking".to_string(),
            "photography".to_string(),
            "coffee".to_string(),
            "literature".to_string(),
        ],
        partner_prefs: "open-minded, curious, loves the outdoors".to_string(),
        dealbreakers: "smokers".to_string(),
        self_description: "photographer who spends weekends exploring hidden corners of the city"
            .to_string(),
    });
    aria.state = AgentState::Reflecting;
    aria.set_score(92);

    let mut lucas = Agent::new("match2", "Lucas").with_profile(UserProfile {
        name: "Lucas".to_string(),
        age: 29,
        city: "Beijing".to_string(),
        interests: vec![
            "jazz".to_string(),
            "cooking".to_string(),
            "film".to_string(),
            "cycling".to_string(),
        ],
        partner_prefs: "independent, tasteful, enjoys quiet date spots".to_string(),
        dealbreakers: "clingy partners".to_string(),
        self_description: "musician and cook, happiest making dinner for someone he likes"
            .to_string(),
    });
    lucas.state = AgentState::Negotiating;
    lucas.set_score(85);

    let mut mei = Agent::new("match3", "Mei").with_profile(UserProfile {
        name: "Mei".to_string(),
        age: 25,
        city: "Shenzhen".to_string(),
        interests: vec![
            "yoga".to_string(),
            "travel".to_string(),
            "design".to_string(),
            "meditation".to_string(),
        ],
        partner_prefs: "gentle, patient, plans for the future".to_string(),
        dealbreakers: "people who are always late".to_string(),
        self_description: "UX designer who believes good experiences change lives".to_string(),
    });
    mei.set_score(78);

    vec![aria, lucas, mei]
}

pub fn find_match(name: &str) -> Result<Agent> {
    let wanted = name.trim().to_ascii_lowercase();
    let matches = sample_matches();
    let names: Vec<String> = matches
        .iter()
        .map(|agent| agent.name.to_ascii_lowercase())
        .collect();

    match matches
        .into_iter()
        .find(|agent| agent.name.to_ascii_lowercase() == wanted)
    {
        Some(agent) => Ok(agent),
        None => bail!("unknown match '{name}' (try one of: {})", names.join(", ")),
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
