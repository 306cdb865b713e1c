//! The agent-to-agent negotiation protocol.
//!
//! One session walks a fixed sequence of phases — recall, proposal,
//! evaluation, consensus resolution, aggregation — with up to three chat
//! calls.  Phases run strictly sequentially because each prompt depends on
//! the previous step's parsed output.  Malformed model output falls back to
//! fixed defaults; transport failures abort the whole session.

use anyhow::Result;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use rendez_agent::{
    Agent, DatePlan, LogPhase, LogStatus, NegotiationLog, NegotiationResult, clamp_score,
};
use rendez_llm::{ChatMessage, extract_json_or};
use rendez_memory::recall_strongest;
use rendez_prompt::build_system_prompt;

use crate::AgentRuntime;

/// Ceiling on the reported score when a session ends without consensus.
/// A rejected negotiation cannot report high compatibility.
const NO_CONSENSUS_SCORE_CAP: u8 = 60;

// ── Phase payloads ───────────────────────────────────────────────────────────
//
// Each struct doubles as the fixed fallback for its phase: `#[serde(default)]`
// fills any field the model omitted, and a fully unparseable reply falls back
// to the whole default via `extract_json_or`.

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Proposal {
    proposal: String,
    venue: String,
    time: String,
    date: String,
}

impl Default for Proposal {
    fn default() -> Self {
        Self {
            proposal: "How about coffee this weekend?".to_string(),
            venue: "Blue Bottle Coffee".to_string(),
            time: "2:00 PM".to_string(),
            date: "Saturday".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Evaluation {
    accept: bool,
    counter: String,
    reason: String,
    score: f64,
}

impl Default for Evaluation {
    fn default() -> Self {
        Self {
            accept: true,
            counter: String::new(),
            reason: "Venue matches preferences".to_string(),
            score: 82.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct CounterDecision {
    accept_counter: bool,
    reason: String,
}

impl Default for CounterDecision {
    fn default() -> Self {
        Self {
            accept_counter: false,
            reason: "The counter-proposal does not fit my user's preferences.".to_string(),
        }
    }
}

// ── Orchestrator ─────────────────────────────────────────────────────────────

impl AgentRuntime {
    /// Run one negotiation session between the user's agent and a counterpart.
    ///
    /// Both agents are read-only snapshots; the finished [`NegotiationResult`]
    /// is returned for the caller to commit atomically.  Any chat failure
    /// aborts the session and propagates — callers record a terminal log
    /// entry via [`failure_log_entry`] and leave score and plan unset.
    #[instrument(skip(self, user_agent, match_agent), fields(user = %user_agent.name, counterpart = %match_agent.name))]
    pub async fn negotiate(
        &self,
        user_agent: &Agent,
        match_agent: &Agent,
    ) -> Result<NegotiationResult> {
        let mut logs: Vec<NegotiationLog> = Vec::new();
        let model = self.config.llm.model.as_str();
        let free_time = serde_json::to_string(&self.toolkit.free_time())?;

        // Recall — the strongest remembered fact anchors the first log entry.
        let recalled = recall_strongest(&user_agent.memories);

        // Proposal — the counterpart's agent opens with a venue and a time.
        let proposal_prompt = format!(
            "You are an AI dating agent for {name}.\n\
             Profile: {profile}\n\
             Propose a first date (venue + time) that aligns with your user's interests.\n\
             The other agent's free slots are: {free_time}.\n\
             Reply in JSON: {{\"proposal\": \"...\", \"venue\": \"...\", \"time\": \"...\", \"date\": \"...\"}}",
            name = match_agent.name,
            profile = profile_json(match_agent)?,
        );
        let raw = self
            .provider
            .complete(
                model,
                &[
                    ChatMessage::system(proposal_prompt),
                    ChatMessage::user("Generate a first date proposal."),
                ],
            )
            .await?;
        let proposal = extract_json_or(&raw, Proposal::default());
        debug!(venue = %proposal.venue, "proposal received");

        let mut recall_log = NegotiationLog::new(
            LogPhase::Memory,
            LogStatus::Accepted,
            match recalled {
                Some(memory) => format!(
                    "{}'s agent is proposing a date. Recalled: \"{}\"",
                    match_agent.name, memory.content
                ),
                None => format!("{}'s agent is proposing a date.", match_agent.name),
            },
            format!(
                "Proposal: \"{}\". Checking venue against user preferences.",
                proposal.proposal
            ),
            "memory_fetch(query=\"venue preference, availability\")",
        );
        if let Some(memory) = recalled {
            recall_log = recall_log.with_memory_ref(memory.id);
        }
        logs.push(recall_log);

        // Evaluation — the user's agent judges the proposal with its full
        // context: profile, ranked memories, availability.
        let system = build_system_prompt(
            user_agent.profile.as_ref(),
            &user_agent.memories,
            self.config.matching.max_prompt_memories,
        );
        let eval_request = format!(
            "The other agent proposed: \"{}\" at {} on {} at {}.\n\
             My user's availability: {free_time}.\n\
             Evaluate this proposal. Reply in JSON:\n\
             {{\"accept\": true/false, \"counter\": \"optional counter-proposal\", \"reason\": \"...\", \"score\": 0-100}}",
            proposal.proposal, proposal.venue, proposal.date, proposal.time,
        );
        let raw = self
            .provider
            .complete(
                model,
                &[ChatMessage::system(system), ChatMessage::user(eval_request)],
            )
            .await?;
        let evaluation = extract_json_or(&raw, Evaluation::default());
        debug!(accept = evaluation.accept, score = evaluation.score, "evaluation received");

        logs.push(NegotiationLog::new(
            LogPhase::Decision,
            if evaluation.accept {
                LogStatus::Accepted
            } else {
                LogStatus::Conditional
            },
            if evaluation.accept {
                format!("Proposal accepted: {}", proposal.venue)
            } else {
                format!("Counter-proposing: {}", evaluation.counter)
            },
            evaluation.reason.clone(),
            if evaluation.accept {
                format!(
                    "calendar_check(time=\"{}\", venue=\"{}\")",
                    proposal.time, proposal.venue
                )
            } else {
                format!("counter_propose(suggestion=\"{}\")", evaluation.counter)
            },
        ));

        // Consensus resolution — exactly one Consensus entry per session.
        let counter = evaluation.counter.trim();
        let (consensus, final_venue) = if evaluation.accept {
            logs.push(NegotiationLog::new(
                LogPhase::Consensus,
                LogStatus::Accepted,
                format!(
                    "Both agents agreed: {} on {} at {}.",
                    proposal.venue, proposal.date, proposal.time
                ),
                "Mutual availability confirmed. Venue meets both users' criteria.",
                format!(
                    "schedule_meeting(venue=\"{}\", time=\"{}\", date=\"{}\")",
                    proposal.venue, proposal.time, proposal.date
                ),
            ));
            (true, proposal.venue.clone())
        } else if !counter.is_empty() {
            // The counterpart decides on the counter-offer.
            let decision = self
                .decide_counter(model, match_agent, &proposal, counter)
                .await?;
            if decision.accept_counter {
                logs.push(NegotiationLog::new(
                    LogPhase::Consensus,
                    LogStatus::Accepted,
                    format!(
                        "Both agents agreed: {counter} on {} at {}.",
                        proposal.date, proposal.time
                    ),
                    decision.reason,
                    format!(
                        "schedule_meeting(venue=\"{counter}\", time=\"{}\", date=\"{}\")",
                        proposal.time, proposal.date
                    ),
                ));
                (true, counter.to_string())
            } else {
                logs.push(NegotiationLog::new(
                    LogPhase::Consensus,
                    LogStatus::Rejected,
                    format!("Counter-proposal declined: {counter}"),
                    decision.reason,
                    "end_negotiation(reason=\"counter rejected\")",
                ));
                (false, String::new())
            }
        } else {
            // Nothing left to negotiate over.
            logs.push(NegotiationLog::new(
                LogPhase::Consensus,
                LogStatus::Rejected,
                "Proposal declined without a counter-offer.",
                "No counter-offer was provided; nothing further to negotiate.",
                "end_negotiation(reason=\"no counter-offer\")",
            ));
            (false, String::new())
        };

        // Aggregation.
        let mut score = clamp_score(evaluation.score);
        if !consensus {
            score = score.min(NO_CONSENSUS_SCORE_CAP);
        }

        let date_plan = consensus.then(|| DatePlan {
            venue: final_venue.clone(),
            date: proposal.date.clone(),
            time: proposal.time.clone(),
            notes: evaluation.reason.clone(),
            confirmed: false,
        });

        let summary = if consensus {
            format!("Negotiation complete. Compatibility: {score}/100. Date at {final_venue}.")
        } else {
            format!("Negotiation ended without consensus. Compatibility: {score}/100.")
        };
        info!(score, consensus, "negotiation finished");

        Ok(NegotiationResult {
            compatibility_score: score,
            logs,
            date_plan,
            summary,
        })
    }

    async fn decide_counter(
        &self,
        model: &str,
        match_agent: &Agent,
        proposal: &Proposal,
        counter: &str,
    ) -> Result<CounterDecision> {
        let decision_prompt = format!(
            "You are an AI dating agent for {name}.\n\
             Profile: {profile}\n\
             Your original proposal was \"{original}\" at {venue} on {date} at {time}.\n\
             The other agent countered with: \"{counter}\".\n\
             Decide whether your user would accept the counter-proposal.\n\
             Reply in JSON: {{\"acceptCounter\": true/false, \"reason\": \"...\"}}",
            name = match_agent.name,
            profile = profile_json(match_agent)?,
            original = proposal.proposal,
            venue = proposal.venue,
            date = proposal.date,
            time = proposal.time,
        );
        let raw = self
            .provider
            .complete(
                model,
                &[
                    ChatMessage::system(decision_prompt),
                    ChatMessage::user("Accept or reject the counter-proposal."),
                ],
            )
            .await?;
        Ok(extract_json_or(&raw, CounterDecision::default()))
    }
}

fn profile_json(agent: &Agent) -> Result<String> {
    Ok(match &agent.profile {
        Some(profile) => serde_json::to_string_pretty(profile)?,
        None => "unknown".to_string(),
    })
}

/// The terminal log entry a caller records when a session aborts on a chat
/// failure.  The session produces no result in that case; the user sees a
/// generic retry-later outcome with the underlying message kept for audit.
pub fn failure_log_entry(error: &anyhow::Error) -> NegotiationLog {
    NegotiationLog::new(
        LogPhase::Consensus,
        LogStatus::Rejected,
        "Negotiation failed, retry later.",
        error.to_string(),
        "abort_session()",
    )
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use rendez_agent::{Agent, LogPhase, LogStatus};
    use rendez_config::AppConfig;
    use rendez_llm::{ChatMessage, ChatProvider, LlmError};
    use rendez_memory::{Memory, MemorySource, UserProfile};
    use rendez_tools::{Platform, ProfileVerification, TimeSlot, Toolkit, VenueSuggestion};

    use super::*;

    // ── Fixtures ───────────────────────────────────────────────────────────

    /// Replays a fixed sequence of responses, one per `complete` call.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<String>>,
    }

    impl ScriptedProvider {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
        ) -> Result<String, LlmError> {
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted: unexpected extra chat call"))
        }
    }

    /// Fails every call the way a broken proxy would.
    struct FailingProvider;

    #[async_trait]
    impl ChatProvider for FailingProvider {
        async fn complete(
            &self,
            _model: &str,
            _messages: &[ChatMessage],
        ) -> Result<String, LlmError> {
            Err(LlmError::Api {
                status: 500,
                detail: "upstream is down".to_string(),
            })
        }
    }

    /// One fixed slot; no clock involved.
    struct FixedToolkit;

    #[async_trait]
    impl Toolkit for FixedToolkit {
        fn free_time(&self) -> Vec<TimeSlot> {
            vec![TimeSlot {
                day: "Saturday".to_string(),
                date: "June 6".to_string(),
                start: "14:00".to_string(),
                end: "18:00".to_string(),
                label: "Saturday free".to_string(),
            }]
        }

        async fn verify_profile(
            &self,
            platform: Platform,
            username: &str,
        ) -> anyhow::Result<ProfileVerification> {
            Ok(ProfileVerification {
                platform: platform.label().to_string(),
                url: format!("https://example.com/{username}"),
                verified: true,
                confidence: 1.0,
                signals: vec![],
            })
        }

        fn suggest_venues(&self, _city: &str, _interests: &[String]) -> Vec<VenueSuggestion> {
            vec![]
        }
    }

    fn runtime(provider: Arc<dyn ChatProvider>) -> AgentRuntime {
        AgentRuntime::with_parts(AppConfig::default(), provider, Arc::new(FixedToolkit))
    }

    fn user_agent() -> Agent {
        let mut agent = Agent::new("user", "My Agent").with_profile(UserProfile {
            name: "Riley".to_string(),
            age: 28,
            city: "Shanghai".to_string(),
            interests: vec!["coffee".to_string(), "photography".to_string()],
            partner_prefs: "curious and kind".to_string(),
            dealbreakers: "smoking".to_string(),
            self_description: "photographer".to_string(),
        });
        agent.memories = vec![
            Memory::new("Prefers quiet venues", MemorySource::Chat, 0.6),
            Memory::new("Loves specialty coffee", MemorySource::Questionnaire, 0.9),
        ];
        agent
    }

    fn match_agent() -> Agent {
        Agent::new("match1", "Aria").with_profile(UserProfile {
            name: "Aria".to_string(),
            age: 27,
            city: "Shanghai".to_string(),
            interests: vec!["hiking".to_string(), "coffee".to_string()],
            partner_prefs: "outdoorsy".to_string(),
            dealbreakers: "smokers".to_string(),
            self_description: "photographer who explores the city".to_string(),
        })
    }

    const PROPOSAL_RESPONSE: &str = r#"Here you go:
{"proposal": "Coffee and a gallery walk?", "venue": "Riverside Books & Coffee", "time": "3:00 PM", "date": "Saturday"}"#;

    // ── Scenarios ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn accepted_proposal_yields_plan_with_proposed_venue() {
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": true, "counter": "", "reason": "Great fit for coffee lovers", "score": 90}"#,
        ]);
        let result = runtime(provider)
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap();

        assert_eq!(result.compatibility_score, 90);
        let plan = result.date_plan.as_ref().unwrap();
        assert_eq!(plan.venue, "Riverside Books & Coffee");
        assert_eq!(plan.date, "Saturday");
        assert_eq!(plan.time, "3:00 PM");
        assert!(!plan.confirmed);
        assert!(result.summary.contains("Riverside Books & Coffee"));
        assert!(result.consensus_reached());
    }

    #[tokio::test]
    async fn rejection_without_counter_caps_score_and_skips_third_call() {
        // Only two responses scripted: a third chat call would panic.
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": false, "counter": "", "reason": "Too far away", "score": 40}"#,
        ]);
        let result = runtime(provider)
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap();

        assert!(result.date_plan.is_none());
        assert!(result.compatibility_score <= 40);
        let last = result.logs.last().unwrap();
        assert_eq!(last.phase, LogPhase::Consensus);
        assert_eq!(last.status, LogStatus::Rejected);
        assert!(last.reasoning.contains("counter-offer"), "reasoning = {}", last.reasoning);
        assert!(!result.consensus_reached());
    }

    #[tokio::test]
    async fn accepted_counter_becomes_final_venue() {
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": false, "counter": "Rooftop bar", "reason": "Prefers evening spots", "score": 50}"#,
            r#"{"acceptCounter": true, "reason": "Works for my user too"}"#,
        ]);
        let result = runtime(provider)
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap();

        let plan = result.date_plan.as_ref().unwrap();
        assert_eq!(plan.venue, "Rooftop bar");
        assert_eq!(result.compatibility_score, 50);
        let consensus = result
            .logs
            .iter()
            .find(|log| log.phase == LogPhase::Consensus)
            .unwrap();
        assert_eq!(consensus.status, LogStatus::Accepted);
        assert!(consensus.perception.contains("Rooftop bar"));
    }

    #[tokio::test]
    async fn rejected_counter_caps_score_at_sixty() {
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": false, "counter": "Karaoke night", "reason": "Wants something livelier", "score": 75}"#,
            r#"{"acceptCounter": false, "reason": "My user dislikes karaoke"}"#,
        ]);
        let result = runtime(provider)
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap();

        assert!(result.date_plan.is_none());
        assert_eq!(result.compatibility_score, 60);
        let last = result.logs.last().unwrap();
        assert_eq!(last.status, LogStatus::Rejected);
        assert!(last.reasoning.contains("karaoke"));
    }

    #[tokio::test]
    async fn transport_failure_aborts_the_session() {
        let err = runtime(Arc::new(FailingProvider))
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap_err();

        let llm_err = err.downcast_ref::<LlmError>().expect("should carry LlmError");
        match llm_err {
            LlmError::Api { status, detail } => {
                assert_eq!(*status, 500);
                assert_eq!(detail, "upstream is down");
            }
            other => panic!("expected Api error, got {other:?}"),
        }

        let terminal = failure_log_entry(&err);
        assert_eq!(terminal.phase, LogPhase::Consensus);
        assert_eq!(terminal.status, LogStatus::Rejected);
        assert!(terminal.reasoning.contains("upstream is down"));
    }

    // ── Defaults and clamping ──────────────────────────────────────────────

    #[tokio::test]
    async fn malformed_output_falls_back_to_defaults() {
        // Neither reply contains parseable JSON; both phases use their fixed
        // defaults, and the default evaluation accepts with score 82.
        let provider = ScriptedProvider::new(&[
            "I will think about it and get back to you.",
            "Sounds lovely!",
        ]);
        let result = runtime(provider)
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap();

        assert_eq!(result.compatibility_score, 82);
        assert_eq!(result.date_plan.as_ref().unwrap().venue, "Blue Bottle Coffee");
        assert!(result.consensus_reached());
    }

    #[tokio::test]
    async fn out_of_range_score_is_clamped() {
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": true, "counter": "", "reason": "Perfect", "score": 250}"#,
        ]);
        let result = runtime(provider)
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap();
        assert_eq!(result.compatibility_score, 100);
    }

    #[tokio::test]
    async fn whitespace_counter_is_treated_as_absent() {
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": false, "counter": "   ", "reason": "Not feeling it", "score": 30}"#,
        ]);
        let result = runtime(provider)
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap();
        assert!(result.date_plan.is_none());
        assert_eq!(result.logs.last().unwrap().status, LogStatus::Rejected);
    }

    // ── Log shape ──────────────────────────────────────────────────────────

    #[tokio::test]
    async fn log_sequence_follows_protocol_phases() {
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": true, "counter": "", "reason": "ok", "score": 70}"#,
        ]);
        let result = runtime(provider)
            .negotiate(&user_agent(), &match_agent())
            .await
            .unwrap();

        let phases: Vec<LogPhase> = result.logs.iter().map(|log| log.phase).collect();
        assert_eq!(phases, vec![LogPhase::Memory, LogPhase::Decision, LogPhase::Consensus]);
    }

    #[tokio::test]
    async fn exactly_one_consensus_entry_per_session() {
        for script in [
            vec![
                PROPOSAL_RESPONSE,
                r#"{"accept": true, "counter": "", "reason": "ok", "score": 70}"#,
            ],
            vec![
                PROPOSAL_RESPONSE,
                r#"{"accept": false, "counter": "", "reason": "no", "score": 20}"#,
            ],
            vec![
                PROPOSAL_RESPONSE,
                r#"{"accept": false, "counter": "Park", "reason": "hmm", "score": 55}"#,
                r#"{"acceptCounter": true, "reason": "fine"}"#,
            ],
        ] {
            let provider = ScriptedProvider::new(&script);
            let result = runtime(provider)
                .negotiate(&user_agent(), &match_agent())
                .await
                .unwrap();
            let consensus_entries = result
                .logs
                .iter()
                .filter(|log| log.phase == LogPhase::Consensus)
                .count();
            assert_eq!(consensus_entries, 1);
            // The plan exists iff that single entry is an acceptance.
            assert_eq!(result.consensus_reached(), result.date_plan.is_some());
        }
    }

    #[tokio::test]
    async fn first_log_references_the_strongest_memory() {
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": true, "counter": "", "reason": "ok", "score": 70}"#,
        ]);
        let user = user_agent();
        let strongest = user
            .memories
            .iter()
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
            .unwrap()
            .clone();

        let result = runtime(provider).negotiate(&user, &match_agent()).await.unwrap();
        let first = &result.logs[0];
        assert_eq!(first.phase, LogPhase::Memory);
        assert_eq!(first.memory_ref, Some(strongest.id));
        assert!(first.perception.contains(&strongest.content));
    }

    #[tokio::test]
    async fn no_memories_gives_generic_first_perception() {
        let provider = ScriptedProvider::new(&[
            PROPOSAL_RESPONSE,
            r#"{"accept": true, "counter": "", "reason": "ok", "score": 70}"#,
        ]);
        let mut user = user_agent();
        user.memories.clear();

        let result = runtime(provider).negotiate(&user, &match_agent()).await.unwrap();
        let first = &result.logs[0];
        assert!(first.memory_ref.is_none());
        assert!(first.perception.contains("proposing a date"));
        assert!(!first.perception.contains("Recalled"));
    }
}
