//! Tool collaborators the agents reason over during negotiation.
//!
//! Production deployments would back these with real calendar, social and
//! places integrations; this crate ships the canned [`MockToolkit`] the demo
//! runs on.  The [`Toolkit`] trait exists so the orchestrator's tests can
//! supply deterministic fixtures instead of wall-clock-dependent values.

pub mod mock;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use mock::MockToolkit;

// ── Descriptor types ─────────────────────────────────────────────────────────

/// One free window in the user's calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlot {
    pub day: String,
    pub date: String,
    pub start: String,
    pub end: String,
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    LinkedIn,
    Instagram,
    Weibo,
    WeChat,
}

impl Platform {
    pub fn label(self) -> &'static str {
        match self {
            Self::LinkedIn => "LinkedIn",
            Self::Instagram => "Instagram",
            Self::Weibo => "Weibo",
            Self::WeChat => "WeChat",
        }
    }

    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linkedin" => Some(Self::LinkedIn),
            "instagram" => Some(Self::Instagram),
            "weibo" => Some(Self::Weibo),
            "wechat" => Some(Self::WeChat),
            _ => None,
        }
    }
}

/// Authenticity verdict for a social profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileVerification {
    pub platform: String,
    pub url: String,
    pub verified: bool,
    /// Confidence in the verdict, clamped to [0, 1].
    pub confidence: f32,
    /// Evidence for or against authenticity.
    pub signals: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueSuggestion {
    pub name: String,
    pub kind: String,
    pub city: String,
    pub ambiance: String,
    pub price_range: String,
    pub good_for: Vec<String>,
}

// ── Toolkit trait ────────────────────────────────────────────────────────────

#[async_trait]
pub trait Toolkit: Send + Sync {
    /// The user's available time slots for the coming week, soonest first.
    fn free_time(&self) -> Vec<TimeSlot>;

    /// Look up whether a social profile appears authentic.
    async fn verify_profile(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<ProfileVerification>;

    /// Up to three venues in `city`, ranked by interest overlap.
    fn suggest_venues(&self, city: &str, interests: &[String]) -> Vec<VenueSuggestion>;
}

// ── Venue ranking ────────────────────────────────────────────────────────────

/// Filter venues to `city`, rank by how many interests overlap the venue's
/// `good_for` tags (descending, stable ties), and keep at most three.
///
/// An interest overlaps a tag when the tag contains the interest as a
/// substring, so "photo" matches a "photography" tag.
pub fn rank_venues(
    venues: &[VenueSuggestion],
    city: &str,
    interests: &[String],
) -> Vec<VenueSuggestion> {
    let mut matches: Vec<&VenueSuggestion> =
        venues.iter().filter(|venue| venue.city == city).collect();
    matches.sort_by_key(|venue| std::cmp::Reverse(overlap_count(venue, interests)));
    matches.into_iter().take(3).cloned().collect()
}

fn overlap_count(venue: &VenueSuggestion, interests: &[String]) -> usize {
    interests
        .iter()
        .filter(|interest| venue.good_for.iter().any(|tag| tag.contains(interest.as_str())))
        .count()
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(name: &str, city: &str, good_for: &[&str]) -> VenueSuggestion {
        VenueSuggestion {
            name: name.to_string(),
            kind: "test".to_string(),
            city: city.to_string(),
            ambiance: "test".to_string(),
            price_range: "$".to_string(),
            good_for: good_for.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn interests(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rank_filters_by_city() {
        let venues = vec![
            venue("local", "Shanghai", &["coffee"]),
            venue("elsewhere", "Beijing", &["coffee"]),
        ];
        let ranked = rank_venues(&venues, "Shanghai", &interests(&["coffee"]));
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].name, "local");
    }

    #[test]
    fn rank_orders_by_overlap_descending() {
        let venues = vec![
            venue("one-hit", "Shanghai", &["coffee"]),
            venue("two-hits", "Shanghai", &["coffee", "reading"]),
        ];
        let ranked = rank_venues(&venues, "Shanghai", &interests(&["coffee", "reading"]));
        assert_eq!(ranked[0].name, "two-hits");
        assert_eq!(ranked[1].name, "one-hit");
    }

    #[test]
    fn rank_ties_keep_original_order() {
        let venues = vec![
            venue("first", "Shanghai", &["coffee"]),
            venue("second", "Shanghai", &["coffee"]),
        ];
        let ranked = rank_venues(&venues, "Shanghai", &interests(&["coffee"]));
        assert_eq!(ranked[0].name, "first");
        assert_eq!(ranked[1].name, "second");
    }

    #[test]
    fn rank_caps_at_three() {
        let venues: Vec<VenueSuggestion> = (0..5)
            .map(|i| venue(&format!("v{i}"), "Shanghai", &["coffee"]))
            .collect();
        assert_eq!(rank_venues(&venues, "Shanghai", &interests(&["coffee"])).len(), 3);
    }

    #[test]
    fn interest_matches_tag_by_substring() {
        let venues = vec![venue("gallery", "Shanghai", &["photography walks"])];
        let ranked = rank_venues(&venues, "Shanghai", &interests(&["photography"]));
        assert_eq!(ranked.len(), 1);
        // Still listed (city match) even with zero overlap, just ranked last.
        let none = rank_venues(&venues, "Shanghai", &interests(&["sailing"]));
        assert_eq!(none.len(), 1);
    }

    #[test]
    fn platform_labels_roundtrip() {
        for platform in [
            Platform::LinkedIn,
            Platform::Instagram,
            Platform::Weibo,
            Platform::WeChat,
        ] {
            assert_eq!(Platform::from_label(platform.label()), Some(platform));
        }
        assert_eq!(Platform::from_label("myspace"), None);
    }
}
