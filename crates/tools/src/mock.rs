//! Canned tool data for the demo.
//!
//! Values are shaped like real integrations would return them so the agents
//! can reason over them unchanged.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{Datelike, Duration, Local};

use crate::{Platform, ProfileVerification, TimeSlot, Toolkit, VenueSuggestion, rank_venues};

#[derive(Debug, Clone, Default)]
pub struct MockToolkit;

#[async_trait]
impl Toolkit for MockToolkit {
    /// Four realistic free slots spread over the coming week, derived from
    /// today's date.
    fn free_time(&self) -> Vec<TimeSlot> {
        let now = Local::now();
        let schedule = [
            (1_i64, "19:00", "22:00", "Weekday evening"),
            (3, "14:00", "17:00", "Afternoon window"),
            (5, "10:00", "18:00", "Saturday free"),
            (6, "11:00", "15:00", "Sunday morning"),
        ];

        schedule
            .iter()
            .map(|(offset, start, end, label)| {
                let date = now + Duration::days(*offset);
                TimeSlot {
                    day: day_name(date.weekday()),
                    date: date.format("%B %-d").to_string(),
                    start: (*start).to_string(),
                    end: (*end).to_string(),
                    label: (*label).to_string(),
                }
            })
            .collect()
    }

    async fn verify_profile(
        &self,
        platform: Platform,
        username: &str,
    ) -> Result<ProfileVerification> {
        let verdict = match platform {
            Platform::LinkedIn => ProfileVerification {
                platform: platform.label().to_string(),
                url: format!("https://linkedin.com/in/{username}"),
                verified: true,
                confidence: 0.91,
                signals: vec![
                    "Account created > 2 years ago".to_string(),
                    "500+ connections".to_string(),
                    "Employment history consistent".to_string(),
                    "Profile photo appears authentic (not AI-generated)".to_string(),
                ],
            },
            Platform::Instagram => ProfileVerification {
                platform: platform.label().to_string(),
                url: format!("https://instagram.com/{username}"),
                verified: true,
                confidence: 0.78,
                signals: vec![
                    "Regular posting history (> 6 months)".to_string(),
                    "Natural follower growth curve".to_string(),
                    "Stories archive present".to_string(),
                ],
            },
            Platform::Weibo => ProfileVerification {
                platform: platform.label().to_string(),
                url: format!("https://weibo.com/{username}"),
                verified: false,
                confidence: 0.42,
                signals: vec![
                    "Account less than 3 months old".to_string(),
                    "No original posts".to_string(),
                    "Follower/following ratio suspicious".to_string(),
                ],
            },
            Platform::WeChat => ProfileVerification {
                platform: platform.label().to_string(),
                url: format!("wechat://{username}"),
                verified: true,
                confidence: 0.65,
                signals: vec![
                    "Moments active".to_string(),
                    "Mutual contacts found".to_string(),
                ],
            },
        };

        Ok(ProfileVerification {
            confidence: verdict.confidence.clamp(0.0, 1.0),
            ..verdict
        })
    }

    fn suggest_venues(&self, city: &str, interests: &[String]) -> Vec<VenueSuggestion> {
        rank_venues(&venue_catalog(), city, interests)
    }
}

fn day_name(weekday: chrono::Weekday) -> String {
    match weekday {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
    .to_string()
}

fn venue_catalog() -> Vec<VenueSuggestion> {
    vec![
        VenueSuggestion {
            name: "Blue Bottle Coffee".to_string(),
            kind: "Cafe".to_string(),
            city: "Shanghai".to_string(),
            ambiance: "Quiet, industrial".to_string(),
            price_range: "$$".to_string(),
            good_for: vec![
                "coffee".to_string(),
                "reading".to_string(),
                "quiet conversation".to_string(),
            ],
        },
        VenueSuggestion {
            name: "M50 Art Park".to_string(),
            kind: "Art district".to_string(),
            city: "Shanghai".to_string(),
            ambiance: "Creative, open-air".to_string(),
            price_range: "$".to_string(),
            good_for: vec![
                "photography".to_string(),
                "art".to_string(),
                "walking".to_string(),
            ],
        },
        VenueSuggestion {
            name: "Taikoo Li Sanlitun".to_string(),
            kind: "Open-air mall".to_string(),
            city: "Beijing".to_string(),
            ambiance: "Lively, fashionable".to_string(),
            price_range: "$$$".to_string(),
            good_for: vec![
                "shopping".to_string(),
                "dining".to_string(),
                "movies".to_string(),
            ],
        },
        VenueSuggestion {
            name: "East Shore Jazz Cafe".to_string(),
            kind: "Music bar".to_string(),
            city: "Beijing".to_string(),
            ambiance: "Cozy, tasteful".to_string(),
            price_range: "$$".to_string(),
            good_for: vec![
                "jazz".to_string(),
                "cocktails".to_string(),
                "evening dates".to_string(),
            ],
        },
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────
