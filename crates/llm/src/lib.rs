use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rendez_memory::{Memory, MemorySource};

// ── Wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Failure of a single chat-completion call.
///
/// Transport problems and non-success statuses are both fatal to the current
/// negotiation phase and are never retried at this layer; retry policy, if
/// any, belongs to the caller.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The endpoint answered with a non-success status.  `detail` carries the
    /// `error` field of the response body when one was present, else a
    /// status-based fallback message.
    #[error("chat endpoint returned {status}: {detail}")]
    Api { status: u16, detail: String },
    /// The request never completed (connection refused, timeout, bad body).
    #[error("chat transport failure: {0}")]
    Transport(#[from] reqwest::Error),
}

// ── Provider trait ───────────────────────────────────────────────────────────

/// The sole I/O boundary of the negotiation core.  Implemented by
/// [`HttpChatClient`] in production and by scripted stubs in tests.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

// ── HTTP client ──────────────────────────────────────────────────────────────

/// Posts `{model, messages}` to the chat proxy endpoint and returns the raw
/// text completion from its `{content}` reply.  Exactly one outbound request
/// per call, bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpChatClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpChatClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ChatProvider for HttpChatClient {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String, LlmError> {
        debug!(endpoint = %self.endpoint, model, count = messages.len(), "chat request");
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ChatRequest { model, messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorBody>()
                .await
                .ok()
                .map(|body| body.error)
                .filter(|error| !error.trim().is_empty())
                .unwrap_or_else(|| format!("request failed with status {status}"));
            return Err(LlmError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let body: ChatResponse = response.json().await?;
        Ok(body.content)
    }
}

// ── Structured output extraction ─────────────────────────────────────────────

/// Extract the first JSON object embedded in an LLM response.
///
/// Two strategies, tried in order:
/// 1. fenced ` ```json ... ``` ` code blocks;
/// 2. bare objects — first `{` to last `}`.
///
/// Returns `None` when neither yields valid JSON of the requested shape.
/// Model output is free text with no format guarantee, so absence is a
/// routine outcome, not an error.
///
/// # Usage
///
/// ```rust
/// use rendez_llm::extract_json;
///
/// let raw = r#"Here you go: {"venue": "M50 Art Park", "score": 70}"#;
/// let value: serde_json::Value = extract_json(raw).unwrap();
/// assert_eq!(value["venue"], "M50 Art Park");
/// ```
pub fn extract_json<T: serde::de::DeserializeOwned>(response: &str) -> Option<T> {
    if let Some(fence_start) = response.find("```json") {
        let after_fence = &response[fence_start + "```json".len()..];
        if let Some(json_start) = after_fence.find(|c: char| !c.is_whitespace()) {
            let json_body = &after_fence[json_start..];
            if let Some(fence_end) = json_body.find("```") {
                let json_str = json_body[..fence_end].trim();
                if let Ok(val) = serde_json::from_str(json_str) {
                    return Some(val);
                }
            }
        }
    }

    let trimmed = response.trim();
    if let Some(start) = trimmed.find('{') {
        if let Some(end) = trimmed.rfind('}') {
            if end > start {
                let candidate = &trimmed[start..=end];
                if let Ok(val) = serde_json::from_str(candidate) {
                    return Some(val);
                }
            }
        }
    }

    None
}

/// [`extract_json`] with a caller-supplied fallback for the unparseable case.
pub fn extract_json_or<T: serde::de::DeserializeOwned>(response: &str, default: T) -> T {
    extract_json(response).unwrap_or(default)
}

// ── Memory tag extraction ────────────────────────────────────────────────────

pub const MEMORY_OPEN_TAG: &str = "<memory>";
pub const MEMORY_CLOSE_TAG: &str = "</memory>";

/// Scan a reply for one inline `<memory>{"content": ..., "weight": ...}</memory>`
/// block emitted during onboarding.
///
/// Returns the reply with the block stripped, plus at most one new [`Memory`]
/// tagged with origin `chat` and a fresh id and timestamp.  Requirements on
/// the payload:
/// - `content` must be a non-empty string after trimming;
/// - `weight` is clamped to [0, 1] and defaults to 0.5 when absent or
///   non-numeric.
///
/// A missing tag or malformed payload yields no memory without raising.
pub fn extract_memory_tag(raw: &str) -> (String, Option<Memory>) {
    let Some(open) = raw.find(MEMORY_OPEN_TAG) else {
        return (raw.trim().to_string(), None);
    };
    let after = &raw[open + MEMORY_OPEN_TAG.len()..];
    let Some(close) = after.find(MEMORY_CLOSE_TAG) else {
        // Unterminated tag: leave the text alone rather than guessing.
        return (raw.trim().to_string(), None);
    };

    let memory = parse_memory_payload(&after[..close]);

    // The block is stripped even when the payload failed to parse — a broken
    // tag is still not something to show the user.
    let mut cleaned = String::with_capacity(raw.len());
    cleaned.push_str(&raw[..open]);
    cleaned.push_str(&after[close + MEMORY_CLOSE_TAG.len()..]);
    (cleaned.trim().to_string(), memory)
}

fn parse_memory_payload(inner: &str) -> Option<Memory> {
    let value: serde_json::Value = serde_json::from_str(inner.trim()).ok()?;
    let content = value.get("content")?.as_str()?.trim();
    if content.is_empty() {
        return None;
    }
    let weight = value
        .get("weight")
        .and_then(|w| w.as_f64())
        .map(|w| w as f32)
        .unwrap_or(0.5);
    Some(Memory::new(content, MemorySource::Chat, weight))
}

// ── Tests ────────────────────────────────────────────────────────────────────
