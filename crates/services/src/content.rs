use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use drill_core::model::{WordCard, WordCardDraft};

use crate::error::ProviderError;

/// Number of cards in one generated batch.
pub const BATCH_SIZE: usize = 5;

/// Source of word-card batches.
///
/// The session state machine only knows this contract; the generative
/// backend behind it is interchangeable.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch one batch of validated word cards.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` on network faults, malformed payloads, or
    /// when the provider is not configured.
    async fn fetch_batch(&self) -> Result<Vec<WordCard>, ProviderError>;
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct ContentConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ContentConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("DRILL_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("DRILL_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("DRILL_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

//
// ─── HTTP ADAPTER ──────────────────────────────────────────────────────────────
//

/// Content provider backed by an OpenAI-style chat-completions endpoint.
#[derive(Clone)]
pub struct GenerativeContentProvider {
    client: Client,
    config: Option<ContentConfig>,
}

impl GenerativeContentProvider {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ContentConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ContentConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl ContentProvider for GenerativeContentProvider {
    async fn fetch_batch(&self) -> Result<Vec<WordCard>, ProviderError> {
        let config = self.config.as_ref().ok_or(ProviderError::Disabled)?;

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: batch_prompt(),
            }],
            temperature: 0.8,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ProviderError::EmptyBatch)?;

        parse_batch(&content)
    }
}

fn batch_prompt() -> String {
    format!(
        "Generate {BATCH_SIZE} English exam vocabulary cards as a JSON array. \
         Each element must have the fields: word, phonetic (IPA), meaning \
         (Chinese translation), options (exactly 4 distinct Chinese strings \
         including the meaning), mnemonic, sentence (English example), \
         sentence_translation. Reply with the JSON array only."
    )
}

/// Parse a model reply into validated cards.
///
/// Models routinely wrap JSON in a Markdown code fence; tolerate that, but
/// trust nothing else: every card goes through draft validation.
fn parse_batch(content: &str) -> Result<Vec<WordCard>, ProviderError> {
    let json = strip_code_fence(content);
    let drafts: Vec<WordCardDraft> =
        serde_json::from_str(json).map_err(|err| ProviderError::Malformed(err.to_string()))?;

    if drafts.is_empty() {
        return Err(ProviderError::EmptyBatch);
    }

    drafts
        .into_iter()
        .map(|draft| draft.validate().map_err(ProviderError::Card))
        .collect()
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag after the opening fence.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

//
// ─── WIRE TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
