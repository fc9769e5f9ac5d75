//! services/api/src/adapters/notes_llm.rs
//!
//! This module contains the adapter for the Note-Generating LLM.
//! It implements the `NoteGenerationService` port from the `core` crate against
//! any OpenAI-compatible chat-completion endpoint (Groq by default).

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;
use study_notes_core::{
    ports::{NoteGenerationService, PortError, PortResult},
    prompt::NotePrompt,
};
use tracing::{error, info};

/// Sampling temperature used for every generation.
pub const NOTES_TEMPERATURE: f32 = 0.7;
/// Hard cap on generated tokens.
pub const NOTES_MAX_TOKENS: u32 = 1500;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `NoteGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiNotesAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiNotesAdapter {
    /// Creates a new `OpenAiNotesAdapter` around an existing client.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    /// Builds the client for an OpenAI-compatible endpoint and wraps it.
    ///
    /// The client's built-in retry loop is switched off: it would otherwise
    /// resend rate-limited and 5xx requests for up to 15 minutes.
    pub fn connect(api_key: &str, base_url: &str, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        let client = Client::with_config(config).with_backoff(no_retry());
        Self::new(client, model)
    }
}

/// A backoff policy whose first `next_backoff` already gives up.
fn no_retry() -> backoff::ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

//=========================================================================================
// `NoteGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl NoteGenerationService for OpenAiNotesAdapter {
    /// Sends a single completion request. No retries: a failure is returned
    /// to the caller as is, classified as transient or permanent.
    async fn generate_notes(&self, prompt: &NotePrompt) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(prompt.system.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt.user.as_str())
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(NOTES_TEMPERATURE)
            .max_tokens(NOTES_MAX_TOKENS)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error if it occurs, which respects the orphan rule.
        let response = self.client.chat().create(request).await.map_err(|e| {
            error!("Note generation request failed: {}", e);
            classify_openai_error(e)
        })?;

        if let Some(usage) = &response.usage {
            info!(
                "Completion service reported {} prompt / {} completion tokens.",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        // Extract the text content from the first choice in the response.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty());

        content.ok_or_else(|| {
            PortError::Rejected("Note generation LLM response contained no text content.".to_string())
        })
    }
}

const TRANSIENT_MARKERS: [&str; 8] = [
    "rate_limit",
    "rate limit",
    "too many requests",
    "overloaded",
    "server_error",
    "unavailable",
    "timeout",
    "bad gateway",
];

fn has_transient_marker(text: &str) -> bool {
    let text = text.to_ascii_lowercase();
    TRANSIENT_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Splits client errors into retry-later (network, rate limits, overloaded
/// upstream, any 5xx) and everything else.
pub fn classify_openai_error(err: OpenAIError) -> PortError {
    match err {
        OpenAIError::Reqwest(e) => PortError::Unavailable(e.to_string()),
        OpenAIError::ApiError(api) => classify_api_error(&api),
        // A non-JSON error body on a 4xx, e.g. a proxy's plain-text 429 page.
        OpenAIError::JSONDeserialize(e, content) if has_transient_marker(&content) => {
            PortError::Unavailable(format!("{}: {}", e, content))
        }
        other => PortError::Unexpected(other.to_string()),
    }
}

fn classify_api_error(api: &ApiError) -> PortError {
    // 5xx bodies are never parsed, so they arrive with the raw body as the
    // message and no `type`.
    let Some(kind) = api.r#type.as_deref() else {
        return PortError::Unavailable(api.message.clone());
    };

    if has_transient_marker(kind) || has_transient_marker(&api.message) {
        PortError::Unavailable(api.message.clone())
    } else {
        PortError::Rejected(api.message.clone())
    }
}
