use std::time::Duration;

use async_trait::async_trait;
use quizlens_types::{Role, Turn, TurnContent};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::{ChatError, ChatProvider, ChatReply, ChatRequest, ProviderMetadata};

/// OpenAI-compatible `/v1/chat/completions` client
#[derive(Clone)]
pub struct OpenAiChat {
    client: reqwest::Client,
    api_url: String,
    model: String,
}

impl OpenAiChat {
    pub fn new(api_url: String, model: String, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ChatError::from_transport)?;

        Ok(Self {
            client,
            api_url,
            model,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiChat {
    async fn complete(
        &self,
        api_key: &str,
        request: ChatRequest<'_>,
    ) -> Result<ChatReply, ChatError> {
        if api_key.is_empty() {
            return Err(ChatError::AuthenticationError("No API key provided".to_string()));
        }

        let body = CompletionBody::new(&self.model, request);
        tracing::debug!(
            turns = request.turns.len(),
            max_tokens = request.max_tokens,
            "sending chat completion"
        );

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(ChatError::from_transport)?;

        let status = response.status();
        let text = response.text().await.map_err(ChatError::from_transport)?;

        if !status.is_success() {
            return Err(error_for_status(status, &text));
        }

        parse_completion(&text)
    }

    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            name: "openai".to_string(),
            model: self.model.clone(),
            supports_images: true,
        }
    }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    max_tokens: u32,
}

impl<'a> CompletionBody<'a> {
    fn new(model: &'a str, request: ChatRequest<'a>) -> Self {
        Self {
            model,
            messages: request.turns.iter().map(WireMessage::from).collect(),
            max_tokens: request.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: Role,
    content: WireContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<WirePart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: WireImageUrl<'a> },
}

#[derive(Serialize)]
struct WireImageUrl<'a> {
    url: String,
    detail: &'a str,
}

impl<'a> From<&'a Turn> for WireMessage<'a> {
    fn from(turn: &'a Turn) -> Self {
        let content = match &turn.content {
            TurnContent::Text(text) => WireContent::Text(text),
            TurnContent::TextWithImage { text, image } => WireContent::Parts(vec![
                WirePart::Text { text },
                WirePart::ImageUrl {
                    image_url: WireImageUrl {
                        url: image.data_url(),
                        detail: &image.detail,
                    },
                },
            ]),
        };

        Self {
            role: turn.role,
            content,
        }
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    model: Option<String>,
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

fn parse_completion(body: &str) -> Result<ChatReply, ChatError> {
    let parsed: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| ChatError::ApiError(format!("Failed to parse response: {}", e)))?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.trim().is_empty())
        .ok_or(ChatError::EmptyReply)?;

    Ok(ChatReply {
        text,
        model: parsed.model.unwrap_or_default(),
        tokens_used: parsed.usage.and_then(|u| u.total_tokens),
    })
}

fn error_for_status(status: StatusCode, body: &str) -> ChatError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string());

    match status.as_u16() {
        401 | 403 => ChatError::AuthenticationError(message),
        429 => ChatError::RateLimitExceeded,
        408 | 504 => ChatError::Timeout,
        _ => ChatError::ApiError(format!("HTTP {}: {}", status, message)),
    }
}
