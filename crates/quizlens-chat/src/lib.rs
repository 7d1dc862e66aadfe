use quizlens_types::Turn;

mod openai;

pub use openai::OpenAiChat;

/// Chat-completion provider interface
///
/// Providers are stateless: every call carries the whole conversation.
#[async_trait::async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the ordered turns and return the single assistant reply
    async fn complete(
        &self,
        api_key: &str,
        request: ChatRequest<'_>,
    ) -> Result<ChatReply, ChatError>;

    /// Provider metadata
    fn metadata(&self) -> ProviderMetadata;
}

#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub turns: &'a [Turn],
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub model: String,
    pub tokens_used: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct ProviderMetadata {
    pub name: String,
    pub model: String,
    pub supports_images: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Provider returned an empty reply")]
    EmptyReply,
}

impl ChatError {
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout
        } else {
            ChatError::NetworkError(err)
        }
    }

    /// Whether the failure should send the user back to credential setup
    pub fn is_authentication(&self) -> bool {
        match self {
            ChatError::AuthenticationError(_) => true,
            ChatError::ApiError(message) => mentions_credential(message),
            _ => false,
        }
    }
}

/// Error text that looks like a bad or missing key
pub fn mentions_credential(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("api key") || lower.contains("authentication")
}
