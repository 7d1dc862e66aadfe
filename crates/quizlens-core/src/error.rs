use quizlens_chat::ChatError;

use crate::credential::CredentialError;

/// How a failed user action should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Something this machine cannot do
    CapabilityMissing,
    /// Worth retrying by hand
    Transient,
    /// Route to credential setup
    Credential,
    Unexpected,
}

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error("Please capture a question first")]
    NoImage,

    #[error("Analyze the captured question first")]
    NoSession,

    #[error("Capture failed: {0:#}")]
    Capture(anyhow::Error),

    #[error("Failed to encode image: {0:#}")]
    Encode(anyhow::Error),

    #[error("Model {model} ({provider}) does not accept images")]
    ImagesUnsupported { provider: String, model: String },

    #[error(transparent)]
    Chat(#[from] ChatError),
}

impl FlowError {
    pub fn class(&self) -> FailureClass {
        match self {
            FlowError::Credential(CredentialError::Io(_)) => FailureClass::Unexpected,
            FlowError::Credential(_) => FailureClass::Credential,
            FlowError::NoImage | FlowError::NoSession => FailureClass::Transient,
            FlowError::Capture(e) if is_capability_missing(e) => FailureClass::CapabilityMissing,
            FlowError::Capture(_) => FailureClass::Transient,
            FlowError::Encode(_) => FailureClass::Unexpected,
            FlowError::ImagesUnsupported { .. } => FailureClass::CapabilityMissing,
            FlowError::Chat(e) if e.is_authentication() => FailureClass::Credential,
            FlowError::Chat(
                ChatError::NetworkError(_) | ChatError::Timeout | ChatError::RateLimitExceeded,
            ) => FailureClass::Transient,
            FlowError::Chat(_) => FailureClass::Unexpected,
        }
    }
}

/// Marker error for "this machine can't do that"
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct Unsupported(pub String);

fn is_capability_missing(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<Unsupported>())
}
