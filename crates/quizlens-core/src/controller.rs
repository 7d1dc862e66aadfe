use std::sync::Arc;

use quizlens_chat::{ChatProvider, ChatRequest};
use quizlens_config::chat::ChatConfig;
use quizlens_types::{ImageAttachment, Turn};

use crate::capture::ImageGrabber;
use crate::credential::{ApiKey, CredentialError, CredentialManager};
use crate::error::FlowError;
use crate::frame::CapturedImage;
use crate::session::ConversationSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    Capturing,
    AwaitingClipboard,
    ImageReady,
    Analyzing,
    ChatReady,
    Sending,
}

/// Prompt text and request limits for the chat flow
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub system_prompt: String,
    pub analyze_prompt: String,
    pub placeholder: String,
    pub max_tokens: u32,
    pub image_detail: String,
}

impl From<&ChatConfig> for SessionSettings {
    fn from(config: &ChatConfig) -> Self {
        Self {
            system_prompt: config.system_prompt.clone(),
            analyze_prompt: config.analyze_prompt.clone(),
            placeholder: config.placeholder.clone(),
            max_tokens: config.max_tokens,
            image_detail: config.image_detail.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured {
        width: u32,
        height: u32,
        /// Turns of the conversation that the new capture replaced
        discarded_turns: usize,
    },
    NoImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Empty or placeholder input, nothing was sent
    Ignored,
    Replied(String),
}

/// Capture → analyze → chat state machine
///
/// Owns the single image slot and the conversation. Every method runs to
/// completion before the next one can start, so no two requests overlap.
pub struct SessionController {
    state: FlowState,
    image: Option<CapturedImage>,
    session: Option<ConversationSession>,
    settings: SessionSettings,
    grabber: Box<dyn ImageGrabber>,
    provider: Arc<dyn ChatProvider>,
    credentials: CredentialManager,
}

impl SessionController {
    pub fn new(
        settings: SessionSettings,
        grabber: Box<dyn ImageGrabber>,
        provider: Arc<dyn ChatProvider>,
        credentials: CredentialManager,
    ) -> Self {
        Self {
            state: FlowState::Idle,
            image: None,
            session: None,
            settings,
            grabber,
            provider,
            credentials,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn image(&self) -> Option<&CapturedImage> {
        self.image.as_ref()
    }

    pub fn history(&self) -> &[Turn] {
        self.session.as_ref().map(|s| s.turns()).unwrap_or(&[])
    }

    pub fn credential_ready(&self) -> bool {
        self.credentials.load().is_some()
    }

    pub fn submit_credential(&mut self, candidate: &str) -> Result<(), FlowError> {
        self.credentials.save(candidate)?;
        Ok(())
    }

    pub async fn capture(&mut self) -> Result<CaptureOutcome, FlowError> {
        self.require_key()?;

        self.state = FlowState::Capturing;
        if let Err(e) = self.grabber.launch().await {
            self.settle();
            return Err(FlowError::Capture(e));
        }

        self.state = FlowState::AwaitingClipboard;
        let grabbed = self.grabber.wait_for_image().await;

        match grabbed {
            Ok(Some(image)) => {
                let discarded_turns = self.session.take().map_or(0, |s| {
                    tracing::info!(session_id = %s.id(), turns = s.len(), "Discarding conversation for new capture");
                    s.len()
                });
                let (width, height) = (image.width(), image.height());
                self.image = Some(image);
                self.state = FlowState::ImageReady;

                Ok(CaptureOutcome::Captured {
                    width,
                    height,
                    discarded_turns,
                })
            }
            Ok(None) => {
                self.settle();
                Ok(CaptureOutcome::NoImage)
            }
            Err(e) => {
                self.settle();
                Err(FlowError::Capture(e))
            }
        }
    }

    /// Start a fresh conversation about the current image
    ///
    /// Any open conversation is dropped first.
    pub async fn analyze(&mut self) -> Result<String, FlowError> {
        let provider = self.provider.metadata();
        if !provider.supports_images {
            return Err(FlowError::ImagesUnsupported {
                provider: provider.name,
                model: provider.model,
            });
        }

        let attachment = {
            let image = self.image.as_ref().ok_or(FlowError::NoImage)?;
            let data = image.to_base64_png().map_err(FlowError::Encode)?;
            ImageAttachment::png(data, self.settings.image_detail.clone())
        };
        let key = self.require_key()?;

        self.session = None;
        let mut session = ConversationSession::start(
            &self.settings.system_prompt,
            &self.settings.analyze_prompt,
            attachment,
        );

        self.state = FlowState::Analyzing;
        tracing::info!(session_id = %session.id(), "Analyzing captured image");

        let result = self
            .provider
            .complete(
                key.expose(),
                ChatRequest {
                    turns: session.turns(),
                    max_tokens: self.settings.max_tokens,
                },
            )
            .await;

        match result {
            Ok(reply) => {
                tracing::info!(
                    session_id = %session.id(),
                    model = %reply.model,
                    tokens_used = ?reply.tokens_used,
                    "Analysis received"
                );
                session.push_assistant(reply.text.clone());
                self.session = Some(session);
                self.state = FlowState::ChatReady;
                Ok(reply.text)
            }
            Err(e) => {
                tracing::warn!(session_id = %session.id(), "Analysis failed: {}", e);
                self.settle();
                Err(e.into())
            }
        }
    }

    /// Send one follow-up message with the full history
    ///
    /// A failed request leaves the history exactly as it was.
    pub async fn send(&mut self, input: &str) -> Result<SendOutcome, FlowError> {
        let text = input.trim();
        if text.is_empty() || text == self.settings.placeholder.trim() {
            return Ok(SendOutcome::Ignored);
        }

        if self.session.is_none() {
            return Err(FlowError::NoSession);
        }
        let key = self.require_key()?;

        let Some(session) = self.session.as_mut() else {
            return Err(FlowError::NoSession);
        };
        session.push_user(text);
        self.state = FlowState::Sending;

        let result = self
            .provider
            .complete(
                key.expose(),
                ChatRequest {
                    turns: session.turns(),
                    max_tokens: self.settings.max_tokens,
                },
            )
            .await;

        self.state = FlowState::ChatReady;
        match result {
            Ok(reply) => {
                session.push_assistant(reply.text.clone());
                tracing::debug!(
                    session_id = %session.id(),
                    turns = session.len(),
                    model = %reply.model,
                    tokens_used = ?reply.tokens_used,
                    "Reply appended"
                );
                Ok(SendOutcome::Replied(reply.text))
            }
            Err(e) => {
                session.rollback_user();
                tracing::warn!(session_id = %session.id(), "Chat turn failed: {}", e);
                Err(e.into())
            }
        }
    }

    fn require_key(&self) -> Result<ApiKey, FlowError> {
        self.credentials
            .load()
            .ok_or(FlowError::Credential(CredentialError::Missing))
    }

    /// Fall back to the stable state implied by what is held
    fn settle(&mut self) {
        self.state = if self.session.is_some() {
            FlowState::ChatReady
        } else if self.image.is_some() {
            FlowState::ImageReady
        } else {
            FlowState::Idle
        };
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::Mutex;

    use anyhow::Result;
    use image::{Rgba, RgbaImage};
    use quizlens_chat::{ChatError, ChatReply, ProviderMetadata};
    use quizlens_config::credential::CredentialConfig;
    use quizlens_types::{CaptureRegion, Role};

    use super::*;
    use crate::credential::CredentialStore;
    use crate::error::FailureClass;

    fn image(width: u32, height: u32) -> CapturedImage {
        CapturedImage::new(
            CaptureRegion {
                x: 0,
                y: 0,
                width,
                height,
            },
            RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 255])),
        )
    }

    struct FakeGrabber {
        images: VecDeque<Option<CapturedImage>>,
    }

    #[async_trait::async_trait]
    impl ImageGrabber for FakeGrabber {
        async fn launch(&mut self) -> Result<()> {
            Ok(())
        }

        async fn wait_for_image(&mut self) -> Result<Option<CapturedImage>> {
            Ok(self.images.pop_front().flatten())
        }
    }

    /// Replays canned replies and records every request it saw
    #[derive(Default)]
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, ChatError>>>,
        requests: Mutex<Vec<Vec<Turn>>>,
        text_only: bool,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<String, ChatError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                ..Default::default()
            })
        }

        fn text_only() -> Arc<Self> {
            Arc::new(Self {
                text_only: true,
                ..Default::default()
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn last_request(&self) -> Vec<Turn> {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    #[async_trait::async_trait]
    impl ChatProvider for ScriptedProvider {
        async fn complete(
            &self,
            _api_key: &str,
            request: ChatRequest<'_>,
        ) -> Result<ChatReply, ChatError> {
            self.requests.lock().unwrap().push(request.turns.to_vec());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unexpected request")?;
            Ok(ChatReply {
                text: reply,
                model: "fake".into(),
                tokens_used: None,
            })
        }

        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata {
                name: "scripted".into(),
                model: "fake".into(),
                supports_images: !self.text_only,
            }
        }
    }

    fn settings() -> SessionSettings {
        SessionSettings::from(&ChatConfig::default())
    }

    fn controller(
        dir: &Path,
        images: Vec<Option<CapturedImage>>,
        provider: Arc<ScriptedProvider>,
        with_key: bool,
    ) -> SessionController {
        let credentials = CredentialManager::new(
            CredentialStore::new(dir.join("credentials.json")),
            &CredentialConfig::default(),
        );
        if with_key {
            credentials.save("sk-test").unwrap();
        }

        SessionController::new(
            settings(),
            Box::new(FakeGrabber {
                images: images.into(),
            }),
            provider,
            credentials,
        )
    }

    #[tokio::test]
    async fn capture_analyze_and_chat() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Ok("It asks 2+2".into()), Ok("The answer is 4".into())]);
        let mut ctl = controller(dir.path(), vec![Some(image(20, 10))], provider.clone(), true);

        assert_eq!(ctl.state(), FlowState::Idle);
        let outcome = ctl.capture().await.unwrap();
        assert_eq!(
            outcome,
            CaptureOutcome::Captured {
                width: 20,
                height: 10,
                discarded_turns: 0
            }
        );
        assert_eq!(ctl.state(), FlowState::ImageReady);

        assert_eq!(ctl.analyze().await.unwrap(), "It asks 2+2");
        assert_eq!(ctl.state(), FlowState::ChatReady);
        let first = provider.last_request();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].role, Role::System);
        assert!(first[1].image().is_some());

        let reply = ctl.send("What is the answer?").await.unwrap();
        assert_eq!(reply, SendOutcome::Replied("The answer is 4".into()));

        // whole ordered history is resent
        let second = provider.last_request();
        assert_eq!(second.len(), 4);
        assert_eq!(second[2], Turn::assistant("It asks 2+2"));
        assert_eq!(second[3], Turn::user("What is the answer?"));

        let roles: Vec<Role> = ctl.history().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
    }

    #[tokio::test]
    async fn empty_and_placeholder_input_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Ok("analysis".into())]);
        let mut ctl = controller(dir.path(), vec![Some(image(4, 4))], provider.clone(), true);
        ctl.capture().await.unwrap();
        ctl.analyze().await.unwrap();
        let before = ctl.history().to_vec();

        for input in ["", "   \n", "Type your question here...", "  Type your question here...  "] {
            assert_eq!(ctl.send(input).await.unwrap(), SendOutcome::Ignored);
        }

        assert_eq!(ctl.history(), before.as_slice());
        assert_eq!(provider.calls(), 1);
        assert_eq!(ctl.state(), FlowState::ChatReady);
    }

    #[tokio::test]
    async fn new_capture_discards_open_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![
            Ok("first analysis".into()),
            Ok("follow up".into()),
            Ok("second analysis".into()),
        ]);
        let mut ctl = controller(
            dir.path(),
            vec![Some(image(4, 4)), Some(image(8, 8))],
            provider.clone(),
            true,
        );

        ctl.capture().await.unwrap();
        ctl.analyze().await.unwrap();
        ctl.send("more please").await.unwrap();
        assert_eq!(ctl.history().len(), 5);

        let outcome = ctl.capture().await.unwrap();
        assert_eq!(
            outcome,
            CaptureOutcome::Captured {
                width: 8,
                height: 8,
                discarded_turns: 5
            }
        );
        assert!(ctl.history().is_empty());
        assert_eq!(ctl.state(), FlowState::ImageReady);

        ctl.analyze().await.unwrap();
        let request = provider.last_request();
        assert_eq!(request.len(), 2);
        assert!(!request.iter().any(|t| t.text() == "more please"));
    }

    #[tokio::test]
    async fn missing_clipboard_image_returns_to_previous_state() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Ok("analysis".into())]);
        let mut ctl = controller(dir.path(), vec![None, Some(image(4, 4)), None], provider, true);

        assert_eq!(ctl.capture().await.unwrap(), CaptureOutcome::NoImage);
        assert_eq!(ctl.state(), FlowState::Idle);
        assert!(ctl.image().is_none());

        ctl.capture().await.unwrap();
        ctl.analyze().await.unwrap();

        assert_eq!(ctl.capture().await.unwrap(), CaptureOutcome::NoImage);
        assert_eq!(ctl.state(), FlowState::ChatReady);
        assert_eq!(ctl.history().len(), 3);
    }

    #[tokio::test]
    async fn failed_turn_leaves_history_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![
            Ok("analysis".into()),
            Err(ChatError::Timeout),
            Ok("recovered".into()),
        ]);
        let mut ctl = controller(dir.path(), vec![Some(image(4, 4))], provider.clone(), true);
        ctl.capture().await.unwrap();
        ctl.analyze().await.unwrap();

        let err = ctl.send("hello?").await.unwrap_err();
        assert_eq!(err.class(), FailureClass::Transient);
        assert_eq!(ctl.history().len(), 3);
        assert_eq!(ctl.state(), FlowState::ChatReady);

        ctl.send("hello again").await.unwrap();
        let request = provider.last_request();
        assert_eq!(request.len(), 4);
        assert_eq!(request[3], Turn::user("hello again"));
    }

    #[tokio::test]
    async fn failed_analysis_falls_back_to_image_ready() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Err(ChatError::AuthenticationError(
            "Incorrect API key provided".into(),
        ))]);
        let mut ctl = controller(dir.path(), vec![Some(image(4, 4))], provider, true);
        ctl.capture().await.unwrap();

        let err = ctl.analyze().await.unwrap_err();
        assert_eq!(err.class(), FailureClass::Credential);
        assert_eq!(ctl.state(), FlowState::ImageReady);
        assert!(ctl.history().is_empty());
    }

    #[tokio::test]
    async fn everything_blocked_without_credential() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![Ok("analysis".into())]);
        let mut ctl = controller(dir.path(), vec![Some(image(4, 4))], provider.clone(), false);

        assert!(!ctl.credential_ready());
        let err = ctl.capture().await.unwrap_err();
        assert_eq!(err.class(), FailureClass::Credential);
        assert_eq!(ctl.state(), FlowState::Idle);

        assert!(ctl.submit_credential("not-a-key").is_err());
        assert!(!ctl.credential_ready());

        ctl.submit_credential("sk-now-valid").unwrap();
        assert!(ctl.credential_ready());
        ctl.capture().await.unwrap();
        ctl.analyze().await.unwrap();
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn analyze_and_send_need_prior_steps() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![]);
        let mut ctl = controller(dir.path(), vec![], provider.clone(), true);

        assert!(matches!(ctl.analyze().await, Err(FlowError::NoImage)));
        assert!(matches!(ctl.send("hi").await, Err(FlowError::NoSession)));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn reanalyze_restarts_conversation() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::new(vec![
            Ok("analysis".into()),
            Ok("chat".into()),
            Ok("fresh analysis".into()),
        ]);
        let mut ctl = controller(dir.path(), vec![Some(image(4, 4))], provider, true);
        ctl.capture().await.unwrap();
        ctl.analyze().await.unwrap();
        ctl.send("question").await.unwrap();

        assert_eq!(ctl.analyze().await.unwrap(), "fresh analysis");
        assert_eq!(ctl.history().len(), 3);
        assert_eq!(ctl.history()[2], Turn::assistant("fresh analysis"));
    }

    #[tokio::test]
    async fn text_only_model_refuses_analysis() {
        let dir = tempfile::tempdir().unwrap();
        let provider = ScriptedProvider::text_only();
        let mut ctl = controller(dir.path(), vec![Some(image(4, 4))], provider.clone(), true);
        ctl.capture().await.unwrap();

        let err = ctl.analyze().await.unwrap_err();
        assert!(matches!(err, FlowError::ImagesUnsupported { .. }));
        assert_eq!(err.class(), FailureClass::CapabilityMissing);
        assert_eq!(ctl.state(), FlowState::ImageReady);
        assert_eq!(provider.calls(), 0);
    }
}
