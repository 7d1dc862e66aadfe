use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// Launch the snipping tool and wait for an image on the clipboard
    CaptureRequested,
    /// Run the initial analysis on the captured image ("Get Help")
    AnalyzeRequested,
    /// Drop the conversation and re-run the initial analysis
    ClearChat,
    ChatInput(String),
    CredentialSubmitted(String),

    StatusUpdate {
        message: String,
        level: StatusLevel,
    },
    ImageCaptured {
        width: u32,
        height: u32,
        discarded_turns: usize,
    },
    AssistantReply(String),
    CredentialRequired {
        reason: String,
    },
    ScanReport {
        changed: bool,
        recognized_text: String,
        marker_count: usize,
    },
    BackendReady,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl std::str::FromStr for CaptureRegion {
    type Err = String;

    /// Parses `x,y,width,height`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [x, y, width, height] = parts.as_slice() else {
            return Err(format!("expected x,y,width,height, got '{s}'"));
        };

        let region = CaptureRegion {
            x: x.parse().map_err(|e| format!("bad x '{x}': {e}"))?,
            y: y.parse().map_err(|e| format!("bad y '{y}': {e}"))?,
            width: width.parse().map_err(|e| format!("bad width '{width}': {e}"))?,
            height: height
                .parse()
                .map_err(|e| format!("bad height '{height}': {e}"))?,
        };

        if region.width == 0 || region.height == 0 {
            return Err("region must have a non-zero size".to_string());
        }

        Ok(region)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Inline image carried by a user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub media_type: String,
    pub base64_data: String,
    pub detail: String,
}

impl ImageAttachment {
    pub fn png(base64_data: String, detail: impl Into<String>) -> Self {
        Self {
            media_type: "image/png".to_string(),
            base64_data,
            detail: detail.into(),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.base64_data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnContent {
    Text(String),
    TextWithImage { text: String, image: ImageAttachment },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn user_with_image(text: impl Into<String>, image: ImageAttachment) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::TextWithImage {
                text: text.into(),
                image,
            },
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Text(text.into()),
        }
    }

    pub fn text(&self) -> &str {
        match &self.content {
            TurnContent::Text(text) => text,
            TurnContent::TextWithImage { text, .. } => text,
        }
    }

    pub fn image(&self) -> Option<&ImageAttachment> {
        match &self.content {
            TurnContent::Text(_) => None,
            TurnContent::TextWithImage { image, .. } => Some(image),
        }
    }
}
