use serde::{Deserialize, Serialize};

fn default_api_url() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_model() -> String {
    "gpt-4o".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout_seconds() -> u64 {
    60
}

fn default_image_detail() -> String {
    "high".to_string()
}

fn default_system_prompt() -> String {
    "You are a highly knowledgeable AI assistant. Analyze the image provided and:\n\
     1. Identify the type of question or content\n\
     2. Provide a clear, detailed explanation\n\
     3. If it's a question, provide the answer or solution\n\
     4. If relevant, explain the reasoning or methodology\n\
     Be thorough but concise in your responses."
        .to_string()
}

fn default_analyze_prompt() -> String {
    "Please analyze this image and help me understand it.".to_string()
}

fn default_placeholder() -> String {
    "Type your question here...".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ChatConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_image_detail")]
    pub image_detail: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Text sent alongside the captured image
    #[serde(default = "default_analyze_prompt")]
    pub analyze_prompt: String,
    /// Input equal to this is treated as empty
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_seconds: default_timeout_seconds(),
            image_detail: default_image_detail(),
            system_prompt: default_system_prompt(),
            analyze_prompt: default_analyze_prompt(),
            placeholder: default_placeholder(),
        }
    }
}
