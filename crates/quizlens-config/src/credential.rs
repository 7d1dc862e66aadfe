use serde::{Deserialize, Serialize};

/// Where the API key comes from at startup
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CredentialBootstrap {
    /// Credential file only; prompt the user when it is missing
    #[default]
    Prompt,
    /// Environment variable (or `.env`) first, then the credential file
    Environment,
}

fn default_env_var() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_accepted_prefixes() -> Vec<String> {
    vec!["sk-".to_string()]
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CredentialConfig {
    pub bootstrap: CredentialBootstrap,
    #[serde(default = "default_env_var")]
    pub env_var: String,
    #[serde(default = "default_accepted_prefixes")]
    pub accepted_prefixes: Vec<String>,
    /// Overrides the credential file location inside the app folder
    pub path: Option<String>,
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            bootstrap: CredentialBootstrap::default(),
            env_var: default_env_var(),
            accepted_prefixes: default_accepted_prefixes(),
            path: None,
        }
    }
}
