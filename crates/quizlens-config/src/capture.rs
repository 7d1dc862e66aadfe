use serde::{Deserialize, Serialize};

fn default_snip_settle_ms() -> u64 {
    500
}

fn default_clipboard_poll_ms() -> u64 {
    250
}

fn default_clipboard_timeout_ms() -> u64 {
    30_000
}

fn default_hotkey_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct CaptureConfig {
    /// Delay between launching the snipping tool and the first clipboard poll
    #[serde(default = "default_snip_settle_ms")]
    pub snip_settle_ms: u64,
    #[serde(default = "default_clipboard_poll_ms")]
    pub clipboard_poll_ms: u64,
    /// Give up waiting for a snip after this long
    #[serde(default = "default_clipboard_timeout_ms")]
    pub clipboard_timeout_ms: u64,
    /// Register Ctrl+Shift+Q as a global capture hotkey
    #[serde(default = "default_hotkey_enabled")]
    pub hotkey_enabled: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snip_settle_ms: default_snip_settle_ms(),
            clipboard_poll_ms: default_clipboard_poll_ms(),
            clipboard_timeout_ms: default_clipboard_timeout_ms(),
            hotkey_enabled: default_hotkey_enabled(),
        }
    }
}
