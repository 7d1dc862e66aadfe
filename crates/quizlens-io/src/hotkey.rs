use anyhow::{Context, Result};
use global_hotkey::{
    GlobalHotKeyEvent, GlobalHotKeyManager,
    hotkey::{Code, HotKey, Modifiers},
};
#[cfg(target_os = "linux")]
use quizlens_core::error::Unsupported;

pub struct HotkeyManager {
    manager: GlobalHotKeyManager,
    hotkey: HotKey,
}

impl HotkeyManager {
    /// Ctrl+Shift+Q, the capture shortcut
    pub fn new() -> Result<Self> {
        Self::with_hotkey(Modifiers::CONTROL | Modifiers::SHIFT, Code::KeyQ)
    }

    pub fn with_hotkey(modifiers: Modifiers, code: Code) -> Result<Self> {
        // the X11 backend crashes instead of failing without a display
        #[cfg(target_os = "linux")]
        if std::env::var_os("DISPLAY").is_none_or(|d| d.is_empty()) {
            return Err(Unsupported("No X display for global hotkeys".to_string()).into());
        }

        let manager = GlobalHotKeyManager::new().context("Failed to create hotkey manager")?;

        let hotkey = HotKey::new(Some(modifiers), code);

        manager
            .register(hotkey)
            .context("Failed to register hotkey")?;

        Ok(Self { manager, hotkey })
    }

    /// Check if the hotkey was pressed (non-blocking)
    pub fn poll(&self) -> bool {
        let receiver = GlobalHotKeyEvent::receiver();
        match receiver.try_recv() {
            Ok(event) if event.id == self.hotkey.id() => {
                // press and release both arrive as events
                event.state == global_hotkey::HotKeyState::Pressed
            }
            Ok(event) => {
                tracing::debug!("Ignoring hotkey event {:?}", event.id);
                false
            }
            Err(_) => false,
        }
    }

    pub fn id(&self) -> u32 {
        self.hotkey.id()
    }
}

impl Drop for HotkeyManager {
    fn drop(&mut self) {
        let _ = self.manager.unregister(self.hotkey);
    }
}
