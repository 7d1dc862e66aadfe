pub mod clipboard;
pub mod grabber;
pub mod hotkey;
pub mod snip;

pub use grabber::SnipClipboardGrabber;
pub use hotkey::HotkeyManager;
