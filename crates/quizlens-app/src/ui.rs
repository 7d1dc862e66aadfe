use kanal::{AsyncReceiver, AsyncSender};
use quizlens_types::{AppEvent, StatusLevel};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiMode {
    Chat,
    Scan,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Capture,
    Analyze,
    Clear,
    Key,
    Help,
    Quit,
    Message(String),
    Unknown(String),
}

/// `None` for a blank line
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let command = match line {
        "/capture" | "/c" => Command::Capture,
        "/analyze" | "/help-me" | "/a" => Command::Analyze,
        "/clear" => Command::Clear,
        "/key" => Command::Key,
        "/help" | "/?" => Command::Help,
        "/quit" | "/exit" | "/q" => Command::Quit,
        other if other.starts_with('/') => Command::Unknown(other.to_string()),
        other => Command::Message(other.to_string()),
    };
    Some(command)
}

#[derive(Debug, PartialEq)]
pub enum UiAction {
    Send(AppEvent),
    Print(String),
    Quit,
    Nothing,
}

/// Terminal front end state, kept free of I/O
pub struct Terminal {
    mode: UiMode,
    awaiting_key: bool,
}

impl Terminal {
    pub fn new(mode: UiMode) -> Self {
        Self {
            mode,
            awaiting_key: false,
        }
    }

    pub fn awaiting_key(&self) -> bool {
        self.awaiting_key
    }

    pub fn help(&self) -> String {
        match self.mode {
            UiMode::Chat => [
                "Commands:",
                "  /capture   snip a question (also Ctrl+Shift+Q)",
                "  /analyze   ask for help with the captured question",
                "  /clear     restart the chat about the same question",
                "  /key       enter a new API key",
                "  /quit      exit",
                "Anything else is sent as a follow-up message.",
            ]
            .join("\n"),
            UiMode::Scan => "Scanning. /quit to stop.".to_string(),
        }
    }

    pub fn on_line(&mut self, line: &str) -> UiAction {
        let Some(command) = parse_command(line) else {
            return UiAction::Nothing;
        };

        match command {
            Command::Quit => return UiAction::Quit,
            Command::Help => return UiAction::Print(self.help()),
            _ => {}
        }

        if self.mode == UiMode::Scan {
            return UiAction::Print(self.help());
        }

        if self.awaiting_key {
            return match command {
                Command::Message(key) => UiAction::Send(AppEvent::CredentialSubmitted(key)),
                _ => UiAction::Print("Enter your API key first.".to_string()),
            };
        }

        match command {
            Command::Capture => UiAction::Send(AppEvent::CaptureRequested),
            Command::Analyze => UiAction::Send(AppEvent::AnalyzeRequested),
            Command::Clear => UiAction::Send(AppEvent::ClearChat),
            Command::Key => {
                self.awaiting_key = true;
                UiAction::Print("Paste your API key:".to_string())
            }
            Command::Message(text) => UiAction::Send(AppEvent::ChatInput(text)),
            Command::Unknown(cmd) => UiAction::Print(format!("Unknown command {cmd}, try /help")),
            Command::Quit | Command::Help => UiAction::Nothing,
        }
    }

    /// Text to show for an app event, if any
    pub fn on_event(&mut self, event: AppEvent) -> Option<String> {
        match event {
            AppEvent::StatusUpdate { message, level } => {
                let tag = match level {
                    StatusLevel::Info => "info",
                    StatusLevel::Success => "ok",
                    StatusLevel::Warning => "warn",
                    StatusLevel::Error => "error",
                };
                Some(format!("[{tag}] {message}"))
            }
            AppEvent::ImageCaptured {
                width,
                height,
                discarded_turns,
            } => {
                let mut text = format!("Captured a {width}x{height} image.");
                if discarded_turns > 0 {
                    text.push_str(" The previous chat was cleared.");
                }
                text.push_str(" Type /analyze to get help.");
                Some(text)
            }
            AppEvent::AssistantReply(reply) => Some(format!("\n{reply}\n")),
            AppEvent::CredentialRequired { reason } => {
                self.awaiting_key = true;
                Some(format!("{reason}. Paste your API key:"))
            }
            AppEvent::BackendReady => {
                self.awaiting_key = false;
                Some("Ready. /capture to snip a question, /help for commands.".to_string())
            }
            AppEvent::ScanReport {
                changed: true,
                recognized_text,
                marker_count,
            } => Some(format!(
                "New question saved ({marker_count} options detected)\n{recognized_text}"
            )),
            AppEvent::ScanReport { changed: false, .. } => None,
            AppEvent::CaptureRequested
            | AppEvent::AnalyzeRequested
            | AppEvent::ClearChat
            | AppEvent::ChatInput(_)
            | AppEvent::CredentialSubmitted(_) => None,
        }
    }
}

pub async fn ui_loop(
    app_to_ui_rx: AsyncReceiver<AppEvent>,
    ui_to_app_tx: AsyncSender<AppEvent>,
    mode: UiMode,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let mut terminal = Terminal::new(mode);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", terminal.help());

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = app_to_ui_rx.recv() => {
                if let Some(text) = terminal.on_event(event?) {
                    println!("{text}");
                }
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("stdin closed");
                    cancel.cancel();
                    break;
                };

                match terminal.on_line(&line) {
                    UiAction::Send(event) => ui_to_app_tx.send(event).await?,
                    UiAction::Print(text) => println!("{text}"),
                    UiAction::Quit => {
                        cancel.cancel();
                        break;
                    }
                    UiAction::Nothing => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!(parse_command("  "), None);
        assert_eq!(parse_command("/capture"), Some(Command::Capture));
        assert_eq!(parse_command(" /quit "), Some(Command::Quit));
        assert_eq!(parse_command("/nope"), Some(Command::Unknown("/nope".into())));
        assert_eq!(
            parse_command("why is B wrong?"),
            Some(Command::Message("why is B wrong?".into()))
        );
    }

    #[test]
    fn key_entry_blocks_other_commands() {
        let mut terminal = Terminal::new(UiMode::Chat);
        terminal.on_event(AppEvent::CredentialRequired {
            reason: "No API key configured".into(),
        });
        assert!(terminal.awaiting_key());

        assert!(matches!(terminal.on_line("/capture"), UiAction::Print(_)));
        assert_eq!(
            terminal.on_line("sk-abc"),
            UiAction::Send(AppEvent::CredentialSubmitted("sk-abc".into()))
        );
        assert_eq!(terminal.on_line("/quit"), UiAction::Quit);

        terminal.on_event(AppEvent::BackendReady);
        assert!(!terminal.awaiting_key());
        assert_eq!(terminal.on_line("/capture"), UiAction::Send(AppEvent::CaptureRequested));
    }

    #[test]
    fn plain_text_is_chat_input() {
        let mut terminal = Terminal::new(UiMode::Chat);
        assert_eq!(
            terminal.on_line("and option C?"),
            UiAction::Send(AppEvent::ChatInput("and option C?".into()))
        );
        assert_eq!(terminal.on_line("/clear"), UiAction::Send(AppEvent::ClearChat));
    }

    #[test]
    fn scan_mode_shows_only_changes() {
        let mut terminal = Terminal::new(UiMode::Scan);
        assert!(matches!(terminal.on_line("/capture"), UiAction::Print(_)));

        let quiet = terminal.on_event(AppEvent::ScanReport {
            changed: false,
            recognized_text: "same".into(),
            marker_count: 4,
        });
        assert!(quiet.is_none());

        let shown = terminal
            .on_event(AppEvent::ScanReport {
                changed: true,
                recognized_text: "What is 2+2?".into(),
                marker_count: 4,
            })
            .unwrap();
        assert!(shown.contains("4 options") && shown.contains("What is 2+2?"));
    }
}
