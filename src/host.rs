use crate::error::{Result, ToggleError};
use crate::events::{TriggerEvent, WindowId, WindowSnapshot, WindowState};
use crate::services::{EmulatedBadge, EmulatedWindows, WindowToggleEngine};
use crate::toggle_error;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// One line of the host command stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCommand {
    /// `open <id> <left> <top> <width> <height> [state]`
    Open(WindowSnapshot),
    /// `close <id>`: removes the emulated window and emits the removal event
    Close(WindowId),
    /// `show <id>`
    Show(WindowId),
    /// `click [id]`, `menu <item-id> [id]`, `install`, `startup`
    Trigger(TriggerEvent),
    Quit,
}

fn parse_window_id(token: Option<&str>, line: &str) -> Result<WindowId> {
    let token = token.ok_or_else(|| toggle_error!(invalid_command, "missing window id in '{}'", line))?;
    token
        .parse()
        .map_err(|_| toggle_error!(invalid_command, "bad window id '{}' in '{}'", token, line))
}

fn parse_optional_window_id(token: Option<&str>, line: &str) -> Result<Option<WindowId>> {
    match token {
        Some(_) => parse_window_id(token, line).map(Some),
        None => Ok(None),
    }
}

fn parse_number(token: Option<&str>, name: &str, line: &str) -> Result<i32> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or_else(|| toggle_error!(invalid_command, "bad or missing {} in '{}'", name, line))
}

impl FromStr for HostCommand {
    type Err = ToggleError;

    fn from_str(line: &str) -> Result<Self> {
        let mut tokens = line.split_whitespace();
        let verb = tokens
            .next()
            .ok_or_else(|| toggle_error!(invalid_command, "empty command"))?;

        let command = match verb {
            "open" => {
                let id = parse_window_id(tokens.next(), line)?;
                let left = parse_number(tokens.next(), "left", line)?;
                let top = parse_number(tokens.next(), "top", line)?;
                let width = parse_number(tokens.next(), "width", line)?;
                let height = parse_number(tokens.next(), "height", line)?;
                let state = match tokens.next() {
                    Some(state) => state
                        .parse::<WindowState>()
                        .map_err(|e| toggle_error!(invalid_command, "{} in '{}'", e, line))?,
                    None => WindowState::Normal,
                };
                HostCommand::Open(WindowSnapshot::new(id, left, top, width, height).with_state(state))
            }
            "close" => HostCommand::Close(parse_window_id(tokens.next(), line)?),
            "show" => HostCommand::Show(parse_window_id(tokens.next(), line)?),
            "click" => HostCommand::Trigger(TriggerEvent::ActionClicked {
                window_id: parse_optional_window_id(tokens.next(), line)?,
            }),
            "menu" => {
                let menu_item_id = tokens
                    .next()
                    .ok_or_else(|| toggle_error!(invalid_command, "missing menu item id in '{}'", line))?
                    .to_string();
                HostCommand::Trigger(TriggerEvent::MenuClicked {
                    menu_item_id,
                    window_id: parse_optional_window_id(tokens.next(), line)?,
                })
            }
            "install" => HostCommand::Trigger(TriggerEvent::Installed),
            "startup" => HostCommand::Trigger(TriggerEvent::Startup),
            "quit" | "exit" => HostCommand::Quit,
            other => return Err(toggle_error!(invalid_command, "unknown command '{}'", other)),
        };

        if let Some(extra) = tokens.next() {
            return Err(toggle_error!(invalid_command, "unexpected '{}' in '{}'", extra, line));
        }
        Ok(command)
    }
}

/// Drives the emulated browser from a line-oriented command stream
pub struct Host {
    windows: Arc<EmulatedWindows>,
    badge: Arc<EmulatedBadge>,
    engine: Arc<WindowToggleEngine>,
    events: mpsc::Sender<TriggerEvent>,
}

impl Host {
    pub fn new(
        windows: Arc<EmulatedWindows>,
        badge: Arc<EmulatedBadge>,
        engine: Arc<WindowToggleEngine>,
        events: mpsc::Sender<TriggerEvent>,
    ) -> Self {
        Self {
            windows,
            badge,
            engine,
            events,
        }
    }

    pub async fn emit(&self, event: TriggerEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .map_err(|e| toggle_error!(internal, "trigger surface is gone: {}", e))
    }

    /// Reads commands until EOF or `quit`. Malformed lines are logged and skipped.
    pub async fn run<R: AsyncBufRead + Unpin>(&self, reader: R) -> Result<()> {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.parse::<HostCommand>() {
                Ok(HostCommand::Quit) => break,
                Ok(command) => self.execute(command).await?,
                Err(e) => warn!("{}", e),
            }
        }
        Ok(())
    }

    async fn execute(&self, command: HostCommand) -> Result<()> {
        match command {
            HostCommand::Open(window) => self.windows.insert(window),
            HostCommand::Close(window_id) => {
                if self.windows.remove(window_id).is_none() {
                    warn!("Window {} is not open", window_id);
                }
                self.emit(TriggerEvent::WindowRemoved(window_id)).await?;
            }
            HostCommand::Show(window_id) => self.show(window_id).await,
            HostCommand::Trigger(event) => self.emit(event).await?,
            HostCommand::Quit => {}
        }
        Ok(())
    }

    async fn show(&self, window_id: WindowId) {
        let Some(window) = self.windows.snapshot(window_id) else {
            warn!("Window {} is not open", window_id);
            return;
        };
        let badge = self.badge.badge(window_id);
        match self.engine.window_state(window_id).await {
            Ok(state) => info!(
                "{} | preset: {} | badge: '{}' {}",
                window,
                state.preset_id().unwrap_or("none"),
                badge.text,
                badge.color
            ),
            Err(e) => warn!("{} | preset state unavailable: {}", window, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trigger_commands() {
        assert_eq!(
            "click 3".parse::<HostCommand>().unwrap(),
            HostCommand::Trigger(TriggerEvent::action_clicked(WindowId(3)))
        );
        assert_eq!(
            "click".parse::<HostCommand>().unwrap(),
            HostCommand::Trigger(TriggerEvent::ActionClicked { window_id: None })
        );
        assert_eq!(
            "menu preset-tablet 7".parse::<HostCommand>().unwrap(),
            HostCommand::Trigger(TriggerEvent::menu_clicked("preset-tablet", WindowId(7)))
        );
        assert_eq!("install".parse::<HostCommand>().unwrap(), HostCommand::Trigger(TriggerEvent::Installed));
        assert_eq!("close 2".parse::<HostCommand>().unwrap(), HostCommand::Close(WindowId(2)));
    }

    #[test]
    fn parses_open_with_optional_state() {
        let open = "open 5 10 20 1280 800 maximized".parse::<HostCommand>().unwrap();
        assert_eq!(
            open,
            HostCommand::Open(
                WindowSnapshot::new(WindowId(5), 10, 20, 1280, 800).with_state(WindowState::Maximized)
            )
        );

        let HostCommand::Open(window) = "open 6 0 0 800 600".parse::<HostCommand>().unwrap() else {
            panic!("expected open");
        };
        assert!(window.is_normal());
    }

    #[test]
    fn rejects_malformed_commands() {
        for line in ["", "fly 1", "click x", "open 1 2 3", "open 1 0 0 10 10 tiny", "close", "show 1 2"] {
            assert!(
                matches!(line.parse::<HostCommand>(), Err(ToggleError::InvalidCommand(_))),
                "{:?} should be rejected",
                line
            );
        }
    }

    #[tokio::test]
    async fn run_forwards_events_and_stops_at_quit() {
        use crate::config::BadgeConfig;
        use crate::services::{BoundsStore, SelectedPreset};
        use crate::services::storage::MemoryStore;

        let store = Arc::new(MemoryStore::new());
        let windows = Arc::new(EmulatedWindows::new());
        let badge = Arc::new(EmulatedBadge::new());
        let engine = Arc::new(WindowToggleEngine::new(
            BoundsStore::new(store.clone()),
            SelectedPreset::new(store),
            windows.clone(),
            badge.clone(),
            BadgeConfig::default(),
        ));
        let (tx, mut rx) = mpsc::channel(8);
        let host = Host::new(windows.clone(), badge, engine, tx);

        let script = "# demo\nopen 1 0 0 800 600\n\nclick 1\nbogus\nclose 1\nquit\nclick 1\n";
        host.run(std::io::Cursor::new(script.as_bytes())).await.unwrap();
        drop(host);

        assert_eq!(rx.recv().await, Some(TriggerEvent::action_clicked(WindowId(1))));
        assert_eq!(rx.recv().await, Some(TriggerEvent::WindowRemoved(WindowId(1))));
        assert_eq!(rx.recv().await, None);
        assert!(windows.snapshot(WindowId(1)).is_none());
    }
}
