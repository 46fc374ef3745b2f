//! Application state machine.
//!
//! Holds what a frontend needs to draw: connection status, recent lines from
//! the device, and alerts. It never touches the session or the transport; it
//! only turns input into [`AppAction`]s.

use std::collections::VecDeque;

use crate::{
    action::AppAction,
    commands::{self, Command},
    event::AppEvent,
    state::{Alert, ConnectionStatus, ReceivedLine},
};

/// Received lines kept for display.
pub const MAX_HISTORY: usize = 256;

/// Alerts kept for display.
pub const MAX_ALERTS: usize = 32;

/// Application state.
#[derive(Debug, Clone, Default)]
pub struct App {
    status: ConnectionStatus,
    history: VecDeque<ReceivedLine>,
    alerts: VecDeque<Alert>,
    lines_received: u64,
    alerts_raised: u64,
    should_quit: bool,
}

impl App {
    /// Create an empty app.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current connection status.
    pub fn status(&self) -> &ConnectionStatus {
        &self.status
    }

    /// Received lines, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &ReceivedLine> {
        self.history.iter()
    }

    /// Alerts, oldest first.
    pub fn alerts(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// Most recent alert.
    pub fn last_alert(&self) -> Option<&Alert> {
        self.alerts.back()
    }

    /// Lines received since start, including ones dropped from history.
    pub fn lines_received(&self) -> u64 {
        self.lines_received
    }

    /// Alerts raised since start, including ones dropped from the list.
    pub fn alerts_raised(&self) -> u64 {
        self.alerts_raised
    }

    /// True once the user asked to quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Process an event.
    pub fn handle(&mut self, event: AppEvent) -> Vec<AppAction> {
        match event {
            AppEvent::Input(input) => self.handle_input(&input),
            AppEvent::LineReceived { source, line } => {
                if self.history.len() == MAX_HISTORY {
                    self.history.pop_front();
                }
                self.history.push_back(ReceivedLine { source, line });
                self.lines_received += 1;
                vec![AppAction::Render]
            },
            AppEvent::Alert { title, message } => {
                self.push_alert(title, message);
                vec![AppAction::Render]
            },
            AppEvent::StatusChanged(status) => {
                if self.status == status {
                    return Vec::new();
                }
                self.status = status;
                vec![AppAction::Render]
            },
        }
    }

    fn handle_input(&mut self, input: &str) -> Vec<AppAction> {
        match commands::parse(input) {
            Command::Search => {
                self.status = ConnectionStatus::Searching;
                vec![AppAction::Render, AppAction::Search]
            },
            Command::Led(command) => vec![AppAction::SendCommand(command)],
            Command::Send { text } if text.is_empty() => Vec::new(),
            Command::Send { text } => vec![AppAction::SendText { text }],
            Command::Disconnect => vec![AppAction::Disconnect],
            Command::Quit => {
                self.should_quit = true;
                vec![AppAction::Quit]
            },
            Command::Unknown { input } => {
                self.push_alert("Unknown command".into(), input);
                vec![AppAction::Render]
            },
            Command::InvalidArgs { command, error } => {
                self.push_alert(format!("/{command}"), error);
                vec![AppAction::Render]
            },
        }
    }

    fn push_alert(&mut self, title: String, message: String) {
        if self.alerts.len() == MAX_ALERTS {
            self.alerts.pop_front();
        }
        self.alerts.push_back(Alert { title, message });
        self.alerts_raised += 1;
    }
}

#[cfg(test)]
mod tests {
    use ledwire_core::SourceId;
    use ledwire_proto::LedCommand;

    use super::*;

    #[test]
    fn search_input_sets_searching() {
        let mut app = App::new();
        let actions = app.handle(AppEvent::Input("/search".into()));
        assert_eq!(actions, vec![AppAction::Render, AppAction::Search]);
        assert_eq!(app.status(), &ConnectionStatus::Searching);
    }

    #[test]
    fn led_input_becomes_command() {
        let mut app = App::new();
        assert_eq!(
            app.handle(AppEvent::Input("/on".into())),
            vec![AppAction::SendCommand(LedCommand::On)]
        );
    }

    #[test]
    fn empty_input_does_nothing() {
        let mut app = App::new();
        assert!(app.handle(AppEvent::Input(String::new())).is_empty());
    }

    #[test]
    fn quit_sets_flag() {
        let mut app = App::new();
        assert_eq!(app.handle(AppEvent::Input("/q".into())), vec![AppAction::Quit]);
        assert!(app.should_quit());
    }

    #[test]
    fn unknown_command_alerts() {
        let mut app = App::new();
        app.handle(AppEvent::Input("/blink".into()));
        let alert = app.last_alert().unwrap();
        assert_eq!(alert.title, "Unknown command");
        assert_eq!(alert.message, "/blink");
    }

    #[test]
    fn history_is_bounded() {
        let mut app = App::new();
        let source = SourceId::new(1, 1);
        for i in 0..MAX_HISTORY + 10 {
            app.handle(AppEvent::LineReceived { source, line: i.to_string() });
        }
        assert_eq!(app.history().count(), MAX_HISTORY);
        assert_eq!(app.history().next().map(|l| l.line.as_str()), Some("10"));
        assert_eq!(app.lines_received(), (MAX_HISTORY + 10) as u64);
    }

    #[test]
    fn unchanged_status_skips_render() {
        let mut app = App::new();
        assert!(app.handle(AppEvent::StatusChanged(ConnectionStatus::Disconnected)).is_empty());
        assert_eq!(
            app.handle(AppEvent::StatusChanged(ConnectionStatus::Connecting)),
            vec![AppAction::Render]
        );
    }
}
