//! Generic runtime.
//!
//! Drives the [`App`] and the [`Session`] from two inputs: user lines from a
//! [`Driver`] and notifications from a [`SerialTransport`]. Session actions
//! are executed against the transport here, and only here.

use std::collections::VecDeque;

use ledwire_core::{
    SerialEvent, SerialTransport, Session, SessionAction, SessionConfig, SessionError,
    SessionState,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{App, AppAction, AppEvent, ConnectionStatus, Driver};

/// Errors that stop the runtime.
///
/// Transport and session failures are shown to the user and do not end up
/// here.
#[derive(Debug, Error)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// The frontend failed.
    #[error("driver error: {0}")]
    Driver(#[source] E),
}

/// Orchestration loop.
pub struct Runtime<D, T> {
    driver: D,
    transport: T,
    session: Session,
    app: App,
    needs_render: bool,
}

impl<D, T> Runtime<D, T>
where
    D: Driver,
    T: SerialTransport,
{
    /// Create a runtime with an idle session.
    pub fn new(driver: D, transport: T, config: SessionConfig) -> Self {
        Self {
            driver,
            transport,
            session: Session::new(config),
            app: App::new(),
            needs_render: true,
        }
    }

    /// Application state.
    pub fn app(&self) -> &App {
        &self.app
    }

    /// Session state machine.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Frontend driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run until the user quits, input ends, or the transport shuts down.
    ///
    /// The active device is disconnected on the way out.
    pub async fn run(&mut self) -> Result<(), RuntimeError<D::Error>> {
        let result = self.run_loop().await;

        let actions = self.session.disconnect();
        self.execute(actions).await;
        self.driver.stop();

        result
    }

    async fn run_loop(&mut self) -> Result<(), RuntimeError<D::Error>> {
        loop {
            self.flush_render()?;

            if self.app.should_quit() {
                return Ok(());
            }

            // Device traffic first, so replies to one command are handled
            // before the next command is read.
            tokio::select! {
                biased;

                event = self.transport.next_event() => match event {
                    Some(event) => self.handle_serial(event).await,
                    None => {
                        info!("transport closed");
                        return Ok(());
                    },
                },

                input = self.driver.poll_input() => match input.map_err(RuntimeError::Driver)? {
                    Some(line) => self.handle_input(line).await?,
                    None => {
                        debug!("input closed");
                        return Ok(());
                    },
                },
            }
        }
    }

    async fn handle_serial(&mut self, event: SerialEvent) {
        let actions = self.session.handle(event);
        self.execute(actions).await;
    }

    fn flush_render(&mut self) -> Result<(), RuntimeError<D::Error>> {
        if self.needs_render {
            self.driver.render(&self.app).map_err(RuntimeError::Driver)?;
            self.needs_render = false;
        }
        Ok(())
    }

    async fn handle_input(&mut self, line: String) -> Result<(), RuntimeError<D::Error>> {
        let actions = self.app.handle(AppEvent::Input(line));
        for action in actions {
            self.handle_app_action(action).await?;
        }
        self.sync_status();
        Ok(())
    }

    async fn handle_app_action(&mut self, action: AppAction) -> Result<(), RuntimeError<D::Error>> {
        match action {
            AppAction::Render => self.needs_render = true,
            AppAction::Quit => {},
            AppAction::Search => {
                if self.reject_busy_search() {
                    return Ok(());
                }
                // Show "searching" before enumeration blocks.
                self.flush_render()?;
                self.search().await;
            },
            AppAction::SendCommand(command) => {
                let result = self.session.send_command(command);
                self.after_send(result).await;
            },
            AppAction::SendText { text } => {
                let result = self.session.send_text(&text);
                self.after_send(result).await;
            },
            AppAction::Disconnect => {
                let actions = self.session.disconnect();
                self.execute(actions).await;
            },
        }
        Ok(())
    }

    /// Alert and return `true` when a device is already connecting or open.
    fn reject_busy_search(&mut self) -> bool {
        match self.session.state() {
            SessionState::Idle => false,
            SessionState::Connecting { .. } => {
                self.alert("Already connecting", String::new());
                true
            },
            SessionState::Connected { .. } => {
                let name = self.session.device().map_or("Unnamed device", |d| d.display_name());
                let name = name.to_string();
                self.alert("Already connected", name);
                true
            },
        }
    }

    async fn search(&mut self) {
        let devices = match self.transport.list_devices().await {
            Ok(devices) => devices,
            Err(e) => {
                warn!(error = %e, "device enumeration failed");
                self.alert("Failed to connect", e.to_string());
                return;
            },
        };

        debug!(count = devices.len(), "enumerated devices");
        match self.session.search(&devices) {
            Ok(actions) => self.execute(actions).await,
            Err(SessionError::NoSupportedDevice) => {
                self.alert("No supported USB device found.", String::new());
            },
            Err(e) => self.alert("Search failed", e.to_string()),
        }
    }

    async fn after_send(&mut self, result: Result<Vec<SessionAction>, SessionError>) {
        match result {
            Ok(actions) => self.execute(actions).await,
            Err(SessionError::NotConnected) => {
                self.alert("Not connected", "Please connect a device first.".into());
            },
            Err(e) => self.alert("Failed to send", e.to_string()),
        }
    }

    /// Execute session actions, including any that execution itself produces.
    async fn execute(&mut self, actions: Vec<SessionAction>) {
        let mut queue = VecDeque::from(actions);

        while let Some(action) = queue.pop_front() {
            match action {
                SessionAction::Connect { device_id, params } => {
                    let opened = match params.validate() {
                        Ok(()) => self
                            .transport
                            .connect(device_id, &params)
                            .await
                            .map_err(|e| e.to_string()),
                        Err(e) => Err(e.to_string()),
                    };

                    match opened {
                        Ok(()) => match self.session.connect_succeeded(device_id) {
                            Ok(more) => queue.extend(more),
                            Err(e) => warn!(device_id, error = %e, "stale connect result"),
                        },
                        Err(reason) => {
                            queue.extend(self.session.connect_failed(device_id, &reason));
                        },
                    }
                },
                SessionAction::Disconnect { device_id } => {
                    if let Err(e) = self.transport.disconnect(device_id).await {
                        warn!(device_id, error = %e, "disconnect failed");
                    }
                },
                SessionAction::Write { device_id, interface, data } => {
                    if let Err(e) = self.transport.write(device_id, interface, &data).await {
                        warn!(device_id, interface, error = %e, "write failed");
                        self.alert("Failed to send", e.to_string());
                    }
                },
                SessionAction::DeliverLine { source, line } => {
                    info!(%source, %line, "received");
                    self.apply(AppEvent::LineReceived { source, line });
                },
                SessionAction::Alert { title, message } => self.alert(&title, message),
            }
        }

        self.sync_status();
    }

    fn sync_status(&mut self) {
        let status = match self.session.state() {
            SessionState::Idle => ConnectionStatus::Disconnected,
            SessionState::Connecting { .. } => ConnectionStatus::Connecting,
            SessionState::Connected { .. } => ConnectionStatus::Connected {
                name: self
                    .session
                    .device()
                    .map_or("Unnamed device", |device| device.display_name())
                    .to_string(),
            },
        };
        self.apply(AppEvent::StatusChanged(status));
    }

    fn alert(&mut self, title: &str, message: String) {
        self.apply(AppEvent::Alert { title: title.to_string(), message });
    }

    fn apply(&mut self, event: AppEvent) {
        if self.app.handle(event).contains(&AppAction::Render) {
            self.needs_render = true;
        }
    }
}
