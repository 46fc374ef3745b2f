//! Serial session state machine.
//!
//! Owns everything about one controller session that is not I/O: which
//! device we are talking to, one [`LineFramer`] per inbound source, and how a
//! command fans out to interfaces.
//!
//! # Architecture: Action-Based State Machine
//!
//! - Methods take transport notifications or user intents as parameters
//! - Methods return `Vec<SessionAction>` (or a `Result` of one)
//! - The runtime executes the actions (open port, write, show alert)
//!
//! # State Machine
//!
//! ```text
//!          search / attach(auto)            connect_succeeded
//! ┌──────┐ ─────────────────────> ┌────────────┐ ─────────────> ┌───────────┐
//! │ Idle │                        │ Connecting │                │ Connected │
//! └──────┘ <───────────────────── └────────────┘                └───────────┘
//!    ^        connect_failed                                          │
//!    └────────────────────────────────────────────────────────────────┘
//!                    disconnect / Disconnected / DeviceDetached
//! ```
//!
//! # Framing
//!
//! Inbound chunks from the active device are framed per `(device, interface)`
//! source from the moment a connect is issued, so data that races ahead of
//! `connect_succeeded` or of the interface's `Connected` notification is not
//! lost. Traffic from any other device is dropped. Every buffer is discarded
//! when the session ends; a half-received line never leaks into the next
//! connection.

use std::{
    collections::{BTreeSet, HashMap},
    fmt,
};

use ledwire_proto::{LedCommand, LineFramer, SerialParams, encode_message};
use tracing::{debug, info, warn};

use crate::{
    device::{DeviceId, DeviceInfo, InterfaceId, SourceId, select_supported},
    error::SessionError,
    event::{SerialEvent, SessionAction},
};

/// How devices are discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiscoveryMode {
    /// Only connect when the user searches.
    #[default]
    Manual,
    /// Connect to a device as soon as it is attached.
    Auto,
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Parameters passed to the transport on connect.
    pub params: SerialParams,
    /// Interfaces every outbound command is written to, in order.
    pub write_interfaces: Vec<InterfaceId>,
    /// Device discovery policy.
    pub discovery: DiscoveryMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            params: SerialParams::default(),
            write_interfaces: vec![1],
            discovery: DiscoveryMode::default(),
        }
    }
}

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No device selected.
    Idle,
    /// Connect issued, waiting for the transport's answer.
    Connecting {
        /// Device being opened.
        device_id: DeviceId,
    },
    /// Device open and accepting commands.
    Connected {
        /// Open device.
        device_id: DeviceId,
    },
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Connecting { device_id } => write!(f, "connecting to device {device_id}"),
            Self::Connected { device_id } => write!(f, "connected to device {device_id}"),
        }
    }
}

/// Session state machine.
///
/// Pure logic: no I/O, no clocks. One instance per controller window.
#[derive(Debug, Clone)]
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    /// Enumeration info for the active device, when we have it.
    device: Option<DeviceInfo>,
    framers: HashMap<SourceId, LineFramer>,
    attached: BTreeSet<DeviceId>,
}

impl Session {
    /// Create an idle session.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            device: None,
            framers: HashMap::new(),
            attached: BTreeSet::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// True once a device is open.
    pub fn is_connected(&self) -> bool {
        matches!(self.state, SessionState::Connected { .. })
    }

    /// Device being opened or already open.
    pub fn active_device(&self) -> Option<DeviceId> {
        match self.state {
            SessionState::Idle => None,
            SessionState::Connecting { device_id } | SessionState::Connected { device_id } => {
                Some(device_id)
            },
        }
    }

    /// Enumeration info for the active device, when it came from a search.
    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Devices the transport reported as attached and not since detached.
    pub fn attached_devices(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.attached.iter().copied()
    }

    /// Unterminated data buffered for `source`, if the source is known.
    pub fn pending(&self, source: SourceId) -> Option<&str> {
        self.framers.get(&source).map(LineFramer::pending)
    }

    /// Pick the first supported device and start connecting to it.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if a device is already connecting or connected
    /// - `NoSupportedDevice` if `devices` contains nothing usable
    pub fn search(&mut self, devices: &[DeviceInfo]) -> Result<Vec<SessionAction>, SessionError> {
        if self.state != SessionState::Idle {
            return Err(SessionError::InvalidState { state: self.state, operation: "search" });
        }

        let device = select_supported(devices).ok_or(SessionError::NoSupportedDevice)?.clone();
        debug!(device_id = device.device_id, name = device.display_name(), "selected device");
        Ok(self.begin_connect(device.device_id, Some(device)))
    }

    /// The transport opened the device we asked for.
    ///
    /// # Errors
    ///
    /// - `UnexpectedDevice` if we were connecting to a different device
    /// - `InvalidState` if no connect was in flight
    pub fn connect_succeeded(
        &mut self,
        device_id: DeviceId,
    ) -> Result<Vec<SessionAction>, SessionError> {
        match self.state {
            SessionState::Connecting { device_id: pending } if pending == device_id => {
                self.state = SessionState::Connected { device_id };
                let name = self.device.as_ref().map_or("Unnamed device", DeviceInfo::display_name);
                info!(device_id, name, "device connected");
                Ok(vec![SessionAction::alert("Device connected", name)])
            },
            SessionState::Connecting { .. } => Err(SessionError::UnexpectedDevice(device_id)),
            state => Err(SessionError::InvalidState { state, operation: "complete connect" }),
        }
    }

    /// The transport could not open the device.
    pub fn connect_failed(&mut self, device_id: DeviceId, reason: &str) -> Vec<SessionAction> {
        if self.state == (SessionState::Connecting { device_id }) {
            self.end_session();
        }
        warn!(device_id, reason, "connect failed");
        vec![SessionAction::alert("Failed to connect", reason)]
    }

    /// Write free-form text to every configured interface.
    ///
    /// # Errors
    ///
    /// - `NotConnected` unless a device is connected
    pub fn send_text(&mut self, text: &str) -> Result<Vec<SessionAction>, SessionError> {
        let SessionState::Connected { device_id } = self.state else {
            return Err(SessionError::NotConnected);
        };

        let data = encode_message(text);
        debug!(device_id, text, interfaces = ?self.config.write_interfaces, "sending");
        Ok(self
            .config
            .write_interfaces
            .iter()
            .map(|&interface| SessionAction::Write { device_id, interface, data: data.clone() })
            .collect())
    }

    /// Send an LED command.
    pub fn send_command(
        &mut self,
        command: LedCommand,
    ) -> Result<Vec<SessionAction>, SessionError> {
        self.send_text(command.as_str())
    }

    /// Close the active device, if any.
    pub fn disconnect(&mut self) -> Vec<SessionAction> {
        match self.active_device() {
            Some(device_id) => {
                self.end_session();
                vec![SessionAction::Disconnect { device_id }]
            },
            None => Vec::new(),
        }
    }

    /// Process one transport notification.
    pub fn handle(&mut self, event: SerialEvent) -> Vec<SessionAction> {
        match event {
            SerialEvent::DeviceAttached { device_id } => self.handle_attached(device_id),
            SerialEvent::DeviceDetached { device_id } => {
                self.attached.remove(&device_id);
                info!(device_id, "device detached");
                self.handle_closed(device_id, "Device detached")
            },
            SerialEvent::Connected { device_id, interface } => {
                if self.active_device() != Some(device_id) {
                    debug!(device_id, interface, "ignoring connect of inactive device");
                    return Vec::new();
                }
                info!(device_id, interface, "interface connected");
                self.framers.entry(SourceId::new(device_id, interface)).or_default();
                Vec::new()
            },
            SerialEvent::Disconnected { device_id } => {
                info!(device_id, "device disconnected");
                self.handle_closed(device_id, "Device disconnected")
            },
            SerialEvent::ReadData { device_id, interface, data } => {
                let source = SourceId::new(device_id, interface);
                if self.active_device() != Some(device_id) {
                    debug!(%source, len = data.len(), "dropping chunk from inactive device");
                    return Vec::new();
                }
                debug!(%source, len = data.len(), "received chunk");

                let mut actions = Vec::new();
                let framer = self.framers.entry(source).or_default();
                framer.feed_with(&data, |line| {
                    actions.push(SessionAction::DeliverLine { source, line });
                });
                actions
            },
            SerialEvent::Error { code, message } => {
                warn!(code, %message, "serial error");
                vec![SessionAction::alert("Serial Error", message)]
            },
        }
    }

    fn handle_attached(&mut self, device_id: DeviceId) -> Vec<SessionAction> {
        self.attached.insert(device_id);
        info!(device_id, "device attached");

        if self.config.discovery == DiscoveryMode::Auto && self.state == SessionState::Idle {
            return self.begin_connect(device_id, None);
        }
        Vec::new()
    }

    fn handle_closed(&mut self, device_id: DeviceId, title: &str) -> Vec<SessionAction> {
        if self.active_device() == Some(device_id) {
            let name = self
                .device
                .as_ref()
                .map_or_else(|| format!("device {device_id}"), |d| d.display_name().to_string());
            self.end_session();
            // The transport may still hold the port open; release it.
            return vec![
                SessionAction::alert(title, name),
                SessionAction::Disconnect { device_id },
            ];
        }
        Vec::new()
    }

    fn begin_connect(
        &mut self,
        device_id: DeviceId,
        device: Option<DeviceInfo>,
    ) -> Vec<SessionAction> {
        self.state = SessionState::Connecting { device_id };
        self.device = device;
        vec![SessionAction::Connect { device_id, params: self.config.params.clone() }]
    }

    fn end_session(&mut self) {
        self.state = SessionState::Idle;
        self.device = None;
        for (source, framer) in self.framers.drain() {
            if !framer.is_empty() {
                debug!(%source, dropped = framer.pending().len(), "discarding partial line");
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uno(device_id: DeviceId) -> DeviceInfo {
        DeviceInfo {
            device_id,
            vendor_id: 0x2341,
            product_id: 0x0043,
            product_name: Some("Arduino Uno".into()),
            manufacturer: Some("Arduino".into()),
            is_supported: true,
        }
    }

    fn connected(config: SessionConfig) -> Session {
        let mut session = Session::new(config);
        session.search(&[uno(7)]).unwrap();
        session.connect_succeeded(7).unwrap();
        session
    }

    #[test]
    fn session_lifecycle() {
        let mut session = Session::default();
        assert_eq!(session.state(), SessionState::Idle);

        let actions = session.search(&[uno(7)]).unwrap();
        assert_eq!(session.state(), SessionState::Connecting { device_id: 7 });
        assert!(matches!(actions.as_slice(), [SessionAction::Connect { device_id: 7, .. }]));

        let actions = session.connect_succeeded(7).unwrap();
        assert!(session.is_connected());
        assert_eq!(
            actions,
            vec![SessionAction::Alert {
                title: "Device connected".into(),
                message: "Arduino Uno".into()
            }]
        );

        let actions = session.disconnect();
        assert_eq!(actions, vec![SessionAction::Disconnect { device_id: 7 }]);
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn connect_passes_configured_params() {
        let config = SessionConfig {
            params: SerialParams::default().with_baud_rate(115_200),
            ..SessionConfig::default()
        };
        let mut session = Session::new(config);
        let actions = session.search(&[uno(1)]).unwrap();
        match actions.as_slice() {
            [SessionAction::Connect { params, .. }] => assert_eq!(params.baud_rate, 115_200),
            other => panic!("unexpected actions: {other:?}"),
        }
    }

    #[test]
    fn search_without_supported_device() {
        let mut session = Session::default();
        let mut device = uno(1);
        device.is_supported = false;
        assert_eq!(session.search(&[device]), Err(SessionError::NoSupportedDevice));
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn state_reads_as_text() {
        assert_eq!(SessionState::Idle.to_string(), "idle");
        let err = SessionError::InvalidState {
            state: SessionState::Connected { device_id: 7 },
            operation: "search",
        };
        assert_eq!(err.to_string(), "cannot search while connected to device 7");
    }

    #[test]
    fn search_twice_is_rejected() {
        let mut session = Session::default();
        session.search(&[uno(1)]).unwrap();
        assert!(matches!(session.search(&[uno(1)]), Err(SessionError::InvalidState { .. })));
    }

    #[test]
    fn connect_failure_returns_to_idle() {
        let mut session = Session::default();
        session.search(&[uno(3)]).unwrap();
        let actions = session.connect_failed(3, "permission denied");
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(
            actions,
            vec![SessionAction::Alert {
                title: "Failed to connect".into(),
                message: "permission denied".into()
            }]
        );
    }

    #[test]
    fn connect_result_for_other_device() {
        let mut session = Session::default();
        session.search(&[uno(3)]).unwrap();
        assert_eq!(session.connect_succeeded(4), Err(SessionError::UnexpectedDevice(4)));
        assert!(matches!(
            Session::default().connect_succeeded(4),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn send_requires_connection() {
        let mut session = Session::default();
        assert_eq!(session.send_command(LedCommand::On), Err(SessionError::NotConnected));

        session.search(&[uno(1)]).unwrap();
        assert_eq!(session.send_command(LedCommand::On), Err(SessionError::NotConnected));
    }

    #[test]
    fn send_fans_out_to_each_interface() {
        let config = SessionConfig { write_interfaces: vec![1, 2], ..SessionConfig::default() };
        let mut session = connected(config);

        let actions = session.send_command(LedCommand::On).unwrap();
        assert_eq!(
            actions,
            vec![
                SessionAction::Write { device_id: 7, interface: 1, data: "LED ON\n".into() },
                SessionAction::Write { device_id: 7, interface: 2, data: "LED ON\n".into() },
            ]
        );
    }

    #[test]
    fn default_writes_interface_one_only() {
        let mut session = connected(SessionConfig::default());
        let actions = session.send_command(LedCommand::Off).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::Write { device_id: 7, interface: 1, data: "LED OFF\n".into() }]
        );
    }

    #[test]
    fn read_data_yields_lines_per_source() {
        let mut session = connected(SessionConfig::default());
        let a = SourceId::new(7, 1);
        let b = SourceId::new(7, 2);

        let read = |interface, data: &str| SerialEvent::ReadData {
            device_id: 7,
            interface,
            data: data.to_string(),
        };

        assert!(session.handle(read(1, "OK L")).is_empty());
        assert!(session.handle(read(2, "temp=2")).is_empty());
        assert_eq!(
            session.handle(read(1, "ED ON\r\n")),
            vec![SessionAction::DeliverLine { source: a, line: "OK LED ON".into() }]
        );
        assert_eq!(
            session.handle(read(2, "1\r\n")),
            vec![SessionAction::DeliverLine { source: b, line: "temp=21".into() }]
        );
        assert_eq!(session.pending(a), Some(""));
    }

    #[test]
    fn disconnect_discards_partial_lines() {
        let mut session = connected(SessionConfig::default());
        let source = SourceId::new(7, 1);
        session.handle(SerialEvent::ReadData { device_id: 7, interface: 1, data: "half".into() });
        assert_eq!(session.pending(source), Some("half"));

        session.disconnect();
        assert_eq!(session.pending(source), None);
    }

    #[test]
    fn detach_of_active_device_ends_session() {
        let mut session = connected(SessionConfig::default());
        session.handle(SerialEvent::DeviceAttached { device_id: 7 });

        let actions = session.handle(SerialEvent::DeviceDetached { device_id: 7 });
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(
            actions,
            vec![
                SessionAction::Alert {
                    title: "Device detached".into(),
                    message: "Arduino Uno".into()
                },
                SessionAction::Disconnect { device_id: 7 },
            ]
        );
        assert_eq!(session.attached_devices().count(), 0);
    }

    #[test]
    fn read_failure_releases_port() {
        let mut session = connected(SessionConfig::default());

        let actions = session.handle(SerialEvent::Disconnected { device_id: 7 });
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(
            actions,
            vec![
                SessionAction::Alert {
                    title: "Device disconnected".into(),
                    message: "Arduino Uno".into()
                },
                SessionAction::Disconnect { device_id: 7 },
            ]
        );

        // The transport's answer to that Disconnect is a no-op.
        assert!(session.handle(SerialEvent::Disconnected { device_id: 7 }).is_empty());
    }

    #[test]
    fn early_chunk_survives_interface_connect() {
        let mut session = Session::default();
        session.search(&[uno(7)]).unwrap();
        let source = SourceId::new(7, 1);

        session.handle(SerialEvent::ReadData { device_id: 7, interface: 1, data: "OK L".into() });
        session.handle(SerialEvent::Connected { device_id: 7, interface: 1 });
        session.connect_succeeded(7).unwrap();
        assert_eq!(session.pending(source), Some("OK L"));

        let actions = session.handle(SerialEvent::ReadData {
            device_id: 7,
            interface: 1,
            data: "ED ON\r\n".into(),
        });
        assert_eq!(actions, vec![SessionAction::DeliverLine { source, line: "OK LED ON".into() }]);
    }

    #[test]
    fn inactive_devices_get_no_buffers() {
        let mut session = Session::default();
        for device_id in 0..1000 {
            assert!(session.handle(SerialEvent::Connected { device_id, interface: 1 }).is_empty());
        }
        assert_eq!(session.pending(SourceId::new(999, 1)), None);

        let chunk = SerialEvent::ReadData { device_id: 3, interface: 1, data: "x\r\n".into() };
        assert!(session.handle(chunk).is_empty());
        assert_eq!(session.pending(SourceId::new(3, 1)), None);
    }

    #[test]
    fn late_connect_after_disconnect_is_ignored() {
        let mut session = connected(SessionConfig::default());
        session.disconnect();

        session.handle(SerialEvent::Connected { device_id: 7, interface: 2 });
        session.handle(SerialEvent::ReadData { device_id: 7, interface: 2, data: "late".into() });
        assert_eq!(session.pending(SourceId::new(7, 2)), None);
    }

    #[test]
    fn detach_of_other_device_is_quiet() {
        let mut session = connected(SessionConfig::default());
        assert!(session.handle(SerialEvent::DeviceDetached { device_id: 99 }).is_empty());
        assert!(session.is_connected());
    }

    #[test]
    fn auto_discovery_connects_on_attach() {
        let config = SessionConfig { discovery: DiscoveryMode::Auto, ..SessionConfig::default() };
        let mut session = Session::new(config);

        let actions = session.handle(SerialEvent::DeviceAttached { device_id: 5 });
        assert!(matches!(actions.as_slice(), [SessionAction::Connect { device_id: 5, .. }]));

        // A second device while connecting is only recorded.
        assert!(session.handle(SerialEvent::DeviceAttached { device_id: 6 }).is_empty());
        assert_eq!(session.attached_devices().collect::<Vec<_>>(), vec![5, 6]);

        let actions = session.connect_succeeded(5).unwrap();
        assert_eq!(
            actions,
            vec![SessionAction::Alert {
                title: "Device connected".into(),
                message: "Unnamed device".into()
            }]
        );
    }

    #[test]
    fn manual_discovery_ignores_attach() {
        let mut session = Session::default();
        assert!(session.handle(SerialEvent::DeviceAttached { device_id: 5 }).is_empty());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[test]
    fn transport_error_becomes_alert() {
        let mut session = Session::default();
        let actions =
            session.handle(SerialEvent::Error { code: 3, message: "write timeout".into() });
        assert_eq!(
            actions,
            vec![SessionAction::Alert {
                title: "Serial Error".into(),
                message: "write timeout".into()
            }]
        );
    }

    #[test]
    fn reconnect_starts_with_clean_buffer() {
        let mut session = connected(SessionConfig::default());
        session.handle(SerialEvent::ReadData { device_id: 7, interface: 1, data: "stale".into() });
        session.handle(SerialEvent::Disconnected { device_id: 7 });

        session.search(&[uno(7)]).unwrap();
        session.handle(SerialEvent::Connected { device_id: 7, interface: 1 });
        session.connect_succeeded(7).unwrap();

        let actions = session.handle(SerialEvent::ReadData {
            device_id: 7,
            interface: 1,
            data: "fresh\r\n".into(),
        });
        assert_eq!(
            actions,
            vec![SessionAction::DeliverLine { source: SourceId::new(7, 1), line: "fresh".into() }]
        );
    }
}
