//! Serial transport over the host's serial ports.
//!
//! Every tty is one device with a single interface. Opening a port starts a
//! blocking reader thread that forwards chunks into the event channel; writes
//! go straight to the port. With hotplug watching enabled, `next_event` also
//! rescans the port list and reports ports that appear or vanish.

use std::{
    collections::{BTreeMap, HashMap},
    io::{self, Read, Write},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

use async_trait::async_trait;
use ledwire_core::{
    DeviceId, DeviceInfo, InterfaceId, SerialEvent, SerialTransport, TransportError,
};
use ledwire_proto::{DataBits, FlowControl, Parity, ReturnedDataType, SerialParams, StopBits};
use serialport::{SerialPort, SerialPortBuilder, SerialPortType};
use tokio::{
    sync::mpsc,
    time::{self, Interval, MissedTickBehavior},
};
use tracing::{debug, info, warn};

/// Interface number of a tty.
pub const PORT_INTERFACE: InterfaceId = 1;

/// How long a blocking read waits before checking for shutdown.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Size of the reader thread's buffer.
const READ_BUFFER: usize = 1024;

struct KnownPort {
    path: String,
    info: DeviceInfo,
}

struct OpenPort {
    writer: Box<dyn SerialPort>,
    stop: Arc<AtomicBool>,
}

impl Drop for OpenPort {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

/// [`SerialTransport`] backed by the `serialport` crate.
pub struct PortTransport {
    only: Option<String>,
    ids: HashMap<String, DeviceId>,
    next_id: DeviceId,
    known: BTreeMap<DeviceId, KnownPort>,
    open: HashMap<DeviceId, OpenPort>,
    events_tx: mpsc::UnboundedSender<SerialEvent>,
    events_rx: mpsc::UnboundedReceiver<SerialEvent>,
    hotplug: Option<Interval>,
}

impl PortTransport {
    /// Transport over every port on the host, or only `only` if given.
    ///
    /// A port named explicitly is treated as supported whatever its type;
    /// otherwise only USB ports are.
    pub fn new(only: Option<String>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            only,
            ids: HashMap::new(),
            next_id: 1,
            known: BTreeMap::new(),
            open: HashMap::new(),
            events_tx,
            events_rx,
            hotplug: None,
        }
    }

    /// Report ports present now as attached, then keep rescanning every
    /// `period`.
    ///
    /// # Errors
    ///
    /// - `Io` if the port list cannot be read
    pub fn watch(&mut self, period: Duration) -> Result<(), TransportError> {
        self.refresh(true)?;
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.hotplug = Some(interval);
        Ok(())
    }

    /// Rescan the port list, assigning identifiers to new ports.
    ///
    /// With `announce`, appearing and vanishing ports are reported as
    /// attach and detach events.
    fn refresh(&mut self, announce: bool) -> Result<Vec<DeviceInfo>, TransportError> {
        let ports = serialport::available_ports().map_err(io::Error::from)?;

        let mut current = BTreeMap::new();
        for port in ports {
            if self.only.as_ref().is_some_and(|only| *only != port.port_name) {
                continue;
            }
            let device_id = self.id_for(&port.port_name);
            let info = describe(device_id, &port.port_name, &port.port_type, self.only.is_some());
            current.insert(device_id, KnownPort { path: port.port_name, info });
        }

        if announce {
            for &device_id in current.keys().filter(|id| !self.known.contains_key(*id)) {
                self.emit(SerialEvent::DeviceAttached { device_id });
            }
            for &device_id in self.known.keys().filter(|id| !current.contains_key(*id)) {
                self.emit(SerialEvent::DeviceDetached { device_id });
            }
        }

        for device_id in self.known.keys().filter(|id| !current.contains_key(*id)) {
            if self.open.remove(device_id).is_some() {
                debug!(device_id, "closed vanished port");
            }
        }

        self.known = current;
        Ok(self.known.values().map(|port| port.info.clone()).collect())
    }

    fn id_for(&mut self, path: &str) -> DeviceId {
        if let Some(&device_id) = self.ids.get(path) {
            return device_id;
        }
        let device_id = self.next_id;
        self.next_id += 1;
        self.ids.insert(path.to_string(), device_id);
        device_id
    }

    fn emit(&self, event: SerialEvent) {
        let _ = self.events_tx.send(event);
    }
}

#[async_trait]
impl SerialTransport for PortTransport {
    async fn list_devices(&mut self) -> Result<Vec<DeviceInfo>, TransportError> {
        self.refresh(false)
    }

    async fn connect(
        &mut self,
        device_id: DeviceId,
        params: &SerialParams,
    ) -> Result<(), TransportError> {
        let path = self
            .known
            .get(&device_id)
            .map(|port| port.path.clone())
            .ok_or(TransportError::DeviceNotFound(device_id))?;

        let open_error = |reason: String| TransportError::Open { device_id, reason };
        let writer = port_builder(&path, params)
            .map_err(open_error)?
            .open()
            .map_err(|e| open_error(e.to_string()))?;
        let reader = writer.try_clone().map_err(|e| open_error(e.to_string()))?;

        let stop = Arc::new(AtomicBool::new(false));
        let events = self.events_tx.clone();
        let data_type = params.returned_data_type;
        let reader_stop = Arc::clone(&stop);

        // Queued ahead of any chunk the reader sends.
        self.emit(SerialEvent::Connected { device_id, interface: PORT_INTERFACE });
        thread::Builder::new()
            .name(format!("ledwire-read-{device_id}"))
            .spawn(move || read_loop(reader, device_id, data_type, &reader_stop, &events))?;

        info!(device_id, %path, baud = params.baud_rate, "port opened");
        self.open.insert(device_id, OpenPort { writer, stop });
        Ok(())
    }

    async fn disconnect(&mut self, device_id: DeviceId) -> Result<(), TransportError> {
        if self.open.remove(&device_id).is_some() {
            info!(device_id, "port closed");
            self.emit(SerialEvent::Disconnected { device_id });
        }
        Ok(())
    }

    async fn write(
        &mut self,
        device_id: DeviceId,
        interface: InterfaceId,
        data: &str,
    ) -> Result<(), TransportError> {
        let port = self.open.get_mut(&device_id).ok_or(TransportError::NotConnected(device_id))?;
        if interface != PORT_INTERFACE {
            return Err(TransportError::UnknownInterface { device_id, interface });
        }

        port.writer.write_all(data.as_bytes())?;
        port.writer.flush()?;
        debug!(device_id, len = data.len(), "wrote");
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SerialEvent> {
        loop {
            let Some(hotplug) = self.hotplug.as_mut() else {
                return self.events_rx.recv().await;
            };

            tokio::select! {
                event = self.events_rx.recv() => return event,
                _ = hotplug.tick() => {
                    if let Err(e) = self.refresh(true) {
                        warn!(error = %e, "port rescan failed");
                    }
                },
            }
        }
    }
}

/// Device info for one enumerated port.
fn describe(device_id: DeviceId, path: &str, kind: &SerialPortType, forced: bool) -> DeviceInfo {
    match kind {
        SerialPortType::UsbPort(usb) => DeviceInfo {
            device_id,
            vendor_id: usb.vid,
            product_id: usb.pid,
            product_name: Some(usb.product.clone().unwrap_or_else(|| path.to_string())),
            manufacturer: usb.manufacturer.clone(),
            is_supported: true,
        },
        _ => DeviceInfo {
            device_id,
            vendor_id: 0,
            product_id: 0,
            product_name: Some(path.to_string()),
            manufacturer: None,
            is_supported: forced,
        },
    }
}

/// Port builder for `params`, or why the port cannot honour them.
fn port_builder(path: &str, params: &SerialParams) -> Result<SerialPortBuilder, String> {
    debug!(
        driver = ?params.driver,
        interface = params.port_interface.as_raw(),
        mode = ?params.mode,
        "ignoring USB host options for tty"
    );
    Ok(serialport::new(path, params.baud_rate)
        .data_bits(data_bits(params.data_bits))
        .stop_bits(stop_bits(params.stop_bits)?)
        .parity(parity(params.parity)?)
        .flow_control(flow_control(params.flow_control)?)
        .timeout(READ_TIMEOUT))
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Five => serialport::DataBits::Five,
        DataBits::Six => serialport::DataBits::Six,
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn stop_bits(bits: StopBits) -> Result<serialport::StopBits, String> {
    match bits {
        StopBits::One => Ok(serialport::StopBits::One),
        StopBits::Two => Ok(serialport::StopBits::Two),
        StopBits::OnePointFive => Err("1.5 stop bits are not supported".into()),
    }
}

fn parity(parity: Parity) -> Result<serialport::Parity, String> {
    match parity {
        Parity::None => Ok(serialport::Parity::None),
        Parity::Odd => Ok(serialport::Parity::Odd),
        Parity::Even => Ok(serialport::Parity::Even),
        Parity::Mark | Parity::Space => Err(format!("{parity:?} parity is not supported")),
    }
}

fn flow_control(flow: FlowControl) -> Result<serialport::FlowControl, String> {
    match flow {
        FlowControl::Off => Ok(serialport::FlowControl::None),
        FlowControl::RtsCts => Ok(serialport::FlowControl::Hardware),
        FlowControl::XonXoff => Ok(serialport::FlowControl::Software),
        FlowControl::DsrDtr => Err("DSR/DTR flow control is not supported".into()),
    }
}

/// Forward everything read from `port` until `stop` is set or the port fails.
fn read_loop(
    mut port: Box<dyn SerialPort>,
    device_id: DeviceId,
    data_type: ReturnedDataType,
    stop: &AtomicBool,
    events: &mpsc::UnboundedSender<SerialEvent>,
) {
    let mut buf = [0u8; READ_BUFFER];
    let mut pending = Vec::new();

    while !stop.load(Ordering::Relaxed) {
        match port.read(&mut buf) {
            Ok(0) => {},
            Ok(n) => {
                let data = match data_type {
                    ReturnedDataType::Utf8 => {
                        pending.extend_from_slice(&buf[..n]);
                        take_utf8(&mut pending)
                    },
                    ReturnedDataType::Hex => to_hex(&buf[..n]),
                };
                if data.is_empty() {
                    continue;
                }
                let event = SerialEvent::ReadData { device_id, interface: PORT_INTERFACE, data };
                if events.send(event).is_err() {
                    break;
                }
            },
            Err(e) if is_transient(&e) => {},
            Err(e) => {
                if !stop.load(Ordering::Relaxed) {
                    warn!(device_id, error = %e, "read failed");
                    let code = e.raw_os_error().unwrap_or(-1);
                    let _ = events.send(SerialEvent::Error { code, message: e.to_string() });
                    let _ = events.send(SerialEvent::Disconnected { device_id });
                }
                break;
            },
        }
    }
    debug!(device_id, "reader stopped");
}

/// Decode the longest complete UTF-8 prefix of `pending`.
///
/// A multi-byte character cut by the read stays in `pending` for the next
/// read. Invalid bytes are replaced.
fn take_utf8(pending: &mut Vec<u8>) -> String {
    match std::str::from_utf8(pending.as_slice()) {
        Ok(text) => {
            let text = text.to_string();
            pending.clear();
            text
        },
        Err(e) if e.error_len().is_none() => {
            let tail = pending.split_off(e.valid_up_to());
            let text = String::from_utf8_lossy(pending.as_slice()).into_owned();
            *pending = tail;
            text
        },
        Err(_) => {
            let text = String::from_utf8_lossy(pending.as_slice()).into_owned();
            pending.clear();
            text
        },
    }
}

/// Read errors that only mean "nothing yet".
fn is_transient(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::Interrupted)
}

/// Raw hex rendering of a chunk. Such chunks carry no line delimiters, so this
/// is only for callers that drive the transport without a line session.
fn to_hex(bytes: &[u8]) -> String {
    use std::fmt::Write as _;

    let mut hex = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(hex, "{byte:02X}");
    }
    hex
}
