//! Simulated transport.
//!
//! Devices live in memory. Writes are recorded and answered by the device's
//! responder; the reply is terminated with `\r\n` and delivered as a run of
//! `ReadData` events cut at random character boundaries.

use std::{collections::BTreeMap, io};

use async_trait::async_trait;
use ledwire_core::{
    DeviceId, DeviceInfo, InterfaceId, SerialEvent, SerialTransport, TransportError,
};
use ledwire_proto::{DELIMITER, SerialParams};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::mpsc;
use tracing::debug;

use crate::sim_device::SimDevice;

/// One recorded write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    /// Target device.
    pub device_id: DeviceId,
    /// Target interface.
    pub interface: InterfaceId,
    /// Data as written, terminator included.
    pub data: String,
}

struct Slot {
    device: SimDevice,
    open: bool,
    /// Parameters of the most recent successful connect.
    params: Option<SerialParams>,
}

/// In-memory [`SerialTransport`].
pub struct SimTransport {
    devices: BTreeMap<DeviceId, Slot>,
    events_tx: mpsc::UnboundedSender<SerialEvent>,
    events_rx: mpsc::UnboundedReceiver<SerialEvent>,
    rng: ChaCha8Rng,
    max_chunk: usize,
    writes: Vec<WriteRecord>,
    fail_next_connect: Option<String>,
    fail_writes: bool,
    shut_down: bool,
    enumerations: usize,
}

impl SimTransport {
    /// Create an empty transport whose chunking is driven by `seed`.
    pub fn with_seed(seed: u64) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            devices: BTreeMap::new(),
            events_tx,
            events_rx,
            rng: ChaCha8Rng::seed_from_u64(seed),
            max_chunk: 4,
            writes: Vec::new(),
            fail_next_connect: None,
            fail_writes: false,
            shut_down: false,
            enumerations: 0,
        }
    }

    /// Largest chunk, in characters, a reply is cut into.
    #[must_use]
    pub fn with_max_chunk(mut self, max_chunk: usize) -> Self {
        self.max_chunk = max_chunk.max(1);
        self
    }

    /// Add a device that is already plugged in. No event is emitted.
    #[must_use]
    pub fn with_device(mut self, device: SimDevice) -> Self {
        self.insert(device);
        self
    }

    /// Plug a device in and emit `DeviceAttached`.
    pub fn attach(&mut self, device: SimDevice) {
        let device_id = device.info.device_id;
        self.insert(device);
        self.emit(SerialEvent::DeviceAttached { device_id });
    }

    /// Unplug a device and emit `DeviceDetached`.
    pub fn detach(&mut self, device_id: DeviceId) {
        if self.devices.remove(&device_id).is_some() {
            self.emit(SerialEvent::DeviceDetached { device_id });
        }
    }

    /// Queue an arbitrary notification.
    pub fn inject(&mut self, event: SerialEvent) {
        self.emit(event);
    }

    /// Deliver raw text from a device, cut into random chunks.
    pub fn push_data(&mut self, device_id: DeviceId, interface: InterfaceId, text: &str) {
        let mut chunk = String::new();
        let mut budget = self.next_chunk_len();
        for c in text.chars() {
            chunk.push(c);
            budget -= 1;
            if budget == 0 {
                let data = std::mem::take(&mut chunk);
                self.emit(SerialEvent::ReadData { device_id, interface, data });
                budget = self.next_chunk_len();
            }
        }
        if !chunk.is_empty() {
            self.emit(SerialEvent::ReadData { device_id, interface, data: chunk });
        }
    }

    /// Make the next `connect` fail with `reason`.
    pub fn fail_next_connect(&mut self, reason: impl Into<String>) {
        self.fail_next_connect = Some(reason.into());
    }

    /// Make every write fail while `fail` is set.
    pub fn set_write_failure(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Stop producing events once the queue drains.
    pub fn shut_down(&mut self) {
        self.shut_down = true;
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }

    /// Number of `list_devices` calls so far.
    pub fn enumerations(&self) -> usize {
        self.enumerations
    }

    /// True if the device is attached and open.
    pub fn is_open(&self, device_id: DeviceId) -> bool {
        self.devices.get(&device_id).is_some_and(|slot| slot.open)
    }

    /// Parameters the device was last opened with.
    pub fn params(&self, device_id: DeviceId) -> Option<&SerialParams> {
        self.devices.get(&device_id).and_then(|slot| slot.params.as_ref())
    }

    fn insert(&mut self, device: SimDevice) {
        self.devices.insert(device.info.device_id, Slot { device, open: false, params: None });
    }

    fn emit(&self, event: SerialEvent) {
        // The receiver lives in `self`, so the channel cannot be closed here.
        let _ = self.events_tx.send(event);
    }

    fn next_chunk_len(&mut self) -> usize {
        self.rng.gen_range(1..=self.max_chunk)
    }
}

#[async_trait]
impl SerialTransport for SimTransport {
    async fn list_devices(&mut self) -> Result<Vec<DeviceInfo>, TransportError> {
        self.enumerations += 1;
        Ok(self.devices.values().map(|slot| slot.device.info.clone()).collect())
    }

    async fn connect(
        &mut self,
        device_id: DeviceId,
        params: &SerialParams,
    ) -> Result<(), TransportError> {
        let slot =
            self.devices.get_mut(&device_id).ok_or(TransportError::DeviceNotFound(device_id))?;

        if let Some(reason) = self.fail_next_connect.take() {
            return Err(TransportError::Open { device_id, reason });
        }

        slot.open = true;
        slot.params = Some(params.clone());
        let interfaces = slot.device.interfaces.clone();
        debug!(device_id, ?interfaces, "sim device opened");
        for interface in interfaces {
            self.emit(SerialEvent::Connected { device_id, interface });
        }
        Ok(())
    }

    async fn disconnect(&mut self, device_id: DeviceId) -> Result<(), TransportError> {
        if let Some(slot) = self.devices.get_mut(&device_id) {
            if std::mem::take(&mut slot.open) {
                self.emit(SerialEvent::Disconnected { device_id });
            }
        }
        Ok(())
    }

    async fn write(
        &mut self,
        device_id: DeviceId,
        interface: InterfaceId,
        data: &str,
    ) -> Result<(), TransportError> {
        let slot = self.devices.get(&device_id).ok_or(TransportError::DeviceNotFound(device_id))?;
        if !slot.open {
            return Err(TransportError::NotConnected(device_id));
        }
        if !slot.device.interfaces.contains(&interface) {
            return Err(TransportError::UnknownInterface { device_id, interface });
        }
        if self.fail_writes {
            return Err(TransportError::Io(io::Error::other("simulated write failure")));
        }

        let reply = (slot.device.responder)(data.trim_end_matches(['\r', '\n']));
        self.writes.push(WriteRecord { device_id, interface, data: data.to_string() });

        if let Some(reply) = reply {
            self.push_data(device_id, interface, &format!("{reply}{DELIMITER}"));
        }
        Ok(())
    }

    async fn next_event(&mut self) -> Option<SerialEvent> {
        if self.shut_down {
            return self.events_rx.try_recv().ok();
        }
        self.events_rx.recv().await
    }
}
