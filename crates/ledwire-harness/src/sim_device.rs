//! Simulated USB-serial devices.

use std::fmt;

use ledwire_core::{DeviceId, DeviceInfo, InterfaceId};
use ledwire_proto::LedCommand;

/// Computes the reply line (without delimiter) to one received command.
pub type Responder = fn(&str) -> Option<String>;

/// Reply of the LED controller firmware.
///
/// Known commands are acknowledged with `OK <command>`, anything else with
/// `ERR unknown command`.
pub fn led_firmware_reply(command: &str) -> Option<String> {
    match command.parse::<LedCommand>() {
        Ok(led) => Some(format!("OK {led}")),
        Err(_) => Some("ERR unknown command".to_string()),
    }
}

/// A device as the simulated transport sees it.
#[derive(Clone)]
pub struct SimDevice {
    /// Enumeration info.
    pub info: DeviceInfo,
    /// Interfaces opened on connect.
    pub interfaces: Vec<InterfaceId>,
    /// Reply behaviour.
    pub responder: Responder,
}

impl SimDevice {
    /// An LED controller with two interfaces that acknowledges commands.
    pub fn led_board(device_id: DeviceId) -> Self {
        Self {
            info: DeviceInfo {
                device_id,
                vendor_id: 0x2341,
                product_id: 0x0043,
                product_name: Some("LED Controller".into()),
                manufacturer: Some("ledwire".into()),
                is_supported: true,
            },
            interfaces: vec![1, 2],
            responder: led_firmware_reply,
        }
    }

    /// A device no driver supports.
    pub fn unsupported(device_id: DeviceId) -> Self {
        let mut device = Self::led_board(device_id);
        device.info.product_name = Some("USB Keyboard".into());
        device.info.is_supported = false;
        device
    }

    /// A supported device that never answers.
    pub fn silent(device_id: DeviceId) -> Self {
        Self { responder: |_| None, ..Self::led_board(device_id) }
    }

    /// Same device with a different product name.
    #[must_use]
    pub fn named(mut self, name: Option<&str>) -> Self {
        self.info.product_name = name.map(str::to_string);
        self
    }
}

impl fmt::Debug for SimDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimDevice")
            .field("info", &self.info)
            .field("interfaces", &self.interfaces)
            .finish_non_exhaustive()
    }
}
