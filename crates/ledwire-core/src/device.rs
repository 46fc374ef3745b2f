//! Device identity.

use std::fmt;

/// Transport-assigned device identifier.
pub type DeviceId = u32;

/// Interface (sub-channel) of a device.
pub type InterfaceId = u16;

/// One inbound data source: a device interface.
///
/// Each source owns its own line buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId {
    /// Device the data came from.
    pub device_id: DeviceId,
    /// Interface on that device.
    pub interface: InterfaceId,
}

impl SourceId {
    /// Build a source identifier.
    pub const fn new(device_id: DeviceId, interface: InterfaceId) -> Self {
        Self { device_id, interface }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device {} IF {}", self.device_id, self.interface)
    }
}

/// An enumerated device, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Transport-assigned identifier.
    pub device_id: DeviceId,
    /// USB vendor ID.
    pub vendor_id: u16,
    /// USB product ID.
    pub product_id: u16,
    /// Product string, if the device reports one.
    pub product_name: Option<String>,
    /// Manufacturer string, if the device reports one.
    pub manufacturer: Option<String>,
    /// Whether the transport has a driver for this device.
    pub is_supported: bool,
}

impl DeviceInfo {
    /// Label shown to the user once connected.
    pub fn display_name(&self) -> &str {
        self.product_name.as_deref().unwrap_or("Unnamed device")
    }
}

/// First device the transport can drive, in enumeration order.
pub fn select_supported(devices: &[DeviceInfo]) -> Option<&DeviceInfo> {
    devices.iter().find(|d| d.is_supported)
}
