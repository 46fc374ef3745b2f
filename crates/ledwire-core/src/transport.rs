//! Transport abstraction for USB-serial devices.
//!
//! The session never talks to hardware. A transport wraps whatever serial
//! library the platform offers and exposes the four things the session needs:
//! enumerate, open, close, write. Inbound traffic comes back as a stream of
//! [`SerialEvent`]s. Production binds the `serialport` crate; tests use the
//! simulated transport from `ledwire-harness`.

use async_trait::async_trait;
use ledwire_proto::SerialParams;

use crate::{
    device::{DeviceId, DeviceInfo, InterfaceId},
    error::TransportError,
    event::SerialEvent,
};

/// Abstract USB-serial transport.
///
/// Implementations must deliver events for one source in the order the bytes
/// arrived.
#[async_trait]
pub trait SerialTransport: Send + 'static {
    /// Enumerate attached devices.
    async fn list_devices(&mut self) -> Result<Vec<DeviceInfo>, TransportError>;

    /// Open a device.
    ///
    /// On success the transport emits one [`SerialEvent::Connected`] per opened
    /// interface.
    async fn connect(
        &mut self,
        device_id: DeviceId,
        params: &SerialParams,
    ) -> Result<(), TransportError>;

    /// Close a device. Closing a device that is not open is not an error.
    async fn disconnect(&mut self, device_id: DeviceId) -> Result<(), TransportError>;

    /// Write already-terminated text to one interface.
    async fn write(
        &mut self,
        device_id: DeviceId,
        interface: InterfaceId,
        data: &str,
    ) -> Result<(), TransportError>;

    /// Wait for the next notification.
    ///
    /// Returns `None` once the transport is shut down.
    async fn next_event(&mut self) -> Option<SerialEvent>;
}
