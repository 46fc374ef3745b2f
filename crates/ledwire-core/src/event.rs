//! Transport notifications in, session actions out.

use ledwire_proto::SerialParams;

use crate::device::{DeviceId, InterfaceId, SourceId};

/// Notifications delivered by the transport.
///
/// Delivery must be serialized per source; the session handles each event to
/// completion before the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SerialEvent {
    /// A device was plugged in.
    DeviceAttached {
        /// Attached device.
        device_id: DeviceId,
    },

    /// A device was unplugged.
    DeviceDetached {
        /// Detached device.
        device_id: DeviceId,
    },

    /// An interface of a device is open.
    Connected {
        /// Device.
        device_id: DeviceId,
        /// Opened interface.
        interface: InterfaceId,
    },

    /// A device connection was closed.
    Disconnected {
        /// Device.
        device_id: DeviceId,
    },

    /// A chunk of inbound text.
    ReadData {
        /// Device the chunk came from.
        device_id: DeviceId,
        /// Interface the chunk came from.
        interface: InterfaceId,
        /// Chunk payload; not aligned to lines.
        data: String,
    },

    /// The transport reported a failure.
    Error {
        /// Transport-specific error code.
        code: i32,
        /// Human-readable description.
        message: String,
    },
}

/// Actions produced by the session for the runtime to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a device with the given parameters.
    Connect {
        /// Device to open.
        device_id: DeviceId,
        /// Port parameters.
        params: SerialParams,
    },

    /// Close a device.
    Disconnect {
        /// Device to close.
        device_id: DeviceId,
    },

    /// Write text to one interface.
    Write {
        /// Target device.
        device_id: DeviceId,
        /// Target interface.
        interface: InterfaceId,
        /// Terminated message.
        data: String,
    },

    /// A complete line arrived.
    DeliverLine {
        /// Where it came from.
        source: SourceId,
        /// Line content without delimiter.
        line: String,
    },

    /// Tell the user something.
    Alert {
        /// Short heading.
        title: String,
        /// Detail.
        message: String,
    },
}

impl SessionAction {
    pub(crate) fn alert(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Alert { title: title.into(), message: message.into() }
    }
}
