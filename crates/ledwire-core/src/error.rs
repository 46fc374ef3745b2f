//! Error types for the session and the transport boundary.

use std::io;

use thiserror::Error;

use crate::{
    device::{DeviceId, InterfaceId},
    session::SessionState,
};

/// Errors from session operations.
///
/// None of these are fatal; the runtime turns them into user alerts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A command was issued with no connected device.
    #[error("not connected")]
    NotConnected,

    /// Enumeration found nothing the transport can drive.
    #[error("no supported USB device found")]
    NoSupportedDevice,

    /// Operation not valid in the current state.
    #[error("cannot {operation} while {state}")]
    InvalidState {
        /// State at the time of the call.
        state: SessionState,
        /// Attempted operation.
        operation: &'static str,
    },

    /// A connect result named a device we were not connecting to.
    #[error("unexpected connect result for device {0}")]
    UnexpectedDevice(DeviceId),
}

/// Errors reported by a [`crate::SerialTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// No device with this identifier.
    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),

    /// The device is not open.
    #[error("device {0} is not connected")]
    NotConnected(DeviceId),

    /// The device has no such interface.
    #[error("device {device_id} has no interface {interface}")]
    UnknownInterface {
        /// Device.
        device_id: DeviceId,
        /// Requested interface.
        interface: InterfaceId,
    },

    /// The port could not be opened.
    #[error("failed to open device {device_id}: {reason}")]
    Open {
        /// Device.
        device_id: DeviceId,
        /// Library-provided reason.
        reason: String,
    },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The transport has shut down.
    #[error("transport closed")]
    Closed,
}
