//! View state types.

use std::fmt;

use ledwire_core::SourceId;

/// Connection status as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    /// No device.
    #[default]
    Disconnected,
    /// Enumerating devices.
    Searching,
    /// Opening a device.
    Connecting,
    /// Device open.
    Connected {
        /// Product name, or "Unnamed device".
        name: String,
    },
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Searching => f.write_str("searching"),
            Self::Connecting => f.write_str("connecting"),
            Self::Connected { name } => write!(f, "connected to {name}"),
        }
    }
}

/// A line received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedLine {
    /// Where it came from.
    pub source: SourceId,
    /// Content.
    pub line: String,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    /// Heading.
    pub title: String,
    /// Detail, possibly empty.
    pub message: String,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            f.write_str(&self.title)
        } else {
            write!(f, "{}: {}", self.title, self.message)
        }
    }
}
