//! Events consumed by the App state machine.

use ledwire_core::SourceId;

use crate::state::ConnectionStatus;

/// Events fed into [`crate::App::handle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A line of user input.
    Input(String),

    /// A complete line arrived from the device.
    LineReceived {
        /// Source of the line.
        source: SourceId,
        /// Line content.
        line: String,
    },

    /// Something the user should see.
    Alert {
        /// Heading.
        title: String,
        /// Detail, possibly empty.
        message: String,
    },

    /// The session changed state.
    StatusChanged(ConnectionStatus),
}
