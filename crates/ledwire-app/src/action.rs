//! UI actions
//!
//! Actions produced by the App state machine for the runtime to execute.

use ledwire_proto::LedCommand;

/// Actions produced by the App state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppAction {
    /// Render the UI.
    Render,

    /// Quit the application.
    Quit,

    /// Enumerate devices and connect to the first supported one.
    Search,

    /// Send an LED command.
    SendCommand(LedCommand),

    /// Send free-form text.
    SendText {
        /// Message without terminator.
        text: String,
    },

    /// Close the connected device.
    Disconnect,
}
