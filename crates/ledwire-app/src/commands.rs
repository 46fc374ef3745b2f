//! Command parsing for text-based interfaces.
//!
//! This module parses command strings into structured [`Command`] values.

use ledwire_proto::LedCommand;

/// Parsed command from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Search for a supported device and connect to it.
    Search,

    /// Send an LED command.
    Led(LedCommand),

    /// Send free-form text to the device.
    Send {
        /// Text without terminator.
        text: String,
    },

    /// Close the connected device.
    Disconnect,

    /// Quit the application.
    Quit,

    /// Unknown or invalid command.
    Unknown {
        /// The original input.
        input: String,
    },

    /// Command with missing or invalid arguments.
    InvalidArgs {
        /// Command name.
        command: String,
        /// Error message.
        error: String,
    },
}

/// Parse a user input string into a command.
///
/// Commands start with `/`. Bare `on` / `off` are LED commands; any other
/// text is sent to the device as-is.
pub fn parse(input: &str) -> Command {
    let input = input.trim();

    if input.is_empty() {
        return Command::Send { text: String::new() };
    }

    let Some(cmd_str) = input.strip_prefix('/') else {
        return match input.parse::<LedCommand>() {
            Ok(command) => Command::Led(command),
            Err(_) => Command::Send { text: input.to_string() },
        };
    };

    let (command, rest) = match cmd_str.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (cmd_str, ""),
    };

    match command {
        "search" | "connect" => Command::Search,

        "on" => Command::Led(LedCommand::On),

        "off" => Command::Led(LedCommand::Off),

        "led" => match rest.parse::<LedCommand>() {
            Ok(command) => Command::Led(command),
            Err(_) => Command::InvalidArgs {
                command: "led".into(),
                error: "Usage: /led <on|off>".into(),
            },
        },

        "send" => {
            if rest.is_empty() {
                Command::InvalidArgs { command: "send".into(), error: "Usage: /send <text>".into() }
            } else {
                Command::Send { text: rest.to_string() }
            }
        },

        "disconnect" => Command::Disconnect,

        "quit" | "q" => Command::Quit,

        _ => Command::Unknown { input: input.to_string() },
    }
}
