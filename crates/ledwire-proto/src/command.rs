//! Outbound commands.
//!
//! The firmware reads one command per line. Outbound lines end in a bare
//! `\n`, unlike the `\r\n` the device uses for replies.

use std::{fmt, str::FromStr};

use crate::errors::ProtocolError;

/// Terminator appended to every outbound message.
pub const OUTBOUND_TERMINATOR: char = '\n';

/// Commands understood by the LED firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedCommand {
    /// Turn the LED on.
    On,
    /// Turn the LED off.
    Off,
}

impl LedCommand {
    /// Canonical command text, without terminator.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::On => "LED ON",
            Self::Off => "LED OFF",
        }
    }

    /// Command text ready to write to the port.
    pub fn encode(self) -> String {
        encode_message(self.as_str())
    }
}

impl fmt::Display for LedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedCommand {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "on" | "led on" => Ok(Self::On),
            "off" | "led off" => Ok(Self::Off),
            _ => Err(ProtocolError::UnknownCommand(s.to_string())),
        }
    }
}

/// Terminate `text` for transmission.
pub fn encode_message(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    out.push_str(text);
    out.push(OUTBOUND_TERMINATOR);
    out
}
