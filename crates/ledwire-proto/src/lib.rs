//! Wire format for the ledwire serial protocol.
//!
//! The device speaks plain text. Outbound commands are single lines
//! terminated by `\n`; inbound replies are lines terminated by `\r\n` and may
//! arrive split at arbitrary chunk boundaries. [`LineFramer`] reassembles
//! those chunks into whole lines.
//!
//! Nothing in this crate performs I/O. Serial port parameters are modelled
//! here so every layer above agrees on the same defaults, but opening a port
//! is the transport's job.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod command;
pub mod errors;
pub mod framer;
pub mod params;

pub use command::{LedCommand, OUTBOUND_TERMINATOR, encode_message};
pub use errors::{ProtocolError, Result};
pub use framer::{DELIMITER, LineFramer};
pub use params::{
    DataBits, DriverType, FlowControl, Parity, PortInterface, ReadMode, ReturnedDataType,
    SerialParams, StopBits,
};
