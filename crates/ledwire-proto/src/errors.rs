//! Protocol error types.

use thiserror::Error;

use crate::params::ReturnedDataType;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while parsing commands or validating port parameters.
///
/// Framing never fails, so there is no framing variant here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// Text did not name a known LED command.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// Baud rate must be non-zero.
    #[error("invalid baud rate: {0}")]
    InvalidBaudRate(u32),

    /// Inbound data in this representation has no line delimiters to split on.
    #[error("returned data type {0:?} cannot be split into lines")]
    UnframedDataType(ReturnedDataType),
}
