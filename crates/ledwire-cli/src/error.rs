//! CLI error type.

use std::io;

use ledwire_app::RuntimeError;
use ledwire_proto::ProtocolError;
use thiserror::Error;

/// Errors that end the process with a failure status.
#[derive(Debug, Error)]
pub enum CliError {
    /// Arguments describe a port that cannot be opened.
    #[error("invalid port parameters: {0}")]
    Params(#[from] ProtocolError),

    /// The terminal failed.
    #[error(transparent)]
    Runtime(#[from] RuntimeError<io::Error>),

    /// The async runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Io(#[from] io::Error),
}
