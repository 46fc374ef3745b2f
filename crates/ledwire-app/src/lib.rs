//! Application layer for ledwire
//!
//! Pure state machines and a generic runtime for UI and session
//! orchestration, so the same code runs in the terminal frontend and in
//! simulation.
//!
//! # Components
//!
//! - [`App`]: Application state (connection status, received lines, alerts)
//! - [`commands`]: User input parsing
//! - [`Driver`]: Trait for platform-specific frontend I/O
//! - [`Runtime`]: Generic orchestration loop over a driver and a transport

mod action;
mod app;
pub mod commands;
mod driver;
mod event;
mod runtime;
mod state;

pub use action::AppAction;
pub use app::{App, MAX_ALERTS, MAX_HISTORY};
pub use commands::Command;
pub use driver::Driver;
pub use event::AppEvent;
pub use runtime::{Runtime, RuntimeError};
pub use state::{Alert, ConnectionStatus, ReceivedLine};
