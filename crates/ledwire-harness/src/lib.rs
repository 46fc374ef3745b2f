//! Deterministic simulation harness for ledwire testing.
//!
//! In-memory implementations of the [`ledwire_core::SerialTransport`] and
//! [`ledwire_app::Driver`] traits. Simulated devices answer commands the way
//! the LED firmware does, and replies are cut into chunks by a seeded RNG so
//! every run with the same seed sees the same chunk boundaries.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod scripted_driver;
pub mod sim_device;
pub mod sim_transport;

pub use scripted_driver::{ScriptedDriver, Snapshot};
pub use sim_device::{Responder, SimDevice, led_firmware_reply};
pub use sim_transport::{SimTransport, WriteRecord};
