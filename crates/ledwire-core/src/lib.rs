//! ledwire session core
//!
//! Pure state machine logic for talking to a USB-serial LED controller,
//! completely decoupled from I/O.
//!
//! # Architecture
//!
//! The USB-serial library is an external collaborator. It enumerates devices,
//! opens ports and pushes notifications at us. Those notifications enter this
//! crate as [`SerialEvent`] values, and every decision the session makes
//! leaves as a [`SessionAction`] for a runtime to execute.
//!
//! The session never opens a port or writes a byte itself. That keeps the
//! same logic usable from the terminal frontend, from unit tests and from the
//! simulated transport in the harness.
//!
//! # Components
//!
//! - [`session`]: Connection lifecycle, per-source line framing, write fan-out
//! - [`device`]: Device and source identifiers, device selection
//! - [`event`]: Transport notifications and session actions
//! - [`transport`]: Transport abstraction (the collaborator boundary)
//! - [`error`]: Session and transport error types

pub mod device;
pub mod error;
pub mod event;
pub mod session;
pub mod transport;

pub use device::{DeviceId, DeviceInfo, InterfaceId, SourceId, select_supported};
pub use error::{SessionError, TransportError};
pub use event::{SerialEvent, SessionAction};
pub use session::{DiscoveryMode, Session, SessionConfig, SessionState};
pub use transport::SerialTransport;
