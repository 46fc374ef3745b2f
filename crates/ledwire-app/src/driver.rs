//! Driver trait for abstracting frontend I/O.
//!
//! The [`Driver`] trait decouples the application runtime from a specific
//! frontend. Each frontend implements the trait to provide input and
//! rendering, while the generic [`crate::Runtime`] handles all orchestration.

use std::future::Future;

use crate::App;

/// Abstracts frontend I/O for the application runtime.
///
/// Serial I/O is not the driver's concern; that goes through
/// [`ledwire_core::SerialTransport`].
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Wait for the next line of user input.
    ///
    /// Returns `None` once input is exhausted.
    ///
    /// The future must be cancel-safe: the runtime drops it whenever a
    /// transport event is ready first, and no input may be consumed by a
    /// future that never completed.
    fn poll_input(&mut self) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send;

    /// Render the application state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, app: &App) -> Result<(), Self::Error>;

    /// Release frontend resources.
    fn stop(&mut self);
}
