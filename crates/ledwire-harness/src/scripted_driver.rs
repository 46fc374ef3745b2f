//! Scripted frontend.
//!
//! Feeds a fixed list of input lines to the runtime and records a snapshot
//! of the app every time it is rendered.

use std::{collections::VecDeque, convert::Infallible, future::Future};

use ledwire_app::{App, ConnectionStatus, Driver};

/// What the app looked like at one render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Connection status.
    pub status: ConnectionStatus,
    /// Received lines, oldest first.
    pub lines: Vec<String>,
    /// Alerts, formatted `title: message`, oldest first.
    pub alerts: Vec<String>,
}

/// [`Driver`] that replays canned input.
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    inputs: VecDeque<String>,
    snapshots: Vec<Snapshot>,
    stopped: bool,
}

impl ScriptedDriver {
    /// Driver that will type `inputs`, in order, then close input.
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { inputs: inputs.into_iter().map(Into::into).collect(), ..Self::default() }
    }

    /// Every render, in order.
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    /// The final render.
    pub fn last_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// True once the runtime released the driver.
    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Driver for ScriptedDriver {
    type Error = Infallible;

    fn poll_input(&mut self) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send {
        // Nothing is taken until the future is polled, so a poll dropped by
        // the runtime's select loses no input.
        async move { Ok(self.inputs.pop_front()) }
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        self.snapshots.push(Snapshot {
            status: app.status().clone(),
            lines: app.history().map(|l| l.line.clone()).collect(),
            alerts: app.alerts().map(ToString::to_string).collect(),
        });
        Ok(())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
