//! Line-oriented terminal frontend.
//!
//! Commands are read from stdin one line at a time. Each render prints only
//! what changed since the previous one: the status when it moves, then new
//! alerts, then new device lines.

use std::{
    future::Future,
    io::{self, Write},
};

use ledwire_app::{App, ConnectionStatus, Driver};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// How far the terminal has caught up with the app.
#[derive(Debug, Default)]
struct Cursor {
    status: Option<ConnectionStatus>,
    lines: u64,
    alerts: u64,
}

/// Output lines for everything new in `app`, advancing `cursor`.
fn render_update(app: &App, cursor: &mut Cursor) -> Vec<String> {
    let mut out = Vec::new();

    if cursor.status.as_ref() != Some(app.status()) {
        out.push(format!("* {}", app.status()));
        cursor.status = Some(app.status().clone());
    }

    let fresh = unseen(app.alerts_raised(), cursor.alerts, app.alerts().count());
    out.extend(app.alerts().skip(fresh).map(|alert| format!("! {alert}")));
    cursor.alerts = app.alerts_raised();

    let fresh = unseen(app.lines_received(), cursor.lines, app.history().count());
    out.extend(app.history().skip(fresh).map(|l| format!("[{}] {}", l.source, l.line)));
    cursor.lines = app.lines_received();

    out
}

/// Number of retained entries to skip so only unseen ones remain.
fn unseen(total: u64, seen: u64, retained: usize) -> usize {
    let new = usize::try_from(total.saturating_sub(seen)).unwrap_or(usize::MAX);
    retained.saturating_sub(new)
}

/// [`Driver`] over stdin and stdout.
pub struct StdinDriver {
    input: Lines<BufReader<Stdin>>,
    cursor: Cursor,
}

impl StdinDriver {
    /// Attach to the process's stdin.
    pub fn new() -> Self {
        Self { input: BufReader::new(tokio::io::stdin()).lines(), cursor: Cursor::default() }
    }
}

impl Default for StdinDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for StdinDriver {
    type Error = io::Error;

    fn poll_input(&mut self) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send {
        self.input.next_line()
    }

    fn render(&mut self, app: &App) -> Result<(), Self::Error> {
        let update = render_update(app, &mut self.cursor);
        if update.is_empty() {
            return Ok(());
        }

        let mut stdout = io::stdout().lock();
        for line in update {
            writeln!(stdout, "{line}")?;
        }
        stdout.flush()
    }

    fn stop(&mut self) {
        let _ = io::stdout().lock().flush();
    }
}
