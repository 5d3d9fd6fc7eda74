//! Event log for ingestion and simulation runs
//!
//! Every message goes to the console (if enabled) and to an optional log file
//! with a `[HH:MM:SS]` prefix. The log is an explicit value handed to the
//! services that report through it; nothing here is process-global.

use std::fmt;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use tracing::warn;

use crate::application::{ApplicationResult, IoResultExt};
use crate::infrastructure::traits::FileSystem;

pub struct EventLog {
    echo: bool,
    file: Option<Box<dyn Write + Send>>,
    captured: Option<Vec<String>>,
}

impl fmt::Debug for EventLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLog")
            .field("echo", &self.echo)
            .field("file", &self.file.is_some())
            .field("captured", &self.captured.as_ref().map(Vec::len))
            .finish()
    }
}

impl EventLog {
    /// Log that prints every message to stdout.
    pub fn console() -> Self {
        Self {
            echo: true,
            file: None,
            captured: None,
        }
    }

    /// Log that discards everything.
    pub fn silent() -> Self {
        Self {
            echo: false,
            file: None,
            captured: None,
        }
    }

    /// Log that keeps messages in memory, for inspection in tests.
    pub fn memory() -> Self {
        Self {
            echo: false,
            file: None,
            captured: Some(Vec::new()),
        }
    }

    /// Also write to `path`, replacing whatever a previous run left there.
    pub fn with_file(mut self, fs: &dyn FileSystem, path: &Path) -> ApplicationResult<Self> {
        fs.ensure_parent(path)
            .with_path_context("create log directory", path)?;
        let writer = fs.create(path).with_path_context("open log file", path)?;
        self.file = Some(writer);
        Ok(self)
    }

    pub fn record(&mut self, message: impl fmt::Display) {
        let message = message.to_string();

        if self.echo {
            println!("{message}");
        }

        if let Some(file) = self.file.as_mut() {
            let stamp = Local::now().format("%H:%M:%S");
            if let Err(e) = writeln!(file, "[{stamp}] {message}") {
                // file sink is dropped after the first write error
                warn!("event log file disabled after write error: {e}");
                self.file = None;
            }
        }

        if let Some(captured) = self.captured.as_mut() {
            captured.push(message);
        }
    }

    /// Captured messages; empty unless built with [`EventLog::memory`].
    pub fn lines(&self) -> &[String] {
        self.captured.as_deref().unwrap_or(&[])
    }

    pub fn flush(&mut self) {
        if let Some(file) = self.file.as_mut() {
            if let Err(e) = file.flush() {
                warn!("cannot flush event log file: {e}");
            }
        }
    }
}

impl Drop for EventLog {
    fn drop(&mut self) {
        self.flush();
    }
}
