//! Output and error sinks for supervisor messages.
//!
//! # Responsibilities
//! - Wrap any `std::io::Write` in a cloneable, thread-safe handle
//! - Write plain-text lines (one message per line)
//!
//! # Design Decisions
//! - Sink failures never abort supervision; they are logged and dropped
//! - Writes are synchronous and short, so a std mutex is sufficient

use std::fmt;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A shared, writable destination for human-readable server messages.
#[derive(Clone)]
pub struct Sink {
    inner: Arc<Mutex<Box<dyn Write + Send>>>,
}

impl Sink {
    /// Wrap a writer.
    pub fn new<W>(writer: W) -> Self
    where
        W: Write + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(writer))),
        }
    }

    /// Sink writing to the process's standard output.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Sink writing to the process's standard error.
    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Write a single line and flush.
    pub fn write_line(&self, line: impl fmt::Display) {
        let mut writer = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let result = writeln!(writer, "{}", line).and_then(|()| writer.flush());
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to write to sink");
        }
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").finish_non_exhaustive()
    }
}
