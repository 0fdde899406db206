//! Progress sinks for scheduler runs

use std::io::Write;

use colored::*;
use tracing::info;

/// Receives one unit per finished operation, then a single `finish`
pub trait Progress {
    fn advance(&mut self, n: u64);

    fn finish(&mut self);
}

impl<P: Progress + ?Sized> Progress for &mut P {
    fn advance(&mut self, n: u64) {
        (**self).advance(n);
    }

    fn finish(&mut self) {
        (**self).finish();
    }
}

impl<P: Progress + ?Sized> Progress for Box<P> {
    fn advance(&mut self, n: u64) {
        (**self).advance(n);
    }

    fn finish(&mut self) {
        (**self).finish();
    }
}

/// Discards progress
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn advance(&mut self, _n: u64) {}

    fn finish(&mut self) {}
}

/// Single self-overwriting counter line on stderr
///
/// Writes nothing until the first unit arrives, so runs that finish
/// instantly leave no trace.
#[derive(Debug)]
pub struct TerminalProgress {
    label: String,
    done: u64,
    total: u64,
    drawn: bool,
}

impl TerminalProgress {
    pub fn new(label: impl Into<String>, total: u64) -> Self {
        Self {
            label: label.into(),
            done: 0,
            total,
            drawn: false,
        }
    }

    fn draw(&mut self) {
        let mut stderr = std::io::stderr().lock();
        let counter = format!("{}/{}", self.done, self.total);
        // Terminal writes are best effort
        let _ = write!(stderr, "\r{} {}", self.label.dimmed(), counter.cyan());
        let _ = stderr.flush();
        self.drawn = true;
    }
}

impl Progress for TerminalProgress {
    fn advance(&mut self, n: u64) {
        self.done = (self.done + n).min(self.total);
        self.draw();
    }

    fn finish(&mut self) {
        if self.drawn {
            let mut stderr = std::io::stderr().lock();
            // Clear the counter so following output starts on a clean line
            let _ = write!(stderr, "\r\x1b[2K");
            let _ = stderr.flush();
            self.drawn = false;
        }
    }
}

/// Reports progress through `tracing`
#[derive(Debug)]
pub struct LogProgress {
    label: &'static str,
    done: u64,
    total: u64,
}

impl LogProgress {
    pub fn new(label: &'static str, total: u64) -> Self {
        Self {
            label,
            done: 0,
            total,
        }
    }
}

impl Progress for LogProgress {
    fn advance(&mut self, n: u64) {
        self.done += n;
        info!(label = self.label, done = self.done, total = self.total, "progress");
    }

    fn finish(&mut self) {
        info!(label = self.label, done = self.done, total = self.total, "finished");
    }
}
