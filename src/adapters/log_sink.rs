//! Session-backed log sink.
//!
//! Implements [`log::Log`].  Every record goes to the serial console.
//! While a session is active each record is also queued in a bounded
//! backlog (oldest line dropped when full) and the session supervisor
//! publishes queued lines to the `log` topic.
//!
//! The backlog mutex is never held while a line is being published, so a
//! transport that logs from inside `publish()` cannot deadlock the sink.

use core::fmt::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use heapless::{Deque, String};
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

/// Longest line forwarded to the session; longer lines are truncated.
pub const LOG_LINE_MAX: usize = 128;
/// Lines held while waiting for the next tick.
pub const BACKLOG_LINES: usize = 16;

pub type LogLine = String<LOG_LINE_MAX>;

struct SinkState {
    publishing: bool,
    backlog: Deque<LogLine, BACKLOG_LINES>,
}

pub struct SessionLogSink {
    state: Mutex<SinkState>,
}

static SINK: SessionLogSink = SessionLogSink::new();

impl Default for SessionLogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLogSink {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(SinkState {
                publishing: false,
                backlog: Deque::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SinkState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn route_to_session(&self) {
        self.state().publishing = true;
    }

    /// Serial only.  Anything still queued is discarded.
    pub fn route_to_serial(&self) {
        let mut state = self.state();
        state.publishing = false;
        state.backlog.clear();
    }

    pub fn is_publishing(&self) -> bool {
        self.state().publishing
    }

    pub fn pending(&self) -> usize {
        self.state().backlog.len()
    }

    /// Queue one line for the session.  No-op while routed to serial.
    pub fn enqueue(&self, line: &str) {
        let mut state = self.state();
        if !state.publishing {
            return;
        }
        let mut queued = LogLine::new();
        for c in line.chars() {
            if queued.push(c).is_err() {
                break;
            }
        }
        if state.backlog.is_full() {
            state.backlog.pop_front();
        }
        let _ = state.backlog.push_back(queued);
    }

    /// Hand at most `max` queued lines to `f`, oldest first.  Returns how
    /// many were handed over.
    pub fn drain(&self, max: usize, mut f: impl FnMut(&str)) -> usize {
        let mut sent = 0;
        while sent < max {
            // Guard dropped before `f` runs.
            let line = {
                let mut state = self.state();
                if !state.publishing {
                    break;
                }
                state.backlog.pop_front()
            };
            let Some(line) = line else { break };
            f(&line);
            sent += 1;
        }
        sent
    }
}

impl Log for SessionLogSink {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        println!("[{:<5}] {}", record.level(), record.args());

        let mut line = LogLine::new();
        // A full buffer just truncates the line.
        let _ = write!(line, "{}", record.args());
        self.enqueue(&line);
    }

    fn flush(&self) {}
}

/// Install the global sink.  Fails if another logger is already set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&SINK)?;
    log::set_max_level(level);
    Ok(())
}

pub fn route_to_session() {
    SINK.route_to_session();
}

pub fn route_to_serial() {
    SINK.route_to_serial();
}

pub fn drain(max: usize, f: impl FnMut(&str)) -> usize {
    SINK.drain(max, f)
}
