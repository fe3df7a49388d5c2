//! Implements the logger instance. Output goes to the optional debug sideband; when no sink was
//! detected, records are dropped.

use core::fmt::{self, Write};

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

use crate::LOG_LEVEL;

/// A write-only passive output channel.
pub trait DebugSink {
    /// Checks whether the device is present with a read-after-write sentinel.
    fn probe(&mut self) -> bool;

    fn write(&mut self, bytes: &[u8]);
}

struct SinkWriter<'a, S>(&'a mut S);

impl<S: DebugSink> Write for SinkWriter<'_, S> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write(s.as_bytes());
        Ok(())
    }
}

/// Forwards `log` records to a [`DebugSink`]. Use the `log` macros rather than this type directly.
pub struct EnvLogger<S> {
    sink: Mutex<Option<S>>,
}

impl<S> EnvLogger<S> {
    pub const fn new() -> Self {
        Self {
            sink: Mutex::new(None),
        }
    }

    /// Installs the probed sink. `None` keeps the logger silent.
    pub fn attach(&self, sink: Option<S>) {
        *self.sink.lock() = sink;
    }

    pub fn detach(&self) -> Option<S> {
        self.sink.lock().take()
    }
}

impl<S: DebugSink + Send> Log for EnvLogger<S> {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        if let Some(sink) = self.sink.lock().as_mut() {
            let _ = writeln!(SinkWriter(sink), "[{:>5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Maps a level name to a filter. Unknown names turn logging off.
pub fn level_filter(name: &str) -> LevelFilter {
    [
        ("error", LevelFilter::Error),
        ("warn", LevelFilter::Warn),
        ("info", LevelFilter::Info),
        ("debug", LevelFilter::Debug),
        ("trace", LevelFilter::Trace),
    ]
    .into_iter()
    .find(|(level, _)| level.eq_ignore_ascii_case(name))
    .map_or(LevelFilter::Off, |(_, filter)| filter)
}

/// Registers `logger` with `log` and applies the build-time `BOOT_LOG_LEVEL`.
pub fn init_env_logger<S: DebugSink + Send>(
    logger: &'static EnvLogger<S>,
) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(level_filter(LOG_LEVEL));

    Ok(())
}
