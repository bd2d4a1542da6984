//! # Kernel Logging Sink
//!
//! A `log::Log` implementation that formats every record into a
//! [`core::fmt::Write`] sink: a UART driver on hardware, a `String` in hosted
//! tests. The sink sits behind a [`SpinLock`], so records from different
//! processors never interleave mid-line.
//!
//! ## Record Format
//!
//! ```text
//! [LEVEL] target: message
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use kernel_log::SinkLogger;
//! use log::{LevelFilter, info};
//!
//! static LOGGER: SinkLogger<String> = SinkLogger::new(String::new(), LevelFilter::Debug);
//!
//! LOGGER.init().expect("logger initialization");
//! info!("frame allocator online");
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]

use core::fmt::{self, Write};
use kernel_sync::SpinLock;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

pub struct SinkLogger<W> {
    max_level: LevelFilter,
    sink: SpinLock<W>,
}

impl<W> SinkLogger<W>
where
    W: Write + Send,
{
    #[must_use]
    pub const fn new(sink: W, max_level: LevelFilter) -> Self {
        Self {
            max_level,
            sink: SpinLock::new("log-sink", sink),
        }
    }

    /// Install this logger as the global `log` backend. Call once during early init.
    ///
    /// # Errors
    /// Fails if another logger was already installed.
    pub fn init(&'static self) -> Result<(), SetLoggerError>
    where
        W: 'static,
    {
        log::set_logger(self)?;
        log::set_max_level(self.max_level);
        Ok(())
    }

    #[must_use]
    pub const fn max_level(&self) -> LevelFilter {
        self.max_level
    }

    /// Run `f` with exclusive access to the sink, e.g. to drain a capture buffer.
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut W) -> R) -> R {
        self.sink.with_lock(f)
    }
}

impl<W> Log for SinkLogger<W>
where
    W: Write + Send,
{
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Sink errors are dropped.
        let _ = self.sink.with_lock(|sink| write_record(sink, record));
    }

    fn flush(&self) {}
}

fn write_record<W: Write>(sink: &mut W, record: &Record) -> fmt::Result {
    writeln!(
        sink,
        "[{}] {}: {}",
        record.level(),
        record.target(),
        record.args()
    )
}
