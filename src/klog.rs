// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Kernel logger
//!
//! Backend for the `log` facade. Records are formatted as
//! `[LEVEL target] message` and handed line by line to a [`LogSink`]
//! (serial port, framebuffer console, test buffer).
//!
//! # Usage
//!
//! ```ignore
//! static SERIAL: SerialSink = SerialSink::new(0x3F8);
//!
//! klog::init(&SERIAL, log::LevelFilter::Debug)?;
//! log::info!("boot: logger up");
//! ```

use core::fmt::{self, Write};

use log::{LevelFilter, Metadata, Record, SetLoggerError};
use spin::Once;

/// Destination of formatted log output
pub trait LogSink: Sync {
    /// Write a piece of a log line
    fn write_str(&self, s: &str);
}

/// Adapts a sink to `fmt::Write`
struct SinkWriter<'a>(&'a dyn LogSink);

impl Write for SinkWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.write_str(s);
        Ok(())
    }
}

/// `log::Log` implementation over a [`LogSink`]
pub struct KernelLogger {
    sink: &'static dyn LogSink,
    level: LevelFilter,
}

impl KernelLogger {
    pub const fn new(sink: &'static dyn LogSink, level: LevelFilter) -> Self {
        Self { sink, level }
    }
}

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // The sink cannot fail, so neither can formatting into it
        let _ = writeln!(
            SinkWriter(self.sink),
            "[{:<5} {}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {}
}

static LOGGER: Once<KernelLogger> = Once::new();

/// Install the kernel logger
///
/// Only the first call takes effect; later calls fail.
pub fn init(sink: &'static dyn LogSink, level: LevelFilter) -> Result<(), SetLoggerError> {
    let logger = LOGGER.call_once(|| KernelLogger::new(sink, level));
    log::set_logger(logger)?;
    log::set_max_level(level);
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
