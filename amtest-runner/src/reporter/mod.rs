// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporting of test events.
//!
//! The runner writes every test event to a [`StructuredLog`]. Two implementations are
//! provided: [`TbplDisplayer`] for human-readable output that mozharness can parse, and
//! [`JsonReporter`] for one JSON object per line.

mod displayer;
mod events;
mod structured;

pub use displayer::*;
pub use events::*;
pub use structured::*;

use crate::{
    errors::WriteEventError,
    instrument::TestOutcome,
    runner::{InvocationStatus, RunStats},
};
use std::time::Duration;

/// A sink for test events.
///
/// Implementors only need to provide [`write_event`](Self::write_event).
pub trait StructuredLog {
    /// Writes an event.
    fn write_event(&mut self, event: LogEvent<'_>) -> Result<(), WriteEventError>;

    /// Writes a [`LogEventKind::SuiteStart`] event.
    fn suite_start(&mut self, tests: &[&str]) -> Result<(), WriteEventError> {
        self.write_event(LogEvent::now(LogEventKind::SuiteStart { tests }))
    }

    /// Writes a [`LogEventKind::TestStart`] event.
    fn test_start(&mut self, test: &str) -> Result<(), WriteEventError> {
        self.write_event(LogEvent::now(LogEventKind::TestStart { test }))
    }

    /// Writes a [`LogEventKind::TestStatus`] event.
    fn test_status(
        &mut self,
        test: &str,
        subtest: &str,
        status: TestOutcome,
        stack: Option<&str>,
        message: Option<&str>,
    ) -> Result<(), WriteEventError> {
        self.write_event(LogEvent::now(LogEventKind::TestStatus {
            test,
            subtest,
            status,
            stack,
            message,
        }))
    }

    /// Writes a [`LogEventKind::TestEnd`] event.
    fn test_end(
        &mut self,
        test: &str,
        status: InvocationStatus,
        time_taken: Duration,
    ) -> Result<(), WriteEventError> {
        self.write_event(LogEvent::now(LogEventKind::TestEnd {
            test,
            status,
            time_taken,
        }))
    }

    /// Writes a [`LogEventKind::SuiteEnd`] event.
    fn suite_end(&mut self, time_taken: Duration, stats: RunStats) -> Result<(), WriteEventError> {
        self.write_event(LogEvent::now(LogEventKind::SuiteEnd { time_taken, stats }))
    }

    /// Writes a [`LogEventKind::Info`] event.
    fn info(&mut self, message: &str) -> Result<(), WriteEventError> {
        self.write_event(LogEvent::now(LogEventKind::Info { message }))
    }

    /// Writes a [`LogEventKind::Error`] event.
    fn error(&mut self, message: &str) -> Result<(), WriteEventError> {
        self.write_event(LogEvent::now(LogEventKind::Error { message }))
    }
}

impl<T: StructuredLog + ?Sized> StructuredLog for &mut T {
    fn write_event(&mut self, event: LogEvent<'_>) -> Result<(), WriteEventError> {
        (**self).write_event(event)
    }
}

impl<T: StructuredLog + ?Sized> StructuredLog for Box<T> {
    fn write_event(&mut self, event: LogEvent<'_>) -> Result<(), WriteEventError> {
        (**self).write_event(event)
    }
}
