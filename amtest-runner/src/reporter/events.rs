// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    instrument::TestOutcome,
    runner::{InvocationStatus, RunStats},
};
use chrono::{DateTime, FixedOffset, Local};
use std::time::Duration;

/// An event written to a [`StructuredLog`](super::StructuredLog).
///
/// Events are produced by an [`InstrumentationRunner`](crate::runner::InstrumentationRunner).
#[derive(Clone, Debug)]
pub struct LogEvent<'a> {
    /// The time at which the event was generated, including the offset from UTC.
    pub timestamp: DateTime<FixedOffset>,

    /// The kind of event this is.
    pub kind: LogEventKind<'a>,
}

impl<'a> LogEvent<'a> {
    /// Creates an event timestamped now.
    pub fn now(kind: LogEventKind<'a>) -> Self {
        Self {
            timestamp: Local::now().fixed_offset(),
            kind,
        }
    }
}

/// The kind of log event this is.
///
/// Forms part of [`LogEvent`].
#[derive(Clone, Debug)]
pub enum LogEventKind<'a> {
    /// The suite started.
    SuiteStart {
        /// The IDs of every test in the suite, in run order.
        tests: &'a [&'a str],
    },

    /// A test started. Emitted before the test's instrumentation command is sent.
    TestStart {
        /// The test ID.
        test: &'a str,
    },

    /// A test case within a test finished.
    TestStatus {
        /// The test ID.
        test: &'a str,

        /// The name of the test case.
        subtest: &'a str,

        /// The outcome of the test case.
        status: TestOutcome,

        /// The failure text, if any.
        stack: Option<&'a str>,

        /// A note about the outcome, if any.
        message: Option<&'a str>,
    },

    /// A test finished.
    TestEnd {
        /// The test ID.
        test: &'a str,

        /// The overall status of the test.
        status: InvocationStatus,

        /// How long the test took.
        time_taken: Duration,
    },

    /// The suite finished.
    SuiteEnd {
        /// How long the suite took.
        time_taken: Duration,

        /// Final counts.
        stats: RunStats,
    },

    /// An informational message.
    Info {
        /// The message.
        message: &'a str,
    },

    /// An error message.
    Error {
        /// The message.
        message: &'a str,
    },
}
