// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{LogEvent, LogEventKind, StructuredLog};
use crate::errors::WriteEventError;
use amtest_metadata::SuiteSummary;
use serde::Serialize;
use std::io::Write;

/// The default `source` field for JSON events.
pub const DEFAULT_SOURCE: &str = "amtest";

/// Writes test events as JSON, one object per line.
///
/// Every object carries `action`, `time` (milliseconds since the Unix epoch) and `source`, plus
/// fields specific to the action.
pub struct JsonReporter<W> {
    writer: W,
    source: String,
}

impl<W: Write> JsonReporter<W> {
    /// Creates a new reporter writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            source: DEFAULT_SOURCE.to_owned(),
        }
    }

    /// Sets the `source` field written with every event.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Consumes the reporter, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> StructuredLog for JsonReporter<W> {
    fn write_event(&mut self, event: LogEvent<'_>) -> Result<(), WriteEventError> {
        let action = match &event.kind {
            LogEventKind::SuiteStart { tests } => JsonAction::SuiteStart { tests },
            LogEventKind::TestStart { test } => JsonAction::TestStart { test },
            LogEventKind::TestStatus {
                test,
                subtest,
                status,
                stack,
                message,
            } => JsonAction::TestStatus {
                test,
                subtest,
                status: status.as_str(),
                expected: "PASS",
                stack: *stack,
                message: *message,
            },
            LogEventKind::TestEnd {
                test,
                status,
                time_taken,
            } => JsonAction::TestEnd {
                test,
                status: status.as_str(),
                expected: "OK",
                duration_ms: time_taken.as_millis(),
            },
            LogEventKind::SuiteEnd { time_taken, stats } => JsonAction::SuiteEnd {
                duration_ms: time_taken.as_millis(),
                stats: stats.to_summary(),
            },
            LogEventKind::Info { message } => JsonAction::Log {
                level: "INFO",
                message,
            },
            LogEventKind::Error { message } => JsonAction::Log {
                level: "ERROR",
                message,
            },
        };

        let line = JsonLine {
            action,
            time: event.timestamp.timestamp_millis(),
            source: &self.source,
        };
        serde_json::to_writer(&mut self.writer, &line)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(flatten)]
    action: JsonAction<'a>,
    time: i64,
    source: &'a str,
}

#[derive(Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
enum JsonAction<'a> {
    SuiteStart {
        tests: &'a [&'a str],
    },
    TestStart {
        test: &'a str,
    },
    TestStatus {
        test: &'a str,
        subtest: &'a str,
        status: &'static str,
        expected: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<&'a str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'a str>,
    },
    TestEnd {
        test: &'a str,
        status: &'static str,
        expected: &'static str,
        duration_ms: u128,
    },
    SuiteEnd {
        duration_ms: u128,
        #[serde(flatten)]
        stats: SuiteSummary,
    },
    Log {
        level: &'static str,
        message: &'a str,
    },
}
