// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{LogEvent, LogEventKind, StructuredLog};
use crate::{errors::WriteEventError, runner::InvocationStatus};
use owo_colors::{OwoColorize, Style};
use std::io::Write;

/// Writes test events as TBPL lines, the format mozharness scrapes from test logs.
///
/// ```text
/// SUITE-START | Running 2 tests
/// TEST-START | src/TestSanity.java
/// TEST-PASS | src/TestSanity.java | org.example.TestSanity#testOne
/// TEST-OK | src/TestSanity.java | took 1043ms
/// ```
pub struct TbplDisplayer<W> {
    writer: W,
    styles: Styles,
}

impl<W: Write> TbplDisplayer<W> {
    /// Creates a new displayer writing to `writer`, without colors.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            styles: Styles::default(),
        }
    }

    /// Colorizes output.
    pub fn colorize(&mut self) {
        self.styles.colorize();
    }

    /// Consumes the displayer, returning the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_event_impl(&mut self, event: &LogEvent<'_>) -> std::io::Result<()> {
        let styles = &self.styles;
        let writer = &mut self.writer;
        match &event.kind {
            LogEventKind::SuiteStart { tests } => {
                writeln!(
                    writer,
                    "SUITE-START | Running {} tests",
                    tests.len().style(styles.count)
                )?;
            }
            LogEventKind::TestStart { test } => {
                writeln!(writer, "TEST-START | {test}")?;
            }
            LogEventKind::TestStatus {
                test,
                subtest,
                status,
                stack,
                message,
            } => {
                if status.is_success() {
                    writeln!(writer, "{} | {test} | {subtest}", "TEST-PASS".style(styles.pass))?;
                } else {
                    let label = format!("TEST-UNEXPECTED-{status}");
                    write!(writer, "{} | {test} | {subtest}", label.style(styles.fail))?;
                    let summary = message.or_else(|| stack.and_then(|s| s.lines().next()));
                    match summary {
                        Some(summary) => writeln!(writer, " - {summary}")?,
                        None => writeln!(writer)?,
                    }
                    if let Some(stack) = stack {
                        for line in stack.lines() {
                            writeln!(writer, "    {line}")?;
                        }
                    }
                }
            }
            LogEventKind::TestEnd {
                test,
                status,
                time_taken,
            } => {
                let (label, style) = match status {
                    InvocationStatus::Ok => ("TEST-OK".to_owned(), styles.pass),
                    InvocationStatus::Skip => ("TEST-SKIP".to_owned(), styles.skip),
                    other => (format!("TEST-UNEXPECTED-{other}"), styles.fail),
                };
                writeln!(
                    writer,
                    "{} | {test} | took {}ms",
                    label.style(style),
                    time_taken.as_millis()
                )?;
            }
            LogEventKind::SuiteEnd { time_taken, stats } => {
                let style = if stats.is_success() {
                    styles.pass
                } else {
                    styles.fail
                };
                writeln!(
                    writer,
                    "{} | took {:.3}s",
                    "SUITE-END".style(style),
                    time_taken.as_secs_f64()
                )?;
            }
            LogEventKind::Info { message } => {
                writeln!(writer, "INFO | {message}")?;
            }
            LogEventKind::Error { message } => {
                writeln!(writer, "{} | {message}", "ERROR".style(styles.fail))?;
            }
        }
        writer.flush()
    }
}

impl<W: Write> StructuredLog for TbplDisplayer<W> {
    fn write_event(&mut self, event: LogEvent<'_>) -> Result<(), WriteEventError> {
        self.write_event_impl(&event).map_err(WriteEventError::Io)
    }
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    skip: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
    }
}
