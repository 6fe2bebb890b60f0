// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use amtest_runner::{
    errors::{TransportError, WriteEventError},
    instrument::TestOutcome,
    manifest::TestDescriptor,
    reporter::{LogEvent, LogEventKind, StructuredLog},
    runner::{InvocationStatus, RunStats},
    transport::Transport,
};
use camino::Utf8Path;
use indoc::indoc;
use std::{cell::RefCell, collections::HashMap};

pub(crate) const PASS_TRANSCRIPT: &str = indoc! {"
    INSTRUMENTATION_STATUS: class=org.example.PassTest
    INSTRUMENTATION_STATUS: test=testPass
    INSTRUMENTATION_STATUS_CODE: 1
    INSTRUMENTATION_STATUS: class=org.example.PassTest
    INSTRUMENTATION_STATUS: test=testPass
    INSTRUMENTATION_STATUS_CODE: 0
    INSTRUMENTATION_RESULT: stream=
    OK (1 test)
    INSTRUMENTATION_CODE: -1
"};

pub(crate) const FAIL_TRANSCRIPT: &str = indoc! {"
    INSTRUMENTATION_STATUS: class=org.example.FailTest
    INSTRUMENTATION_STATUS: test=testFail
    INSTRUMENTATION_STATUS_CODE: 1
    INSTRUMENTATION_STATUS: class=org.example.FailTest
    INSTRUMENTATION_STATUS: test=testFail
    INSTRUMENTATION_STATUS: stack=junit.framework.AssertionFailedError: expected:<1> but was:<2>
    at org.example.FailTest.testFail(FailTest.java:12)
    INSTRUMENTATION_STATUS_CODE: -2
    INSTRUMENTATION_RESULT: stream=
    FAILURES!!!
    INSTRUMENTATION_CODE: -1
"};

pub(crate) const CRASH_TRANSCRIPT: &str = indoc! {"
    INSTRUMENTATION_STATUS: class=org.example.CrashTest
    INSTRUMENTATION_STATUS: test=testCrash
    INSTRUMENTATION_STATUS_CODE: 1
    INSTRUMENTATION_RESULT: shortMsg=Process crashed.
    INSTRUMENTATION_CODE: 0
"};

pub(crate) fn descriptor(name: &str, class: &str) -> TestDescriptor {
    TestDescriptor {
        name: name.to_owned(),
        path: format!("src/org/example/{name}.java"),
        package: "org.example.tests".to_owned(),
        runner: "org.example.Runner".to_owned(),
        class: Some(class.to_owned()),
        apk: None,
        disabled: None,
    }
}

/// A transport that answers `execute` with canned output, keyed by the `-e class` argument.
#[derive(Default)]
pub(crate) struct FakeTransport {
    outputs: HashMap<String, String>,
    executed: RefCell<Vec<Vec<String>>>,
    installed: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub(crate) fn with_output(mut self, class: &str, output: &str) -> Self {
        self.outputs.insert(class.to_owned(), output.to_owned());
        self
    }

    pub(crate) fn executed(&self) -> Vec<Vec<String>> {
        self.executed.borrow().clone()
    }

    pub(crate) fn installed(&self) -> Vec<String> {
        self.installed.borrow().clone()
    }
}

impl Transport for FakeTransport {
    fn execute(&self, command: &[String]) -> Result<String, TransportError> {
        self.executed.borrow_mut().push(command.to_vec());
        let class = command
            .iter()
            .skip_while(|arg| *arg != "class")
            .nth(1)
            .cloned()
            .unwrap_or_default();
        self.outputs
            .get(&class)
            .cloned()
            .ok_or_else(|| TransportError::CommandFailed {
                command: command.join(" "),
                status: "exit status: 1".to_owned(),
                output: "device offline".to_owned(),
            })
    }

    fn push(&self, _local: &Utf8Path, _remote: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn remove(&self, _remote: &str) -> Result<(), TransportError> {
        Ok(())
    }

    fn install(&self, package: &Utf8Path) -> Result<(), TransportError> {
        self.installed.borrow_mut().push(package.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "fake device".to_owned()
    }
}

/// An owned copy of a [`LogEventKind`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum Recorded {
    SuiteStart(Vec<String>),
    TestStart(String),
    TestStatus {
        test: String,
        subtest: String,
        status: TestOutcome,
        stack: Option<String>,
    },
    TestEnd(String, InvocationStatus),
    SuiteEnd(RunStats),
    Info(String),
    Error(String),
}

#[derive(Debug, Default)]
pub(crate) struct RecordingLog {
    pub(crate) events: Vec<Recorded>,
}

impl RecordingLog {
    /// Returns the events with informational messages filtered out.
    pub(crate) fn test_events(&self) -> Vec<Recorded> {
        self.events
            .iter()
            .filter(|event| !matches!(event, Recorded::Info(_)))
            .cloned()
            .collect()
    }
}

impl StructuredLog for RecordingLog {
    fn write_event(&mut self, event: LogEvent<'_>) -> Result<(), WriteEventError> {
        let recorded = match event.kind {
            LogEventKind::SuiteStart { tests } => {
                Recorded::SuiteStart(tests.iter().map(|t| (*t).to_owned()).collect())
            }
            LogEventKind::TestStart { test } => Recorded::TestStart(test.to_owned()),
            LogEventKind::TestStatus {
                test,
                subtest,
                status,
                stack,
                ..
            } => Recorded::TestStatus {
                test: test.to_owned(),
                subtest: subtest.to_owned(),
                status,
                stack: stack.map(str::to_owned),
            },
            LogEventKind::TestEnd { test, status, .. } => {
                Recorded::TestEnd(test.to_owned(), status)
            }
            LogEventKind::SuiteEnd { stats, .. } => Recorded::SuiteEnd(stats),
            LogEventKind::Info { message } => Recorded::Info(message.to_owned()),
            LogEventKind::Error { message } => Recorded::Error(message.to_owned()),
        };
        self.events.push(recorded);
        Ok(())
    }
}
