// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running a suite of instrumentation tests against a device.

use crate::{
    errors::{DisplayErrorChain, WriteEventError},
    instrument::{TestCaseResult, TestOutcome, parse_results},
    manifest::TestDescriptor,
    reporter::StructuredLog,
    stopwatch::{StopwatchStart, stopwatch},
    transport::Transport,
};
use amtest_metadata::SuiteSummary;
use chrono::{DateTime, Local};
use std::{fmt, time::Duration};
use tracing::{debug, info, warn};

/// The subtest name used for results that can't be attributed to a test case.
pub const INSTRUMENTATION_SUBTEST: &str = "instrumentation";

/// Builds the command that runs `test` on the device.
///
/// The command is `base`, then `-e class <class>` if the descriptor names a class, then the
/// `package/runner` component.
pub fn build_instrument_command(base: &[String], test: &TestDescriptor) -> Vec<String> {
    let mut command = base.to_vec();
    if let Some(class) = &test.class {
        command.extend(["-e".to_owned(), "class".to_owned(), class.clone()]);
    }
    command.push(format!("{}/{}", test.package, test.runner));
    command
}

/// The overall status of one test invocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum InvocationStatus {
    /// Every test case passed.
    Ok,

    /// At least one test case did not pass.
    Fail,

    /// The instrumentation process crashed.
    Crash,

    /// The test could not be run on the device.
    Error,

    /// The test is disabled and was not run.
    Skip,
}

impl InvocationStatus {
    /// Returns the uppercase name of this status, as written to logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Fail => "FAIL",
            Self::Crash => "CRASH",
            Self::Error => "ERROR",
            Self::Skip => "SKIP",
        }
    }

    /// Folds the outcome of another test case into this status.
    fn absorb(self, outcome: TestOutcome) -> Self {
        match (self, outcome) {
            (_, TestOutcome::Crash) | (Self::Crash, _) => Self::Crash,
            (_, TestOutcome::Fail | TestOutcome::Error) => Self::Fail,
            (status, TestOutcome::Pass) => status,
        }
    }
}

impl fmt::Display for InvocationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Statistics for a suite run.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RunStats {
    /// The number of tests that passed.
    pub passed: usize,

    /// The number of tests that failed, errored or crashed.
    pub failed: usize,

    /// The number of tests that were disabled.
    pub skipped: usize,
}

impl RunStats {
    /// Returns true if this run is considered a success: no tests failed.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Returns the serializable form of these statistics.
    pub fn to_summary(&self) -> SuiteSummary {
        SuiteSummary {
            passed: self.passed,
            failed: self.failed,
            skipped: self.skipped,
        }
    }

    fn record(&mut self, status: InvocationStatus) {
        match status {
            InvocationStatus::Ok => self.passed += 1,
            InvocationStatus::Skip => self.skipped += 1,
            InvocationStatus::Fail | InvocationStatus::Crash | InvocationStatus::Error => {
                self.failed += 1
            }
        }
    }
}

/// The result of invoking one test descriptor.
#[derive(Clone, Debug)]
pub struct InvocationResult {
    /// The test ID.
    pub test: String,

    /// The overall status.
    pub status: InvocationStatus,

    /// The test case results that were reported, in order.
    ///
    /// Reporting stops at the first crash.
    pub results: Vec<TestCaseResult>,

    /// How long the invocation took.
    pub time_taken: Duration,
}

/// The result of running a suite.
#[derive(Clone, Debug)]
pub struct SuiteRun {
    /// When the suite started.
    pub start_time: DateTime<Local>,

    /// How long the suite took.
    pub time_taken: Duration,

    /// One result per test descriptor, in run order.
    pub invocations: Vec<InvocationResult>,

    /// Final counts.
    pub stats: RunStats,
}

/// Runs instrumentation tests one at a time against a single device.
pub struct InstrumentationRunner<'a> {
    transport: &'a dyn Transport,
    instrument_command: Vec<String>,
}

impl<'a> InstrumentationRunner<'a> {
    /// Creates a new runner.
    ///
    /// `instrument_command` is the prefix of every command sent to the device, typically
    /// `am instrument -w -r`.
    pub fn new(transport: &'a dyn Transport, instrument_command: Vec<String>) -> Self {
        Self {
            transport,
            instrument_command,
        }
    }

    /// Runs `tests` in order, writing events to `log`.
    ///
    /// Failures within a test never stop the suite. The only error returned is a failure to
    /// write to the log.
    pub fn run_tests(
        &self,
        tests: &[TestDescriptor],
        log: &mut dyn StructuredLog,
    ) -> Result<SuiteRun, WriteEventError> {
        let suite_stopwatch = stopwatch();
        let ids: Vec<&str> = tests.iter().map(|test| test.id()).collect();
        log.suite_start(&ids)?;

        let mut stats = RunStats::default();
        let mut invocations = Vec::with_capacity(tests.len());
        for test in tests {
            let invocation = self.run_test(test, log)?;
            stats.record(invocation.status);
            invocations.push(invocation);
        }

        let snapshot = suite_stopwatch.snapshot();
        log.suite_end(snapshot.duration, stats)?;
        log.info("Result summary:")?;
        log.info(&format!("Passed: {}", stats.passed))?;
        log.info(&format!("Failed: {}", stats.failed))?;
        if stats.skipped > 0 {
            log.info(&format!("Skipped: {}", stats.skipped))?;
        }

        Ok(SuiteRun {
            start_time: snapshot.start_time,
            time_taken: snapshot.duration,
            invocations,
            stats,
        })
    }

    fn run_test(
        &self,
        test: &TestDescriptor,
        log: &mut dyn StructuredLog,
    ) -> Result<InvocationResult, WriteEventError> {
        let id = test.id();
        let test_stopwatch = stopwatch();
        info!("running {} ({id})", test.name);
        log.test_start(id)?;

        if let Some(reason) = &test.disabled {
            log.info(&format!("Skipping {id}: {reason}"))?;
            return finish(id, InvocationStatus::Skip, Vec::new(), test_stopwatch, log);
        }

        let command = build_instrument_command(&self.instrument_command, test);
        debug!(test = id, ?command, "running instrumentation");
        let output = match self.transport.execute(&command) {
            Ok(output) => output,
            Err(err) => {
                let err = DisplayErrorChain::new(err);
                warn!(test = id, "failed to run instrumentation: {err}");
                log.error(&format!("{id}: {err}"))?;
                return finish(id, InvocationStatus::Error, Vec::new(), test_stopwatch, log);
            }
        };

        let mut status = InvocationStatus::Ok;
        let mut results = Vec::new();
        for result in parse_results(&output) {
            let subtest = if result.identity.is_empty() {
                INSTRUMENTATION_SUBTEST.to_owned()
            } else {
                result.identity.to_string()
            };
            log.test_status(
                id,
                &subtest,
                result.outcome,
                result.stack.as_deref(),
                result.message.as_deref(),
            )?;
            status = status.absorb(result.outcome);
            results.push(result);
            if status == InvocationStatus::Crash {
                break;
            }
        }

        finish(id, status, results, test_stopwatch, log)
    }
}

fn finish(
    id: &str,
    status: InvocationStatus,
    results: Vec<TestCaseResult>,
    test_stopwatch: StopwatchStart,
    log: &mut dyn StructuredLog,
) -> Result<InvocationResult, WriteEventError> {
    let time_taken = test_stopwatch.snapshot().duration;
    log.test_end(id, status, time_taken)?;
    Ok(InvocationResult {
        test: id.to_owned(),
        status,
        results,
        time_taken,
    })
}
