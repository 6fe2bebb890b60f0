// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use amtest_metadata::OutcomeSummary;
use std::fmt;

/// A raw `INSTRUMENTATION_STATUS_CODE:` value.
///
/// For an individual test result, `am` reports 0 for success, -1 for errors and -2 for failures.
/// Errors roughly correspond to unexpected exceptions, while failures correspond to failed
/// assertions. 1 is reported when a test starts.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct StatusCode(i32);

impl StatusCode {
    /// A test has started and hasn't reported a result yet.
    pub const IN_PROGRESS: Self = Self(1);

    /// The test passed.
    pub const OK: Self = Self(0);

    /// The test threw an unexpected exception.
    pub const ERROR: Self = Self(-1);

    /// The test failed an assertion.
    pub const FAILURE: Self = Self(-2);

    /// Creates a new status code.
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw code.
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Classifies this code.
    pub fn classify(self) -> Classification {
        match self {
            Self::IN_PROGRESS => Classification::InProgress,
            Self::OK => Classification::terminal(TestOutcome::Pass),
            Self::ERROR => Classification::terminal(TestOutcome::Error),
            Self::FAILURE => Classification::terminal(TestOutcome::Fail),
            Self(other) => Classification::Terminal {
                outcome: TestOutcome::Error,
                note: Some(format!("unrecognized instrumentation status code {other}")),
            },
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a status code means for the test it reports on.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Classification {
    /// The test is still running. More status blocks will follow for it.
    InProgress,

    /// The test has finished with this outcome.
    Terminal {
        /// The outcome.
        outcome: TestOutcome,

        /// A note explaining the classification, set for unrecognized codes.
        note: Option<String>,
    },
}

impl Classification {
    fn terminal(outcome: TestOutcome) -> Self {
        Self::Terminal {
            outcome,
            note: None,
        }
    }
}

/// The outcome of a single test case.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum TestOutcome {
    /// The test passed.
    Pass,

    /// The test failed an assertion.
    Fail,

    /// The test threw an unexpected exception.
    Error,

    /// The instrumentation process died before the test reported a result.
    Crash,
}

impl TestOutcome {
    /// Returns true if the test passed.
    pub fn is_success(self) -> bool {
        match self {
            Self::Pass => true,
            Self::Fail | Self::Error | Self::Crash => false,
        }
    }

    /// Returns the uppercase name of this outcome, as written to logs.
    pub fn as_str(self) -> &'static str {
        self.to_summary().as_str()
    }

    /// Returns the serializable form of this outcome.
    pub fn to_summary(self) -> OutcomeSummary {
        match self {
            Self::Pass => OutcomeSummary::Pass,
            Self::Fail => OutcomeSummary::Fail,
            Self::Error => OutcomeSummary::Error,
            Self::Crash => OutcomeSummary::Crash,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}
