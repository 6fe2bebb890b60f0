// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of a single test case, as reported by the instrumentation harness.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutcomeSummary {
    /// The test passed.
    Pass,

    /// The test failed an assertion.
    Fail,

    /// The test threw an unexpected exception, or reported an unrecognized status code.
    Error,

    /// The instrumentation process died before the test reported a result.
    Crash,
}

impl OutcomeSummary {
    /// Returns the uppercase name used in logs and structured output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "PASS",
            Self::Fail => "FAIL",
            Self::Error => "ERROR",
            Self::Crash => "CRASH",
        }
    }

    /// Returns true if the test passed.
    pub fn is_success(self) -> bool {
        self == Self::Pass
    }
}

impl fmt::Display for OutcomeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// A single reduced test case result.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestCaseSummary {
    /// The test name, in the form `class#method`. Empty for results that aren't attributable to
    /// a single test, such as an instrumentation crash before any test started.
    pub name: String,

    /// The outcome of the test.
    pub outcome: OutcomeSummary,

    /// The failure text (typically a Java stack trace), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    /// A note added by amtest, e.g. for an unrecognized status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The results of a single `am instrument` invocation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct InvocationSummary {
    /// The reduced test case results, in stream order.
    pub test_cases: Vec<TestCaseSummary>,
}

impl InvocationSummary {
    /// Returns true if every test case passed.
    ///
    /// An invocation with no test cases is considered successful.
    pub fn is_success(&self) -> bool {
        self.test_cases
            .iter()
            .all(|case| case.outcome.is_success())
    }

    /// Parses a summary from its JSON form.
    pub fn parse_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Aggregate counts for a suite run.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SuiteSummary {
    /// The number of test descriptors whose invocation passed.
    pub passed: usize,

    /// The number of test descriptors whose invocation failed, errored or crashed.
    pub failed: usize,

    /// The number of test descriptors that were disabled and not run.
    pub skipped: usize,
}
