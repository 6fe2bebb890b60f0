// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{Classification, FinishedBundle, ParsedBlock, StatusBlockSplitter, TestOutcome};
use amtest_metadata::TestCaseSummary;
use std::{fmt, iter::FusedIterator};
use tracing::{debug, warn};

/// Reported as the failure text when the stream ends while a test is running.
const TRUNCATED_MESSAGE: &str = "instrumentation output ended before the test reported a result";

/// Reported as the failure text when the stream ends without a finished bundle.
const NO_BUNDLE_MESSAGE: &str = "instrumentation output ended without a result bundle";

/// The (class, method) pair identifying a test within a run.
///
/// Either part may be absent if the harness didn't report it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct TestIdentity {
    class: Option<String>,
    method: Option<String>,
}

impl TestIdentity {
    /// Creates a new identity.
    pub fn new(class: Option<&str>, method: Option<&str>) -> Self {
        Self {
            class: class.map(str::to_owned),
            method: method.map(str::to_owned),
        }
    }

    /// Returns the class name.
    pub fn class(&self) -> Option<&str> {
        self.class.as_deref()
    }

    /// Returns the method name.
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Returns true if neither part was reported.
    pub fn is_empty(&self) -> bool {
        self.class.is_none() && self.method.is_none()
    }
}

impl fmt::Display for TestIdentity {
    /// Formats as `class#method`. An empty identity formats as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return Ok(());
        }
        write!(
            f,
            "{}#{}",
            self.class.as_deref().unwrap_or_default(),
            self.method.as_deref().unwrap_or_default()
        )
    }
}

/// A completed result for one test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCaseResult {
    /// The test this result is for.
    ///
    /// Empty for results that can't be attributed to a test, such as the instrumentation
    /// process crashing before any test started.
    pub identity: TestIdentity,

    /// The outcome.
    pub outcome: TestOutcome,

    /// The failure text, if any.
    pub stack: Option<String>,

    /// A note added while classifying this result.
    pub message: Option<String>,
}

impl TestCaseResult {
    fn crash(identity: TestIdentity, stack: Option<&str>) -> Self {
        Self {
            identity,
            outcome: TestOutcome::Crash,
            stack: stack.map(str::to_owned),
            message: None,
        }
    }

    /// Returns the serializable form of this result.
    pub fn to_summary(&self) -> TestCaseSummary {
        TestCaseSummary {
            name: self.identity.to_string(),
            outcome: self.outcome.to_summary(),
            stack: self.stack.clone(),
            message: self.message.clone(),
        }
    }
}

/// An input to the [`ReducerState`] machine.
#[derive(Clone, Debug, PartialEq)]
pub enum ReducerInput {
    /// A parsed block.
    Block(ParsedBlock),

    /// The stream has ended.
    EndOfInput,
}

/// The state of the result reducer for one `am instrument` invocation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReducerState {
    /// Waiting for the next terminal status block.
    AwaitingResult {
        /// The test that has reported in-progress status but no result yet.
        pending: Option<TestIdentity>,

        /// Whether a finished bundle has been seen.
        bundle_seen: bool,
    },

    /// No further results will be produced: either the stream ended or a crash was reported.
    Done,
}

impl Default for ReducerState {
    fn default() -> Self {
        Self::AwaitingResult {
            pending: None,
            bundle_seen: false,
        }
    }
}

impl ReducerState {
    /// Advances the state machine by one input, returning the new state and the result
    /// completed by this input, if any.
    pub fn step(self, input: ReducerInput) -> (Self, Option<TestCaseResult>) {
        let Self::AwaitingResult {
            pending,
            bundle_seen,
        } = self
        else {
            return (Self::Done, None);
        };

        match input {
            ReducerInput::Block(ParsedBlock::Status(record)) => {
                let identity = record.identity();
                match record.code().classify() {
                    Classification::InProgress => {
                        debug!(%identity, "test started");
                        let state = Self::AwaitingResult {
                            pending: Some(identity),
                            bundle_seen,
                        };
                        (state, None)
                    }
                    Classification::Terminal { outcome, note } => {
                        if let Some(note) = &note {
                            warn!(%identity, "{note}");
                        }
                        let stack = if record.code().get() < 0 {
                            record.stack().map(str::to_owned)
                        } else {
                            None
                        };
                        let result = TestCaseResult {
                            identity,
                            outcome,
                            stack,
                            message: note,
                        };
                        let state = Self::AwaitingResult {
                            pending: None,
                            bundle_seen,
                        };
                        (state, Some(result))
                    }
                }
            }
            ReducerInput::Block(ParsedBlock::Malformed(err)) => {
                warn!("{err}, recording an error result");
                let result = TestCaseResult {
                    identity: TestIdentity::default(),
                    outcome: TestOutcome::Error,
                    stack: Some(err.block().trim_end().to_owned()),
                    message: Some(err.to_string()),
                };
                let state = Self::AwaitingResult {
                    pending: None,
                    bundle_seen,
                };
                (state, Some(result))
            }
            ReducerInput::Block(ParsedBlock::Unterminated(_)) if bundle_seen => {
                debug!("ignoring output after the finished bundle");
                let state = Self::AwaitingResult {
                    pending,
                    bundle_seen,
                };
                (state, None)
            }
            ReducerInput::Block(
                ParsedBlock::Finished(bundle) | ParsedBlock::Unterminated(bundle),
            ) => {
                if bundle.is_ok() {
                    let state = Self::AwaitingResult {
                        pending: None,
                        bundle_seen: true,
                    };
                    (state, None)
                } else {
                    let result = Self::bundle_crash(pending, &bundle);
                    (Self::Done, Some(result))
                }
            }
            ReducerInput::EndOfInput => {
                let result = match pending {
                    Some(identity) => {
                        Some(TestCaseResult::crash(identity, Some(TRUNCATED_MESSAGE)))
                    }
                    None if !bundle_seen => Some(TestCaseResult::crash(
                        TestIdentity::default(),
                        Some(NO_BUNDLE_MESSAGE),
                    )),
                    None => None,
                };
                (Self::Done, result)
            }
        }
    }

    fn bundle_crash(pending: Option<TestIdentity>, bundle: &FinishedBundle) -> TestCaseResult {
        let identity = pending.unwrap_or_default();
        warn!(
            identity = %identity,
            code = bundle.code(),
            "instrumentation finished abnormally"
        );
        TestCaseResult::crash(identity, bundle.message())
    }
}

/// Reduces the blocks of one `am instrument` invocation into completed test case results.
///
/// Created by [`parse_results`](super::parse_results). After a `CRASH` result no further results
/// are produced, even if more blocks follow.
#[derive(Clone, Debug)]
pub struct ResultStream<'a> {
    blocks: StatusBlockSplitter<'a>,
    state: ReducerState,
}

impl<'a> ResultStream<'a> {
    /// Creates a new result stream over the given blocks.
    pub fn new(blocks: StatusBlockSplitter<'a>) -> Self {
        Self {
            blocks,
            state: ReducerState::default(),
        }
    }

}

impl Iterator for ResultStream<'_> {
    type Item = TestCaseResult;

    fn next(&mut self) -> Option<Self::Item> {
        while self.state != ReducerState::Done {
            let input = match self.blocks.next() {
                Some(raw) => ReducerInput::Block(ParsedBlock::parse(raw)),
                None => ReducerInput::EndOfInput,
            };
            let (state, result) = std::mem::take(&mut self.state).step(input);
            self.state = state;
            if result.is_some() {
                return result;
            }
        }
        None
    }
}

impl FusedIterator for ResultStream<'_> {}
