// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `amtest` failures.
///
/// `amtest` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum AmtestExitCode {}

impl AmtestExitCode {
    /// No errors occurred and every test passed (or was skipped).
    pub const OK: i32 = 0;

    /// One or more tests failed, errored or crashed.
    pub const TEST_RUN_FAILED: i32 = 1;

    /// The test manifest could not be resolved, so no tests were run.
    pub const MANIFEST_RESOLUTION_FAILED: i32 = 2;

    /// Connecting to the device or installing packages on it failed before any tests ran.
    pub const DEVICE_SETUP_FAILED: i32 = 3;

    /// A user issue happened while setting up an amtest invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
