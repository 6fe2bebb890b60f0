// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing for the status stream printed by `am instrument -r`.
//!
//! The instrumentation harness on the device reports progress as a sequence of key/value
//! blocks:
//!
//! ```text
//! INSTRUMENTATION_STATUS: class=org.example.FooTest
//! INSTRUMENTATION_STATUS: test=testBar
//! INSTRUMENTATION_STATUS_CODE: 1
//! INSTRUMENTATION_STATUS: class=org.example.FooTest
//! INSTRUMENTATION_STATUS: test=testBar
//! INSTRUMENTATION_STATUS_CODE: 0
//! INSTRUMENTATION_RESULT: stream=
//! OK (1 test)
//! INSTRUMENTATION_CODE: -1
//! ```
//!
//! Parsing happens in three lazy stages, each an iterator over the previous one:
//!
//! 1. [`StatusBlockSplitter`] cuts the raw text into [`RawBlock`]s.
//! 2. [`ParsedBlock::parse`] turns each raw block into a [`StatusRecord`] or a
//!    [`FinishedBundle`].
//! 3. [`ResultStream`] reduces parsed blocks into completed [`TestCaseResult`]s, including
//!    synthetic `CRASH` results when the stream ends before a test finished.
//!
//! [`parse_results`] chains all three together.

mod block;
mod classify;
mod reducer;
mod splitter;

pub use block::*;
pub use classify::*;
pub use reducer::*;
pub use splitter::*;

/// Parses the full output of one `am instrument -r` invocation into test case results.
///
/// The returned iterator is lazy. It holds no state beyond the input, so calling this twice on
/// the same text produces identical results.
pub fn parse_results(output: &str) -> ResultStream<'_> {
    ResultStream::new(StatusBlockSplitter::new(output))
}
