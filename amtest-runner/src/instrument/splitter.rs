// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::{iter::FusedIterator, str::SplitInclusive};

/// Marks the last line of a per-test status block.
pub(crate) const STATUS_CODE_MARKER: &str = "INSTRUMENTATION_STATUS_CODE:";

/// Marks the last line of the finished bundle.
pub(crate) const CODE_MARKER: &str = "INSTRUMENTATION_CODE:";

/// One contiguous span of `am instrument` output, as cut by [`StatusBlockSplitter`].
///
/// Blocks borrow from the input and include their line terminators.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RawBlock<'a> {
    /// A per-test status block, ending in an `INSTRUMENTATION_STATUS_CODE:` line.
    Status(&'a str),

    /// The finished bundle, ending in an `INSTRUMENTATION_CODE:` line.
    Finished(&'a str),

    /// Text after the last block that was never terminated by either marker.
    ///
    /// This is what a stream cut off mid-block looks like.
    Unterminated(&'a str),
}

/// Splits raw `am instrument` output into [`RawBlock`]s.
///
/// Lines accumulate until one contains `INSTRUMENTATION_STATUS_CODE:` (a status block) or
/// `INSTRUMENTATION_CODE:` (the finished bundle). A stream that never produces a finished bundle
/// is not an error: that's the signature of a device-side crash, and is handled by the
/// [`ResultStream`](super::ResultStream).
#[derive(Clone, Debug)]
pub struct StatusBlockSplitter<'a> {
    input: &'a str,
    lines: SplitInclusive<'a, char>,
    block_start: usize,
    pos: usize,
}

impl<'a> StatusBlockSplitter<'a> {
    /// Creates a new splitter over the given output.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            lines: input.split_inclusive('\n'),
            block_start: 0,
            pos: 0,
        }
    }

    fn take_block(&mut self) -> &'a str {
        let block = &self.input[self.block_start..self.pos];
        self.block_start = self.pos;
        block
    }
}

impl<'a> Iterator for StatusBlockSplitter<'a> {
    type Item = RawBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            self.pos += line.len();
            if line.contains(STATUS_CODE_MARKER) {
                return Some(RawBlock::Status(self.take_block()));
            }
            if line.contains(CODE_MARKER) {
                return Some(RawBlock::Finished(self.take_block()));
            }
        }

        if self.block_start < self.pos {
            let rest = self.take_block();
            if !rest.trim().is_empty() {
                return Some(RawBlock::Unterminated(rest));
            }
        }
        None
    }
}

impl FusedIterator for StatusBlockSplitter<'_> {}
