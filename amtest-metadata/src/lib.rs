// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable output for [amtest](https://crates.io/crates/amtest), a runner for Android
//! `am instrument` tests.
//!
//! The types in this crate are stable across amtest releases. They're the serialized form of
//! amtest's results, as produced by `amtest parse --message-format json` and by the summary at
//! the end of `amtest run`.

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
