// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs Android instrumentation tests on a device and reports their results.
//!
//! `amtest run` resolves a manifest, installs packages and runs each test with
//! `am instrument -r`. `amtest parse` reduces a captured transcript offline.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputContext;
