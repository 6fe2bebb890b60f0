// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for amtest, a runner for Android instrumentation tests.
//!
//! The flow of a run is:
//!
//! 1. A [`ManifestResolver`](manifest::ManifestResolver) produces test descriptors.
//! 2. Packages are installed through a [`Transport`](transport::Transport).
//! 3. An [`InstrumentationRunner`](runner::InstrumentationRunner) runs each test with
//!    `am instrument -r`, parses the output with [`instrument::parse_results`], and writes events
//!    to a [`StructuredLog`](reporter::StructuredLog).

pub mod config;
pub mod errors;
pub mod instrument;
pub mod manifest;
pub mod reporter;
pub mod runner;
mod stopwatch;
pub mod transport;
