// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod fixtures;
mod parse;
mod runner;
