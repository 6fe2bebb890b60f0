// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use amtest::AmtestApp;
use clap::Parser;
use color_eyre::Result;
use std::io::BufWriter;

fn main() -> Result<()> {
    color_eyre::install()?;
    let _ = enable_ansi_support::enable_ansi_support();

    let opts = AmtestApp::parse();
    let output = opts.init_output();

    let mut stdout = BufWriter::new(std::io::stdout().lock());
    match opts.exec(output, &mut stdout) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr(&output.stderr_styles());
            std::process::exit(error.process_exit_code())
        }
    }
}
