// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::StderrStyles;
use amtest_metadata::AmtestExitCode;
use amtest_runner::errors::*;
use camino::Utf8PathBuf;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::error;

// The #[error()] strings are placeholders: errors are printed with display_to_stderr, which
// colorizes them.

/// An expected error that ends an amtest invocation.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("manifest resolution error")]
    ManifestResolutionError {
        #[from]
        err: ManifestResolutionError,
    },
    #[error("package install error")]
    InstallError {
        #[from]
        err: InstallError,
    },
    #[error("failed to read transcript")]
    TranscriptReadError {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("error writing event")]
    WriteEventError {
        #[from]
        err: WriteEventError,
    },
    #[error("test run failed")]
    TestRunFailed,
}

impl ExpectedError {
    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::ConfigParseError { .. } | Self::TranscriptReadError { .. } => {
                AmtestExitCode::SETUP_ERROR
            }
            Self::ManifestResolutionError { .. } => AmtestExitCode::MANIFEST_RESOLUTION_FAILED,
            Self::InstallError {
                err: InstallError::WriteEvent(_),
            } => AmtestExitCode::WRITE_OUTPUT_ERROR,
            Self::InstallError { .. } => AmtestExitCode::DEVICE_SETUP_FAILED,
            Self::WriteEventError { .. } => AmtestExitCode::WRITE_OUTPUT_ERROR,
            Self::TestRunFailed => AmtestExitCode::TEST_RUN_FAILED,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        error!("{}", self.render(styles));
    }

    /// Renders a headline followed by one `caused by:` line per source error.
    fn render(&self, styles: &StderrStyles) -> String {
        let (mut message, mut next_error) = match self {
            Self::ConfigParseError { err } => (err.to_string(), err.source()),
            Self::ManifestResolutionError { err } => (err.to_string(), err.source()),
            Self::InstallError {
                err: InstallError::Transport { package, err },
            } => (
                format!(
                    "failed to install `{}` on the device",
                    package.style(styles.bold)
                ),
                Some(err as &dyn Error),
            ),
            Self::InstallError { err } => (err.to_string(), err.source()),
            Self::TranscriptReadError { path, err } => (
                format!("failed to read transcript at `{}`", path.style(styles.bold)),
                Some(err as &dyn Error),
            ),
            Self::WriteEventError { err } => (
                "failed to write event to output".to_owned(),
                Some(err as &dyn Error),
            ),
            Self::TestRunFailed => ("test run failed".to_owned(), None),
        };

        while let Some(err) = next_error {
            message.push_str(&format!("\n  caused by: {err}"));
            next_error = err.source();
        }
        message
    }
}
