// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by amtest.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error, fmt};
use thiserror::Error;

/// A status block ended in an `INSTRUMENTATION_STATUS_CODE:` line that couldn't be understood.
///
/// This never aborts a run: the reducer records it as a degraded `ERROR` result.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
#[error("malformed instrumentation status block: {reason}")]
pub struct MalformedStatusBlock {
    reason: String,
    block: String,
}

impl MalformedStatusBlock {
    pub(crate) fn new(reason: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            block: block.into(),
        }
    }

    /// Returns the raw text of the block.
    pub fn block(&self) -> &str {
        &self.block
    }
}

/// An error that occurred while talking to a device.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// A host-side command (e.g. `adb`) could not be spawned.
    #[error("failed to execute `{command}`")]
    Spawn {
        /// The command line that was run.
        command: String,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// A host-side command exited with a non-zero status.
    #[error("`{command}` failed with {status}:\n{output}")]
    CommandFailed {
        /// The command line that was run.
        command: String,

        /// A description of the exit status.
        status: String,

        /// The combined output of the command.
        output: String,
    },

    /// Connecting to a SUT agent failed.
    #[error("failed to connect to SUT agent at {addr}")]
    Connect {
        /// The address that was connected to.
        addr: String,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// Reading from or writing to a SUT agent connection failed.
    #[error("error communicating with SUT agent at {addr}")]
    Io {
        /// The address of the agent.
        addr: String,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The SUT agent reported an error for a command.
    #[error("SUT agent at {addr} rejected `{command}`: {message}")]
    Agent {
        /// The address of the agent.
        addr: String,

        /// The command that was sent.
        command: String,

        /// The message returned by the agent.
        message: String,
    },

    /// A local file to be pushed to the device couldn't be read.
    #[error("failed to read `{path}`")]
    ReadLocal {
        /// The local path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },
}

/// An error that occurred while installing packages before the run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstallError {
    /// The device rejected a package.
    #[error("failed to install `{package}`")]
    Transport {
        /// The package that failed to install.
        package: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: TransportError,
    },

    /// Reporting progress to the structured log failed.
    #[error("failed to report package installation")]
    WriteEvent(#[from] WriteEventError),
}

impl InstallError {
    pub(crate) fn transport(package: impl Into<Utf8PathBuf>, err: TransportError) -> Self {
        Self::Transport {
            package: package.into(),
            err,
        }
    }
}

/// An error that occurred while resolving the list of tests to run.
///
/// This is fatal: without a manifest there's nothing to run.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ManifestResolutionError {
    /// The manifest file could not be read.
    #[error("failed to read test manifest `{path}`")]
    Read {
        /// The manifest path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: std::io::Error,
    },

    /// The manifest file could not be parsed.
    #[error("failed to parse test manifest `{path}`")]
    Parse {
        /// The manifest path.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: toml::de::Error,
    },

    /// Two tests in the manifest share the same path.
    #[error("test path `{path}` appears more than once in the manifest")]
    DuplicatePath {
        /// The duplicated path.
        path: String,
    },
}

/// An error that occurred while parsing the amtest config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseError {
    /// The config sources could not be read or deserialized.
    #[error("failed to parse amtest config at `{config_file}`")]
    Config {
        /// The user config file consulted, if any.
        config_file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: ConfigError,
    },

    /// The SUT transport was selected without a host to connect to.
    #[error("the `sut` transport requires `device.host` to be set")]
    MissingSutHost,
}

/// An error parsing a `host[:port]` device address.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("invalid device address `{input}`: {reason}")]
pub struct DeviceAddressParseError {
    input: String,
    reason: &'static str,
}

impl DeviceAddressParseError {
    pub(crate) fn new(input: impl Into<String>, reason: &'static str) -> Self {
        Self {
            input: input.into(),
            reason,
        }
    }
}

/// An error that occurs while writing an event to a structured log.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteEventError {
    /// An error occurred while writing the event to the provided output.
    #[error("error writing to output")]
    Io(#[from] std::io::Error),

    /// An error occurred while serializing the event.
    #[error("error serializing event to JSON")]
    Json(#[from] serde_json::Error),
}

/// Displays an error along with the chain of errors that caused it.
pub struct DisplayErrorChain<E>(E);

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new instance.
    pub fn new(err: E) -> Self {
        Self(err)
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        let mut source = self.0.source();
        while let Some(err) = source {
            write!(f, "\n  caused by: {err}")?;
            source = err.source();
        }
        Ok(())
    }
}
