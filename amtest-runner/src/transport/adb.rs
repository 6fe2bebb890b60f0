// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Transport;
use crate::errors::TransportError;
use camino::{Utf8Path, Utf8PathBuf};
use duct::cmd;
use tracing::debug;

/// A device attached to this machine, driven through the `adb` binary.
#[derive(Clone, Debug)]
pub struct AdbTransport {
    adb: Utf8PathBuf,
    serial: Option<String>,
}

impl AdbTransport {
    /// Creates a new transport using the given `adb` binary, optionally targeting one device by
    /// serial.
    pub fn new(adb: impl Into<Utf8PathBuf>, serial: Option<String>) -> Self {
        Self {
            adb: adb.into(),
            serial,
        }
    }

    /// Returns the full argument list for an `adb` invocation.
    pub fn adb_args<'a>(&'a self, args: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        let mut full = Vec::new();
        if let Some(serial) = &self.serial {
            full.extend(["-s", serial.as_str()]);
        }
        full.extend(args);
        full
    }

    /// Joins a device-side command into a single string for `adb shell`.
    pub fn shell_command(command: &[String]) -> String {
        shell_words::join(command)
    }

    // Older versions of adb exit successfully even when installation fails.
    fn check_install_output(
        &self,
        package: &Utf8Path,
        output: String,
    ) -> Result<(), TransportError> {
        if output.contains("Failure") {
            return Err(TransportError::CommandFailed {
                command: format!("{} install -r {package}", self.adb),
                status: "a reported failure".to_owned(),
                output,
            });
        }
        Ok(())
    }

    fn run_adb<'a>(
        &'a self,
        args: impl IntoIterator<Item = &'a str>,
    ) -> Result<String, TransportError> {
        let args = self.adb_args(args);
        let command = format!("{} {}", self.adb, shell_words::join(&args));
        debug!(%command, "running adb");

        let output = cmd(self.adb.as_std_path(), args)
            .stderr_to_stdout()
            .stdout_capture()
            .unchecked()
            .run()
            .map_err(|err| TransportError::Spawn {
                command: command.clone(),
                err,
            })?;
        let text = String::from_utf8_lossy(&output.stdout).into_owned();

        if output.status.success() {
            Ok(text)
        } else {
            Err(TransportError::CommandFailed {
                command,
                status: output.status.to_string(),
                output: text,
            })
        }
    }
}

impl Transport for AdbTransport {
    fn execute(&self, command: &[String]) -> Result<String, TransportError> {
        let shell = Self::shell_command(command);
        self.run_adb(["shell", shell.as_str()])
    }

    fn push(&self, local: &Utf8Path, remote: &str) -> Result<(), TransportError> {
        self.run_adb(["push", local.as_str(), remote]).map(drop)
    }

    fn remove(&self, remote: &str) -> Result<(), TransportError> {
        let shell = Self::shell_command(&["rm".to_owned(), "-f".to_owned(), remote.to_owned()]);
        self.run_adb(["shell", shell.as_str()]).map(drop)
    }

    fn install(&self, package: &Utf8Path) -> Result<(), TransportError> {
        let output = self.run_adb(["install", "-r", package.as_str()])?;
        self.check_install_output(package, output)
    }

    fn describe(&self) -> String {
        match &self.serial {
            Some(serial) => format!("adb device {serial}"),
            None => "adb device".to_owned(),
        }
    }
}
