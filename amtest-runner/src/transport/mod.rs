// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ways to reach a device.
//!
//! amtest only needs a handful of operations from a device: run a command and capture its
//! output, and manage files and packages. [`Transport`] abstracts over those, with
//! [`AdbTransport`] for locally attached devices and [`SutTransport`] for devices running a SUT
//! agent on the network.

mod adb;
mod sut;

pub use adb::*;
pub use sut::*;

use crate::{
    errors::{InstallError, TransportError},
    manifest::TestDescriptor,
    reporter::StructuredLog,
};
use camino::Utf8Path;
use std::collections::BTreeSet;
use tracing::info;

/// A connection to a device.
///
/// All calls block until the device responds. No timeouts are imposed here.
pub trait Transport {
    /// Runs a command on the device and returns its combined output.
    fn execute(&self, command: &[String]) -> Result<String, TransportError>;

    /// Copies a local file to the device.
    fn push(&self, local: &Utf8Path, remote: &str) -> Result<(), TransportError>;

    /// Removes a file from the device.
    fn remove(&self, remote: &str) -> Result<(), TransportError>;

    /// Installs a local package on the device, replacing any existing version.
    fn install(&self, package: &Utf8Path) -> Result<(), TransportError>;

    /// Returns a short description of the device, for logs.
    fn describe(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, command: &[String]) -> Result<String, TransportError> {
        (**self).execute(command)
    }

    fn push(&self, local: &Utf8Path, remote: &str) -> Result<(), TransportError> {
        (**self).push(local, remote)
    }

    fn remove(&self, remote: &str) -> Result<(), TransportError> {
        (**self).remove(remote)
    }

    fn install(&self, package: &Utf8Path) -> Result<(), TransportError> {
        (**self).install(package)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, command: &[String]) -> Result<String, TransportError> {
        (**self).execute(command)
    }

    fn push(&self, local: &Utf8Path, remote: &str) -> Result<(), TransportError> {
        (**self).push(local, remote)
    }

    fn remove(&self, remote: &str) -> Result<(), TransportError> {
        (**self).remove(remote)
    }

    fn install(&self, package: &Utf8Path) -> Result<(), TransportError> {
        (**self).install(package)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Installs every distinct package named by `tests`, in sorted order.
///
/// Disabled tests don't contribute packages. Stops at the first failure, including a failure
/// to write to `log`.
pub fn install_packages(
    transport: &dyn Transport,
    tests: &[TestDescriptor],
    log: &mut dyn StructuredLog,
) -> Result<(), InstallError> {
    let packages: BTreeSet<&Utf8Path> = tests
        .iter()
        .filter(|test| !test.is_disabled())
        .filter_map(|test| test.apk.as_deref())
        .collect();

    for package in packages {
        info!(%package, device = transport.describe(), "installing package");
        log.info(&format!("Installing {package}."))?;
        transport
            .install(package)
            .map_err(|err| InstallError::transport(package, err))?;
    }
    Ok(())
}
