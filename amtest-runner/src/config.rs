// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for amtest.
//!
//! The config is layered: the embedded default config comes first, followed by
//! `.config/amtest.toml` (or a file passed in explicitly).

use crate::{
    errors::ConfigParseError,
    transport::{AdbTransport, DeviceAddress, SutTransport, Transport},
};
use camino::{Utf8Path, Utf8PathBuf};
use config::{Config, ConfigBuilder, File, FileFormat, builder::DefaultState};
use serde::Deserialize;

/// Overall configuration for amtest.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunnerConfig {
    /// How to reach the device.
    pub device: DeviceConfig,

    /// How to run instrumentation.
    pub run: RunConfig,

    /// How to report test events.
    pub output: OutputConfig,
}

/// The `[device]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DeviceConfig {
    /// The transport used to reach the device.
    pub transport: TransportKind,

    /// The adb binary.
    pub adb_path: Utf8PathBuf,

    /// The adb serial of the device, if any.
    #[serde(default)]
    pub serial: Option<String>,

    /// The SUT agent host.
    #[serde(default)]
    pub host: Option<String>,

    /// The SUT agent port.
    pub port: u16,

    /// The directory packages are staged in on the device.
    pub device_root: String,
}

/// The `[run]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RunConfig {
    /// The command used to start instrumentation, before per-test arguments.
    pub instrument_command: Vec<String>,
}

/// The `[output]` section.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct OutputConfig {
    /// The structured log format.
    pub format: LogFormat,
}

/// Which transport to use.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum TransportKind {
    /// Drive a locally attached device through `adb`.
    Adb,

    /// Talk to a SUT agent over TCP.
    Sut,
}

/// The format test events are written in.
#[derive(Copy, Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum LogFormat {
    /// Human-readable lines that mozharness can parse.
    Tbpl,

    /// One JSON object per line.
    Json,
}

impl RunnerConfig {
    /// The default location of the config within the working directory.
    pub const CONFIG_PATH: &'static str = ".config/amtest.toml";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../default-config.toml");

    /// Reads the config.
    ///
    /// If `file` is `None`, `.config/amtest.toml` under `root` is used if it exists.
    pub fn from_sources(
        root: &Utf8Path,
        file: Option<&Utf8Path>,
    ) -> Result<Self, ConfigParseError> {
        let (config_file, source) = match file {
            Some(file) => (file.to_owned(), File::new(file.as_str(), FileFormat::Toml)),
            None => {
                let config_file = root.join(Self::CONFIG_PATH);
                let source = File::new(config_file.as_str(), FileFormat::Toml).required(false);
                (config_file, source)
            }
        };

        Self::make_default_config()
            .add_source(source)
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|err| ConfigParseError::Config { config_file, err })
    }

    /// Returns the default config, with no user overrides.
    pub fn default_config() -> Self {
        Self::make_default_config()
            .build()
            .and_then(|config| config.try_deserialize())
            .expect("default config is always valid")
    }

    fn make_default_config() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
    }

    /// Points the config at a SUT agent, as given by a `host[:port]` address.
    pub fn set_device_address(&mut self, address: DeviceAddress) {
        self.device.transport = TransportKind::Sut;
        self.device.host = Some(address.host);
        self.device.port = address.port;
    }

    /// Creates the transport described by the `[device]` section.
    pub fn make_transport(&self) -> Result<Box<dyn Transport>, ConfigParseError> {
        let device = &self.device;
        match device.transport {
            TransportKind::Adb => Ok(Box::new(AdbTransport::new(
                device.adb_path.clone(),
                device.serial.clone(),
            ))),
            TransportKind::Sut => {
                let host = device
                    .host
                    .clone()
                    .ok_or(ConfigParseError::MissingSutHost)?;
                Ok(Box::new(SutTransport::new(
                    DeviceAddress {
                        host,
                        port: device.port,
                    },
                    device.device_root.clone(),
                )))
            }
        }
    }
}
