// Copyright (c) The amtest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::Transport;
use crate::errors::{DeviceAddressParseError, TransportError};
use camino::Utf8Path;
use std::{
    fmt,
    io::{Read, Write},
    net::TcpStream,
    str::FromStr,
};
use tracing::{debug, warn};

/// The prompt a SUT agent prints when it's ready for the next command.
const PROMPT: &[u8] = b"$>\0";

/// Responses starting with this are errors.
const AGENT_WARNING: &str = "##AGENT-WARNING##";

/// The address of a SUT agent.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceAddress {
    /// The host name or IP address.
    pub host: String,

    /// The TCP port.
    pub port: u16,
}

impl DeviceAddress {
    /// The port SUT agents listen on by default.
    pub const DEFAULT_PORT: u16 = 20701;
}

impl FromStr for DeviceAddress {
    type Err = DeviceAddressParseError;

    /// Parses `host` or `host:port`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse()
                    .map_err(|_| DeviceAddressParseError::new(s, "port is not a number"))?;
                (host, port)
            }
            None => (s, Self::DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(DeviceAddressParseError::new(s, "host is empty"));
        }
        Ok(Self {
            host: host.to_owned(),
            port,
        })
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A device running a SUT agent, reached over TCP.
///
/// Each operation opens its own connection, waits for the agent's prompt, sends one command
/// and reads the response up to the next prompt.
#[derive(Clone, Debug)]
pub struct SutTransport {
    address: DeviceAddress,
    device_root: String,
}

impl SutTransport {
    /// Creates a new transport. Packages are staged under `device_root` while installing.
    pub fn new(address: DeviceAddress, device_root: impl Into<String>) -> Self {
        Self {
            address,
            device_root: device_root.into(),
        }
    }

    /// Returns the remote path a package is staged at before installation.
    pub fn staging_path(&self, package: &Utf8Path) -> String {
        let file_name = package.file_name().unwrap_or(package.as_str());
        format!("{}/{}", self.device_root.trim_end_matches('/'), file_name)
    }

    fn send_command(
        &self,
        command: &str,
        payload: Option<&[u8]>,
    ) -> Result<String, TransportError> {
        let addr = self.address.to_string();
        debug!(%addr, %command, "sending SUT command");

        let mut stream = TcpStream::connect((self.address.host.as_str(), self.address.port))
            .map_err(|err| TransportError::Connect {
                addr: addr.clone(),
                err,
            })?;
        let io_err = |err: std::io::Error| TransportError::Io {
            addr: addr.clone(),
            err,
        };

        read_until_prompt(&mut stream).map_err(io_err)?;
        stream.write_all(command.as_bytes()).map_err(io_err)?;
        stream.write_all(b"\r\n").map_err(io_err)?;
        if let Some(payload) = payload {
            stream.write_all(payload).map_err(io_err)?;
        }
        stream.flush().map_err(io_err)?;

        let response = read_until_prompt(&mut stream).map_err(io_err)?;
        let response = String::from_utf8_lossy(&response).into_owned();
        if let Some(message) = response.trim_start().strip_prefix(AGENT_WARNING) {
            return Err(TransportError::Agent {
                addr,
                command: command.to_owned(),
                message: message.trim().to_owned(),
            });
        }
        Ok(response)
    }
}

/// Reads until the agent's prompt, returning everything before it.
fn read_until_prompt(stream: &mut impl Read) -> std::io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        if buf.ends_with(PROMPT) {
            buf.truncate(buf.len() - PROMPT.len());
            return Ok(buf);
        }
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed before the agent's prompt",
            ));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

impl Transport for SutTransport {
    fn execute(&self, command: &[String]) -> Result<String, TransportError> {
        self.send_command(&format!("exec {}", shell_words::join(command)), None)
    }

    fn push(&self, local: &Utf8Path, remote: &str) -> Result<(), TransportError> {
        let contents = std::fs::read(local).map_err(|err| TransportError::ReadLocal {
            path: local.to_owned(),
            err,
        })?;
        self.send_command(
            &format!("push {remote} {}", contents.len()),
            Some(&contents),
        )
        .map(drop)
    }

    fn remove(&self, remote: &str) -> Result<(), TransportError> {
        self.send_command(&format!("rm {remote}"), None).map(drop)
    }

    fn install(&self, package: &Utf8Path) -> Result<(), TransportError> {
        let remote = self.staging_path(package);

        debug!(%remote, "removing stale staged package");
        if let Err(err) = self.remove(&remote) {
            debug!(%remote, "no stale package removed: {err}");
        }

        let result = self.push(package, &remote).and_then(|()| {
            let output = self.send_command(&format!("inst {remote}"), None)?;
            if output.contains("Failure") {
                return Err(TransportError::Agent {
                    addr: self.address.to_string(),
                    command: format!("inst {remote}"),
                    message: output.trim().to_owned(),
                });
            }
            Ok(())
        });

        if let Err(err) = self.remove(&remote) {
            warn!(%remote, "failed to clean up staged package: {err}");
        }
        result
    }

    fn describe(&self) -> String {
        format!("SUT agent at {}", self.address)
    }
}
