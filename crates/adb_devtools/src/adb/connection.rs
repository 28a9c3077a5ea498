//! ADB connection management: the process-backed device bridge

use async_trait::async_trait;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::bridge::{ConnectAck, DeviceBridge};
use super::device::{parse_devices, Device};
use super::network::{parse_interface_addresses, parse_route_sources};
use crate::config::{BridgeTimingConfig, TIMING_CONFIG};
use crate::endpoint::{NetworkCandidate, TcpEndpoint};
use crate::error::{AdbError, Result};

/// Talks to the adb server by running the `adb` executable
#[derive(Debug, Clone)]
pub struct AdbConnection {
    adb_path: PathBuf,
    timing: BridgeTimingConfig,
}

impl AdbConnection {
    /// Create a connection that runs `adb` from `PATH`
    pub fn new() -> Self {
        Self::with_path("adb")
    }

    /// Create a connection with a custom adb executable
    pub fn with_path(adb_path: impl Into<PathBuf>) -> Self {
        Self {
            adb_path: adb_path.into(),
            timing: TIMING_CONFIG.bridge.clone(),
        }
    }

    /// Resolve `adb` on `PATH`, failing early when platform-tools are missing
    pub fn locate() -> Result<Self> {
        let path = which::which("adb").map_err(|_| {
            AdbError::BridgeUnavailable(
                "adb not found. Install Android SDK platform-tools".to_string(),
            )
        })?;
        Ok(Self::with_path(path))
    }

    async fn run(&self, serial: Option<&str>, args: &[&str], timeout: f64) -> Result<Output> {
        let mut cmd = Command::new(&self.adb_path);
        if let Some(serial) = serial {
            cmd.arg("-s").arg(serial);
        }
        cmd.args(args).kill_on_drop(true);

        debug!("adb {:?} {}", serial, args.join(" "));

        let output = tokio::time::timeout(Duration::from_secs_f64(timeout), cmd.output())
            .await
            .map_err(|_| {
                AdbError::Timeout(format!("adb {} after {}s", args.join(" "), timeout))
            })?
            .map_err(|e| match e.kind() {
                IoErrorKind::NotFound | IoErrorKind::PermissionDenied => AdbError::BridgeUnavailable(
                    format!("cannot run {}: {}", self.adb_path.display(), e),
                ),
                _ => AdbError::Io(e),
            })?;

        Ok(output)
    }

    async fn shell(&self, serial: &str, args: &[&str]) -> Result<String> {
        let mut full = vec!["shell"];
        full.extend_from_slice(args);

        let output = self
            .run(Some(serial), &full, self.timing.command_timeout)
            .await?;
        if !output.status.success() {
            return Err(AdbError::DeviceUnreachable(format!(
                "{}: {}",
                serial,
                combined_output(&output)
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Current reverse forwards on the device, as (device port, host port)
    pub async fn list_reverse_forwards(&self, serial: &str) -> Result<Vec<(u16, u16)>> {
        let output = self
            .run(Some(serial), &["reverse", "--list"], self.timing.command_timeout)
            .await?;
        if !output.status.success() {
            return Err(AdbError::DeviceUnreachable(combined_output(&output)));
        }

        Ok(parse_reverse_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

impl Default for AdbConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceBridge for AdbConnection {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        let output = self
            .run(None, &["devices", "-l"], self.timing.command_timeout)
            .await?;

        let combined = combined_output(&output);
        if !output.status.success() || combined.contains("cannot connect to daemon") {
            return Err(AdbError::BridgeUnavailable(combined));
        }

        Ok(parse_devices(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn get_property(&self, serial: &str, key: &str) -> Result<String> {
        let value = self.shell(serial, &["getprop", key]).await?;
        Ok(value.trim().to_string())
    }

    async fn interface_addresses(&self, serial: &str) -> Result<Vec<NetworkCandidate>> {
        let output = self.shell(serial, &["ip", "addr", "show"]).await?;
        Ok(parse_interface_addresses(&output))
    }

    async fn route_sources(&self, serial: &str) -> Result<Vec<NetworkCandidate>> {
        let output = self.shell(serial, &["ip", "route"]).await?;
        Ok(parse_route_sources(&output))
    }

    async fn enable_tcp_transport(&self, serial: &str, port: u16) -> Result<()> {
        let port = port.to_string();
        let output = self
            .run(Some(serial), &["tcpip", &port], self.timing.tcpip_timeout)
            .await?;

        let combined = combined_output(&output);
        if !output.status.success() || combined.to_lowercase().contains("error") {
            return Err(AdbError::TransportError(combined));
        }

        debug!("tcpip {}: {}", port, combined);
        Ok(())
    }

    async fn disable_tcp_transport(&self, serial: &str) -> Result<()> {
        let output = self
            .run(Some(serial), &["usb"], self.timing.command_timeout)
            .await?;

        let combined = combined_output(&output);
        if !output.status.success() || combined.to_lowercase().contains("error") {
            return Err(AdbError::TransportError(combined));
        }
        Ok(())
    }

    async fn connect_tcp(&self, endpoint: &TcpEndpoint) -> Result<ConnectAck> {
        let target = endpoint.to_string();
        let output = self
            .run(None, &["connect", &target], self.timing.connect_timeout)
            .await?;

        parse_connect_output(&combined_output(&output))
    }

    async fn add_reverse_forward(&self, serial: &str, remote: u16, local: u16) -> Result<()> {
        let remote_spec = format!("tcp:{}", remote);
        let local_spec = format!("tcp:{}", local);
        let output = self
            .run(
                Some(serial),
                &["reverse", "--no-rebind", &remote_spec, &local_spec],
                self.timing.command_timeout,
            )
            .await?;

        if output.status.success() {
            return Ok(());
        }

        let combined = combined_output(&output);
        if !combined.contains("rebind") {
            return Err(AdbError::DeviceUnreachable(combined));
        }

        let existing_local = self
            .list_reverse_forwards(serial)
            .await?
            .into_iter()
            .find(|(device_port, _)| *device_port == remote)
            .map(|(_, host_port)| host_port);

        Err(AdbError::ForwardConflict {
            remote,
            existing_local,
        })
    }

    async fn capture_screen(&self, serial: Option<&str>) -> Result<Vec<u8>> {
        let output = self
            .run(
                serial,
                &["exec-out", "screencap", "-p"],
                self.timing.screencap_timeout,
            )
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if stderr.contains("no devices") || stderr.contains("no emulators") {
                return Err(AdbError::NoDeviceConnected);
            }
            return Err(AdbError::Capture(format!("adb screencap failed: {}", stderr)));
        }

        if output.stdout.is_empty() {
            return Err(AdbError::Capture("adb screencap returned no data".to_string()));
        }

        debug!("Screenshot size: {} bytes", output.stdout.len());
        Ok(output.stdout)
    }
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{}{}", stdout, stderr).trim().to_string()
}

/// Interpret the text printed by `adb connect`, which exits 0 even on failure
pub fn parse_connect_output(output: &str) -> Result<ConnectAck> {
    let lower = output.to_lowercase();
    if lower.contains("already connected") {
        Ok(ConnectAck::AlreadyConnected)
    } else if lower.contains("connected to") {
        Ok(ConnectAck::Connected)
    } else if lower.contains("timed out") || lower.contains("timeout") {
        Err(AdbError::Timeout(output.to_string()))
    } else {
        Err(AdbError::ConnectionRefused(output.to_string()))
    }
}

/// Parse `adb reverse --list` lines such as `UsbFfs tcp:8080 tcp:8080`
pub fn parse_reverse_list(output: &str) -> Vec<(u16, u16)> {
    output
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            let device_port = parts[1].strip_prefix("tcp:")?.parse().ok()?;
            let host_port = parts[2].strip_prefix("tcp:")?.parse().ok()?;
            Some((device_port, host_port))
        })
        .collect()
}
