//! Scripted in-memory bridge for unit tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Mutex;

use crate::adb::{ConnectAck, Device, DeviceBridge, DeviceState};
use crate::endpoint::{NetworkCandidate, TcpEndpoint};
use crate::error::{AdbError, Result};
use crate::transport::TCP_PORT_PROPERTY;

/// Behaves like one adb server with a handful of phones behind it.
/// Every call is appended to `calls` as `"<operation> <args>"`.
#[derive(Default)]
pub struct FakeBridge {
    pub devices: Mutex<Vec<Device>>,
    pub properties: Mutex<HashMap<String, String>>,
    pub interfaces: Vec<NetworkCandidate>,
    pub routes: Vec<NetworkCandidate>,
    pub bridge_down: bool,
    pub interfaces_fail: bool,
    /// The adb server goes away once the device is selected
    pub discovery_bridge_down: bool,
    pub enable_fails: bool,
    /// adbd never reports the TCP port after `tcpip`
    pub tcp_mode_never_confirms: bool,
    /// Number of `connect` attempts refused before one succeeds
    pub connect_refusals: Mutex<usize>,
    /// Every `connect` attempt times out
    pub connect_times_out: bool,
    /// `reverse --no-rebind` is refused but `reverse --list` does not show the binding
    pub reverse_binding_unknown: bool,
    pub reverse: Mutex<Vec<(String, u16, u16)>>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_device(self, serial: &str, state: DeviceState) -> Self {
        self.devices.lock().unwrap().push(Device::new(serial, state));
        self
    }

    pub fn with_property(self, key: &str, value: &str) -> Self {
        self.properties
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_interface(mut self, interface: &str, ip: [u8; 4]) -> Self {
        self.interfaces.push(NetworkCandidate::new(
            interface,
            Ipv4Addr::from(ip),
        ));
        self
    }

    pub fn with_route(mut self, interface: &str, ip: [u8; 4]) -> Self {
        self.routes
            .push(NetworkCandidate::new(interface, Ipv4Addr::from(ip)));
        self
    }

    pub fn with_reverse(self, serial: &str, remote: u16, local: u16) -> Self {
        self.reverse
            .lock()
            .unwrap()
            .push((serial.to_string(), remote, local));
        self
    }

    pub fn refusing_connections(self, count: usize) -> Self {
        *self.connect_refusals.lock().unwrap() = count;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, operation: &str) -> bool {
        self.calls().iter().any(|c| c.starts_with(operation))
    }

    pub fn position(&self, operation: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(operation))
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DeviceBridge for FakeBridge {
    async fn list_devices(&self) -> Result<Vec<Device>> {
        self.record("list_devices".to_string());
        if self.bridge_down {
            return Err(AdbError::BridgeUnavailable(
                "cannot connect to daemon".to_string(),
            ));
        }
        Ok(self.devices.lock().unwrap().clone())
    }

    async fn get_property(&self, serial: &str, key: &str) -> Result<String> {
        self.record(format!("get_property {} {}", serial, key));
        Ok(self
            .properties
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn interface_addresses(&self, serial: &str) -> Result<Vec<NetworkCandidate>> {
        self.record(format!("interface_addresses {}", serial));
        if self.discovery_bridge_down {
            return Err(AdbError::BridgeUnavailable(
                "cannot connect to daemon".to_string(),
            ));
        }
        if self.interfaces_fail {
            return Err(AdbError::Timeout("ip addr show".to_string()));
        }
        Ok(self.interfaces.clone())
    }

    async fn route_sources(&self, serial: &str) -> Result<Vec<NetworkCandidate>> {
        self.record(format!("route_sources {}", serial));
        Ok(self.routes.clone())
    }

    async fn enable_tcp_transport(&self, serial: &str, port: u16) -> Result<()> {
        self.record(format!("enable_tcp_transport {} {}", serial, port));
        if self.enable_fails {
            return Err(AdbError::TransportError(
                "error: closed".to_string(),
            ));
        }
        if !self.tcp_mode_never_confirms {
            self.properties
                .lock()
                .unwrap()
                .insert(TCP_PORT_PROPERTY.to_string(), port.to_string());
        }
        Ok(())
    }

    async fn disable_tcp_transport(&self, serial: &str) -> Result<()> {
        self.record(format!("disable_tcp_transport {}", serial));
        self.properties.lock().unwrap().remove(TCP_PORT_PROPERTY);
        Ok(())
    }

    async fn connect_tcp(&self, endpoint: &TcpEndpoint) -> Result<ConnectAck> {
        self.record(format!("connect_tcp {}", endpoint));
        if self.connect_times_out {
            return Err(AdbError::Timeout(format!(
                "failed to connect to '{}': Connection timed out",
                endpoint
            )));
        }

        {
            let mut refusals = self.connect_refusals.lock().unwrap();
            if *refusals > 0 {
                *refusals -= 1;
                return Err(AdbError::ConnectionRefused(format!(
                    "failed to connect to '{}': Connection refused",
                    endpoint
                )));
            }
        }

        let serial = endpoint.serial();
        let mut devices = self.devices.lock().unwrap();
        if devices.iter().any(|d| d.serial == serial) {
            return Ok(ConnectAck::AlreadyConnected);
        }
        devices.push(Device::new(serial, DeviceState::Device));
        Ok(ConnectAck::Connected)
    }

    async fn add_reverse_forward(&self, serial: &str, remote: u16, local: u16) -> Result<()> {
        self.record(format!("add_reverse_forward {} {} {}", serial, remote, local));
        if self.reverse_binding_unknown {
            return Err(AdbError::ForwardConflict {
                remote,
                existing_local: None,
            });
        }
        let mut reverse = self.reverse.lock().unwrap();
        if let Some((_, _, existing)) = reverse
            .iter()
            .find(|(s, r, _)| s == serial && *r == remote)
        {
            return Err(AdbError::ForwardConflict {
                remote,
                existing_local: Some(*existing),
            });
        }
        reverse.push((serial.to_string(), remote, local));
        Ok(())
    }

    async fn capture_screen(&self, serial: Option<&str>) -> Result<Vec<u8>> {
        self.record(format!("capture_screen {:?}", serial));
        Err(AdbError::NoDeviceConnected)
    }
}
