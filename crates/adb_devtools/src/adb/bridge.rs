//! The device bridge contract every workflow component talks to

use async_trait::async_trait;

use super::device::Device;
use crate::endpoint::{NetworkCandidate, TcpEndpoint};
use crate::error::Result;

/// Acknowledgement of `adb connect`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAck {
    Connected,
    AlreadyConnected,
}

/// Commands issued to the adb server and the devices behind it.
///
/// Every call blocks the caller until the device answers or the call's own
/// timeout expires (`AdbError::Timeout`). Implementations never retry;
/// retrying is the caller's decision.
#[async_trait]
pub trait DeviceBridge: Send + Sync {
    /// All devices known to the adb server, in the order it reports them.
    /// Fails with `BridgeUnavailable` when adb or its daemon cannot be reached.
    async fn list_devices(&self) -> Result<Vec<Device>>;

    /// Read a system property. Fails with `DeviceUnreachable`.
    async fn get_property(&self, serial: &str, key: &str) -> Result<String>;

    /// IPv4 addresses per interface, in device order (`lo` included)
    async fn interface_addresses(&self, serial: &str) -> Result<Vec<NetworkCandidate>>;

    /// Source addresses of the device's routing table
    async fn route_sources(&self, serial: &str) -> Result<Vec<NetworkCandidate>>;

    /// Restart adbd listening on TCP `port`. Fails with `TransportError`.
    async fn enable_tcp_transport(&self, serial: &str, port: u16) -> Result<()>;

    /// Restart adbd in USB mode. Fails with `TransportError`.
    async fn disable_tcp_transport(&self, serial: &str) -> Result<()>;

    /// Connect the adb server to a device listening on `endpoint`.
    /// Fails with `ConnectionRefused` or `Timeout`.
    async fn connect_tcp(&self, endpoint: &TcpEndpoint) -> Result<ConnectAck>;

    /// Bind device port `remote` to host port `local` without rebinding.
    /// Fails with `ForwardConflict` carrying the existing binding of `remote`.
    async fn add_reverse_forward(&self, serial: &str, remote: u16, local: u16) -> Result<()>;

    /// Raw PNG bytes of the current screen
    async fn capture_screen(&self, serial: Option<&str>) -> Result<Vec<u8>>;
}
