//! USB → TCP transport switch with rollback on failure

use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::adb::{ConnectAck, DeviceBridge};
use crate::config::{SwitchTimingConfig, TIMING_CONFIG};
use crate::endpoint::TcpEndpoint;
use crate::error::{AdbError, ErrorKind, Result};

/// Set by adbd to the port it listens on once in TCP mode
pub const TCP_PORT_PROPERTY: &str = "service.adb.tcp.port";

/// Where the device is in the switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    Usb,
    TcpEnabling,
    TcpEnabled,
    TcpConnecting,
    Connected,
    Failed,
}

/// Bounded waits applied while switching
#[derive(Debug, Clone, Copy)]
pub struct SwitchPolicy {
    pub confirm_timeout: Duration,
    pub connect_window: Duration,
    pub poll_interval: Duration,
}

impl SwitchPolicy {
    /// One property check and one connect attempt, no waiting
    pub fn immediate() -> Self {
        Self {
            confirm_timeout: Duration::ZERO,
            connect_window: Duration::ZERO,
            poll_interval: Duration::ZERO,
        }
    }
}

impl From<&SwitchTimingConfig> for SwitchPolicy {
    fn from(timing: &SwitchTimingConfig) -> Self {
        Self {
            confirm_timeout: timing.tcp_confirm_timeout(),
            connect_window: timing.connect_window(),
            poll_interval: timing.poll_interval(),
        }
    }
}

impl Default for SwitchPolicy {
    fn default() -> Self {
        Self::from(&TIMING_CONFIG.switch)
    }
}

/// Drives one device from USB to a confirmed TCP connection.
///
/// Enabling and connecting are separate steps: the device refusing to switch
/// and the network path being unreachable are different failures. Whenever a
/// step after a successful `tcpip` fails, the switcher puts adbd back into
/// USB mode before returning the error.
pub struct TransportSwitcher<'a, B: ?Sized> {
    bridge: &'a B,
    policy: SwitchPolicy,
    state: TransportState,
}

impl<'a, B> TransportSwitcher<'a, B>
where
    B: DeviceBridge + ?Sized,
{
    pub fn new(bridge: &'a B, policy: SwitchPolicy) -> Self {
        Self {
            bridge,
            policy,
            state: TransportState::Usb,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    fn transition(&mut self, next: TransportState) {
        debug!("Transport {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Enable TCP mode on the USB device `serial` and connect to `endpoint`
    pub async fn switch(&mut self, serial: &str, endpoint: &TcpEndpoint) -> Result<ConnectAck> {
        self.transition(TransportState::TcpEnabling);
        if let Err(e) = self.bridge.enable_tcp_transport(serial, endpoint.port).await {
            self.transition(TransportState::Failed);
            return Err(e);
        }

        if let Err(e) = self.confirm_tcp_mode(serial, endpoint.port).await {
            self.rollback(serial).await;
            self.transition(TransportState::Failed);
            return Err(e);
        }
        self.transition(TransportState::TcpEnabled);
        info!("TCP mode enabled on port {}", endpoint.port);

        match self.connect(endpoint).await {
            Ok(ack) => Ok(ack),
            Err(e) => {
                self.rollback(serial).await;
                Err(e)
            }
        }
    }

    /// Connect to a device that is already listening on `endpoint`; nothing to roll back
    pub async fn reconnect(&mut self, endpoint: &TcpEndpoint) -> Result<ConnectAck> {
        self.transition(TransportState::TcpEnabled);
        self.connect(endpoint).await
    }

    async fn connect(&mut self, endpoint: &TcpEndpoint) -> Result<ConnectAck> {
        self.transition(TransportState::TcpConnecting);
        let deadline = Instant::now() + self.policy.connect_window;

        loop {
            match self.bridge.connect_tcp(endpoint).await {
                Ok(ack) => {
                    self.transition(TransportState::Connected);
                    return Ok(ack);
                }
                Err(e) if is_transient(&e) && Instant::now() + self.policy.poll_interval < deadline => {
                    debug!("connect {} not ready yet: {}", endpoint, e);
                    tokio::time::sleep(self.policy.poll_interval).await;
                }
                Err(e) => {
                    self.transition(TransportState::Failed);
                    return Err(refused(e));
                }
            }
        }
    }

    /// Poll the device until adbd reports the requested TCP port
    async fn confirm_tcp_mode(&self, serial: &str, port: u16) -> Result<()> {
        let expected = port.to_string();
        let deadline = Instant::now() + self.policy.confirm_timeout;

        loop {
            match self.bridge.get_property(serial, TCP_PORT_PROPERTY).await {
                Ok(value) if value == expected => return Ok(()),
                Ok(value) => debug!("{} is '{}', waiting for {}", TCP_PORT_PROPERTY, value, expected),
                Err(e) if e.kind() == ErrorKind::BridgeUnavailable => return Err(e),
                // adbd drops off USB while it restarts
                Err(e) => debug!("property check failed while adbd restarts: {}", e),
            }

            if Instant::now() >= deadline {
                return Err(AdbError::Timeout(format!(
                    "device {} did not report TCP mode on port {} within {:.1}s",
                    serial,
                    port,
                    self.policy.confirm_timeout.as_secs_f64()
                )));
            }
            tokio::time::sleep(self.policy.poll_interval).await;
        }
    }

    /// Best effort: a failure here is logged, the original error is what gets reported
    async fn rollback(&self, serial: &str) {
        warn!("Rolling back TCP mode on {}", serial);
        if let Err(e) = self.bridge.disable_tcp_transport(serial).await {
            warn!("Rollback to USB mode failed on {}: {}", serial, e);
        }
    }
}

fn is_transient(e: &AdbError) -> bool {
    matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::Timeout)
}

/// A connect that never got an answer counts as refused once the window is over
fn refused(e: AdbError) -> AdbError {
    match e {
        AdbError::Timeout(detail) => AdbError::ConnectionRefused(detail),
        other => other,
    }
}
