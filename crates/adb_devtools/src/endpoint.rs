//! Network addresses handed between discovery, the transport switch and forwarding

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use crate::error::{AdbError, Result};

/// An address reported by the device, not yet accepted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkCandidate {
    pub interface: String,
    pub address: Ipv4Addr,
}

impl NetworkCandidate {
    pub fn new(interface: impl Into<String>, address: Ipv4Addr) -> Self {
        Self {
            interface: interface.into(),
            address,
        }
    }

    /// Whether another host on the LAN could reach the device on this address
    pub fn is_routable(&self) -> bool {
        let ip = self.address;
        !(ip.is_loopback() || ip.is_link_local() || ip.is_unspecified() || ip.is_broadcast())
    }
}

/// Where adbd listens in TCP mode. Its `Display` form is also the adb serial
/// of the device once connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TcpEndpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

impl TcpEndpoint {
    pub fn new(ip: Ipv4Addr, port: u16) -> Result<Self> {
        if port == 0 {
            return Err(AdbError::InvalidArgument(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        Ok(Self { ip, port })
    }

    pub fn serial(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TcpEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

impl FromStr for TcpEndpoint {
    type Err = AdbError;

    fn from_str(s: &str) -> Result<Self> {
        let (ip, port) = s
            .rsplit_once(':')
            .ok_or_else(|| AdbError::InvalidArgument(format!("'{}' is not ip:port", s)))?;
        let ip = ip
            .parse::<Ipv4Addr>()
            .map_err(|_| AdbError::InvalidArgument(format!("invalid IP address '{}'", ip)))?;
        let port = port
            .parse::<u16>()
            .map_err(|_| AdbError::InvalidArgument(format!("invalid port '{}'", port)))?;
        Self::new(ip, port)
    }
}
