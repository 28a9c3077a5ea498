//! ADB (Android Debug Bridge) module
//!
//! This module provides:
//! - `bridge`: the `DeviceBridge` contract the workflow is written against
//! - `connection`: `AdbConnection`, the implementation that runs the `adb` executable
//! - `device`: device listing model and `adb devices -l` parsing
//! - `network`: parsing of the device's `ip addr` / `ip route` output

mod bridge;
mod connection;
mod device;
mod network;

pub use bridge::{ConnectAck, DeviceBridge};
pub use connection::{parse_connect_output, parse_reverse_list, AdbConnection};
pub use device::{parse_devices, Device, DeviceState, TransportKind};
pub use network::{parse_interface_addresses, parse_route_sources};
