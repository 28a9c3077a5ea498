//! Devices as reported by `adb devices -l`

use std::fmt;

/// Connection state reported by the adb server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceState {
    Device,
    Unauthorized,
    Offline,
    NoPermissions,
    Other(String),
}

impl DeviceState {
    fn parse(word: &str) -> Self {
        match word {
            "device" => Self::Device,
            "unauthorized" => Self::Unauthorized,
            "offline" => Self::Offline,
            "no" | "no permissions" => Self::NoPermissions,
            other => Self::Other(other.to_string()),
        }
    }

    /// Only devices in this state accept commands
    pub fn is_online(&self) -> bool {
        matches!(self, Self::Device)
    }
}

impl fmt::Display for DeviceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Device => f.write_str("device"),
            Self::Unauthorized => f.write_str("unauthorized"),
            Self::Offline => f.write_str("offline"),
            Self::NoPermissions => f.write_str("no permissions"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

/// How the adb server reaches the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Usb,
    Tcp,
}

/// A device attached to the adb server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub serial: String,
    pub state: DeviceState,
    pub transport: TransportKind,
    pub model: Option<String>,
}

impl Device {
    pub fn new(serial: impl Into<String>, state: DeviceState) -> Self {
        let serial = serial.into();
        let transport = transport_for_serial(&serial);
        Self {
            serial,
            state,
            transport,
            model: None,
        }
    }

    pub fn is_online(&self) -> bool {
        self.state.is_online()
    }

    pub fn is_tcp(&self) -> bool {
        self.transport == TransportKind::Tcp
    }
}

/// Serials of TCP devices are `host:port` or an mDNS service name ending in
/// `._tcp`; emulators and USB devices never contain ':'
fn transport_for_serial(serial: &str) -> TransportKind {
    if serial.ends_with("._tcp") {
        return TransportKind::Tcp;
    }
    match serial.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
            TransportKind::Tcp
        }
        _ => TransportKind::Usb,
    }
}

/// Parse the output of `adb devices -l`
pub fn parse_devices(output: &str) -> Vec<Device> {
    let mut devices = Vec::new();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("List of devices") || line.starts_with('*') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 2 {
            continue;
        }

        // "no permissions (...)" spans several words
        let (state, rest) = if parts[1] == "no" && parts.get(2) == Some(&"permissions") {
            (DeviceState::NoPermissions, &parts[3..])
        } else {
            (DeviceState::parse(parts[1]), &parts[2..])
        };

        let mut device = Device::new(parts[0], state);
        device.model = rest
            .iter()
            .find_map(|part| part.strip_prefix("model:"))
            .map(|m| m.replace('_', " "));
        devices.push(device);
    }

    devices
}
